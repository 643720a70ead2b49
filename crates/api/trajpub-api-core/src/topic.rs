//! TopicName parsing and formatting.
//!
//! Grammar (ROS-like):
//!   [/]segment/segment/.../segment
//! - an optional leading '/' marks an absolute name
//! - segments are non-empty and contain no whitespace
//!   Examples:
//!   "/hpp/target/position" -> absolute, segments=["hpp","target","position"]
//!   "velocity/op_frame/tool" -> relative, segments=["velocity","op_frame","tool"]
//!
//! Output channels are named by joining a configurable prefix (usually ending
//! with '/') and a suffix such as `op_frame/<name>`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("empty topic name")]
    Empty,
    #[error("invalid topic '{0}': empty segment")]
    EmptySegment(String),
    #[error("invalid topic '{0}': segment contains whitespace")]
    Whitespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName {
    absolute: bool,
    segments: Vec<String>,
}

impl TopicName {
    /// Parse a topic name according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, TopicError> {
        if s.is_empty() {
            return Err(TopicError::Empty);
        }
        let (absolute, body) = match s.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(TopicError::EmptySegment(s.to_string()));
        }
        let mut segments = Vec::new();
        for seg in body.split('/') {
            if seg.is_empty() {
                return Err(TopicError::EmptySegment(s.to_string()));
            }
            if seg.chars().any(char::is_whitespace) {
                return Err(TopicError::Whitespace(s.to_string()));
            }
            segments.push(seg.to_string());
        }
        Ok(TopicName { absolute, segments })
    }

    /// Concatenate `prefix` and `suffix` verbatim and parse the result.
    ///
    /// The prefix is not given a separator: `"/robot/"` + `"position"` gives
    /// `/robot/position` while `"/robot_"` + `"position"` gives `/robot_position`.
    pub fn join(prefix: &str, suffix: &str) -> Result<Self, TopicError> {
        let mut full = String::with_capacity(prefix.len() + suffix.len());
        full.push_str(prefix);
        full.push_str(suffix);
        TopicName::parse(&full)
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.as_str())
    }

    /// Last segment of the name.
    pub fn basename(&self) -> &str {
        self.segments.last().map(|s| s.as_str()).unwrap_or_default()
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for TopicName {
    type Err = TopicError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicName::parse(s)
    }
}

impl Serialize for TopicName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TopicName {
    fn deserialize<D>(deserializer: D) -> Result<TopicName, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TopicName::parse(&s).map_err(de::Error::custom)
    }
}
