//! Runtime configuration of a [`Discretization`](crate::Discretization).

use serde::{Deserialize, Serialize};
use trajpub_api_core::TopicName;

use crate::error::{DiscretizationError, DiscretizationResult};

/// Topic layout and transport session parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscretizationConfig {
    /// Prepended verbatim to every topic name.
    pub topic_prefix: String,
    /// History length requested for every channel.
    pub queue_size: usize,
    pub node_name: String,
    /// Ask the transport for a unique node name.
    pub anonymous: bool,
}

impl Default for DiscretizationConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "/hpp/target/".to_string(),
            queue_size: 1000,
            node_name: "hpp_agimus".to_string(),
            anonymous: true,
        }
    }
}

impl DiscretizationConfig {
    /// Parse a JSON object; missing fields take their default value.
    pub fn from_json_str(s: &str) -> DiscretizationResult<Self> {
        let config: DiscretizationConfig = serde_json::from_str(s)
            .map_err(|e| DiscretizationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DiscretizationResult<()> {
        if self.queue_size == 0 {
            return Err(DiscretizationError::InvalidConfig(
                "queue_size must be positive".to_string(),
            ));
        }
        if self.node_name.trim().is_empty() {
            return Err(DiscretizationError::InvalidConfig(
                "node_name is empty".to_string(),
            ));
        }
        TopicName::join(&self.topic_prefix, "position").map_err(|e| {
            DiscretizationError::InvalidConfig(format!(
                "topic_prefix '{}': {e}",
                self.topic_prefix
            ))
        })?;
        Ok(())
    }

    /// `<prefix><suffix>`, checked against the topic grammar.
    pub fn topic(&self, suffix: &str) -> DiscretizationResult<String> {
        Ok(TopicName::join(&self.topic_prefix, suffix)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DiscretizationConfig::from_json_str(r#"{ "topic_prefix": "/sim/" }"#).unwrap();
        assert_eq!(config.topic_prefix, "/sim/");
        assert_eq!(config.queue_size, 1000);
        assert_eq!(config.node_name, "hpp_agimus");
        assert!(config.anonymous);
        assert_eq!(config.topic("com/waist").unwrap(), "/sim/com/waist");
    }

    #[test]
    fn topic_rejects_malformed_suffix() {
        let config = DiscretizationConfig::default();
        assert!(matches!(
            config.topic("op_frame/left hand"),
            Err(DiscretizationError::Topic(_))
        ));
        assert!(matches!(
            config.topic("com//waist"),
            Err(DiscretizationError::Topic(_))
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(DiscretizationConfig::from_json_str(r#"{ "queue_size": 0 }"#).is_err());
        assert!(DiscretizationConfig::from_json_str(r#"{ "topic_prefix": "/a b/" }"#).is_err());
        assert!(DiscretizationConfig::from_json_str("42").is_err());
    }
}
