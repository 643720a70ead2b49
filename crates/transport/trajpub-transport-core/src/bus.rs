//! In-process transport.
//!
//! Every topic keeps a bounded history of [`BusEntry`] records stamped with a
//! bus-wide sequence number and the publishing node. Subscribers read the
//! history through their own cursor, so several consumers can observe the
//! same stream without interfering.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trajpub_api_core::{Message, TopicName};

use crate::error::{TransportError, TransportResult};
use crate::traits::{Publisher, Transport};

/// One published message with provenance information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEntry {
    pub seq: u64,
    pub message: Message,
    pub source: String,
}

#[derive(Debug)]
struct TopicState {
    history: VecDeque<BusEntry>,
    capacity: usize,
    published: u64,
    publishers: usize,
}

impl TopicState {
    fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::new(),
            capacity: capacity.max(1),
            published: 0,
            publishers: 0,
        }
    }
}

#[derive(Debug, Default)]
struct BusState {
    node: Option<String>,
    next_seq: u64,
    topics: HashMap<TopicName, TopicState>,
}

/// Cheaply cloneable handle on a shared in-memory bus.
#[derive(Debug, Clone, Default)]
pub struct Bus {
    state: Arc<Mutex<BusState>>,
}

static GLOBAL_BUS: OnceLock<Bus> = OnceLock::new();

impl Bus {
    /// Create an isolated bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus.
    pub fn global() -> Bus {
        GLOBAL_BUS.get_or_init(Bus::new).clone()
    }

    /// Open a subscription on `topic`. Only messages published after this
    /// call are delivered.
    pub fn subscribe(&self, topic: &str) -> TransportResult<Subscription> {
        let name = TopicName::parse(topic)?;
        let cursor = self.state.lock().next_seq;
        Ok(Subscription {
            topic: name,
            state: Arc::clone(&self.state),
            cursor,
        })
    }

    /// Most recent message on `topic`, if any is still retained.
    pub fn latest(&self, topic: &str) -> Option<Message> {
        let name = TopicName::parse(topic).ok()?;
        let state = self.state.lock();
        state
            .topics
            .get(&name)
            .and_then(|t| t.history.back())
            .map(|entry| entry.message.clone())
    }

    /// Retained history of `topic`, oldest first.
    pub fn history(&self, topic: &str) -> Vec<BusEntry> {
        let Ok(name) = TopicName::parse(topic) else {
            return Vec::new();
        };
        let state = self.state.lock();
        state
            .topics
            .get(&name)
            .map(|t| t.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of messages ever published on `topic`.
    pub fn publish_count(&self, topic: &str) -> u64 {
        let Ok(name) = TopicName::parse(topic) else {
            return 0;
        };
        self.state
            .lock()
            .topics
            .get(&name)
            .map(|t| t.published)
            .unwrap_or(0)
    }

    /// Number of open publishers on `topic`.
    pub fn publisher_count(&self, topic: &str) -> usize {
        let Ok(name) = TopicName::parse(topic) else {
            return 0;
        };
        self.state
            .lock()
            .topics
            .get(&name)
            .map(|t| t.publishers)
            .unwrap_or(0)
    }

    /// All topics ever advertised, sorted.
    pub fn topics(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut names: Vec<String> = state.topics.keys().map(|t| t.to_string()).collect();
        names.sort();
        names
    }

    /// Dump the retained history of every topic as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let state = self.state.lock();
        let mut map = serde_json::Map::new();
        for (name, topic) in &state.topics {
            let entries: Vec<&BusEntry> = topic.history.iter().collect();
            map.insert(
                name.to_string(),
                serde_json::to_value(entries).unwrap_or(serde_json::Value::Null),
            );
        }
        serde_json::Value::Object(map)
    }
}

impl Transport for Bus {
    fn init(&self, node_name: &str, anonymous: bool) -> TransportResult<bool> {
        let mut state = self.state.lock();
        if state.node.is_some() {
            return Ok(false);
        }
        let resolved = if anonymous {
            format!("{}_{}", node_name, Uuid::new_v4().simple())
        } else {
            node_name.to_string()
        };
        log::info!("transport initialized as node '{resolved}'");
        state.node = Some(resolved);
        Ok(true)
    }

    fn is_initialized(&self) -> bool {
        self.state.lock().node.is_some()
    }

    fn node_name(&self) -> Option<String> {
        self.state.lock().node.clone()
    }

    fn advertise(&self, topic: &str, queue_size: usize) -> TransportResult<Box<dyn Publisher>> {
        let name = TopicName::parse(topic)?;
        let mut state = self.state.lock();
        let source = state.node.clone().ok_or(TransportError::NotInitialized)?;
        let entry = state
            .topics
            .entry(name.clone())
            .or_insert_with(|| TopicState::new(queue_size));
        entry.capacity = entry.capacity.max(queue_size);
        entry.publishers += 1;
        log::debug!("advertised '{name}' (queue size {queue_size})");
        Ok(Box::new(BusPublisher {
            topic: name,
            source,
            state: Arc::clone(&self.state),
            open: true,
        }))
    }
}

/// Publisher handle returned by [`Bus::advertise`](Transport::advertise).
#[derive(Debug)]
pub struct BusPublisher {
    topic: TopicName,
    source: String,
    state: Arc<Mutex<BusState>>,
    open: bool,
}

impl Publisher for BusPublisher {
    fn topic(&self) -> &TopicName {
        &self.topic
    }

    fn publish(&self, message: Message) -> TransportResult<()> {
        if !self.open {
            return Err(TransportError::Closed(self.topic.to_string()));
        }
        let mut state = self.state.lock();
        state.next_seq += 1;
        let seq = state.next_seq;
        let Some(topic) = state.topics.get_mut(&self.topic) else {
            return Err(TransportError::Closed(self.topic.to_string()));
        };
        topic.history.push_back(BusEntry {
            seq,
            message,
            source: self.source.clone(),
        });
        while topic.history.len() > topic.capacity {
            topic.history.pop_front();
        }
        topic.published += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Some(topic) = self.state.lock().topics.get_mut(&self.topic) {
            topic.publishers = topic.publishers.saturating_sub(1);
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for BusPublisher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Cursor over one topic of a [`Bus`].
#[derive(Debug)]
pub struct Subscription {
    topic: TopicName,
    state: Arc<Mutex<BusState>>,
    cursor: u64,
}

impl Subscription {
    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    /// Next unread message, if any. Messages evicted from the bounded
    /// history before being read are skipped.
    pub fn try_recv(&mut self) -> Option<Message> {
        let state = self.state.lock();
        let topic = state.topics.get(&self.topic)?;
        let entry = topic.history.iter().find(|e| e.seq > self.cursor)?;
        self.cursor = entry.seq;
        Some(entry.message.clone())
    }

    /// Read every pending message.
    pub fn drain(&mut self) -> Vec<Message> {
        let state = self.state.lock();
        let Some(topic) = state.topics.get(&self.topic) else {
            return Vec::new();
        };
        let pending: Vec<&BusEntry> = topic
            .history
            .iter()
            .filter(|e| e.seq > self.cursor)
            .collect();
        if let Some(last) = pending.last() {
            self.cursor = last.seq;
        }
        pending.into_iter().map(|e| e.message.clone()).collect()
    }

    pub fn has_messages(&self) -> bool {
        let state = self.state.lock();
        state
            .topics
            .get(&self.topic)
            .and_then(|t| t.history.back())
            .map(|e| e.seq > self.cursor)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let bus = Bus::new();
        assert!(!bus.is_initialized());
        assert!(bus.init("node", false).unwrap());
        assert!(!bus.init("other", false).unwrap());
        assert_eq!(bus.node_name().as_deref(), Some("node"));
    }

    #[test]
    fn anonymous_names_are_suffixed() {
        let bus = Bus::new();
        bus.init("node", true).unwrap();
        let name = bus.node_name().unwrap();
        assert!(name.starts_with("node_"));
        assert!(name.len() > "node_".len());
    }

    #[test]
    fn advertise_requires_init() {
        let bus = Bus::new();
        let err = bus.advertise("/a/b", 10).unwrap_err();
        assert!(matches!(err, TransportError::NotInitialized));
    }

    #[test]
    fn history_is_bounded_by_queue_size() {
        let bus = Bus::new();
        bus.init("n", false).unwrap();
        let publisher = bus.advertise("/x", 2).unwrap();
        for i in 0..5 {
            publisher.publish(Message::Vector(vec![i as f64])).unwrap();
        }
        let history = bus.history("/x");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, Message::Vector(vec![3.0]));
        assert_eq!(history[1].message, Message::Vector(vec![4.0]));
        assert_eq!(bus.publish_count("/x"), 5);
        assert_eq!(history[1].source, "n");
    }

    #[test]
    fn shutdown_closes_handle() {
        let bus = Bus::new();
        bus.init("n", false).unwrap();
        let mut publisher = bus.advertise("/x", 10).unwrap();
        assert_eq!(bus.publisher_count("/x"), 1);
        publisher.shutdown();
        publisher.shutdown();
        assert!(!publisher.is_open());
        assert_eq!(bus.publisher_count("/x"), 0);
        assert!(matches!(
            publisher.publish(Message::vector3(0.0, 0.0, 0.0)),
            Err(TransportError::Closed(_))
        ));
    }
}
