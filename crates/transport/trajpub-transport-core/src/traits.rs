//! Transport contract.
//!
//! Both traits are object safe so the discretization engine can hold
//! `Arc<dyn Transport>` and `Box<dyn Publisher>` without being generic over
//! the backend.

use std::fmt::Debug;

use trajpub_api_core::{Message, TopicName};

use crate::error::TransportResult;

/// A single output channel.
pub trait Publisher: Send + Sync + Debug {
    /// Fully-qualified topic this handle publishes on.
    fn topic(&self) -> &TopicName;

    /// Send one message. Fails once the handle has been shut down.
    fn publish(&self, message: Message) -> TransportResult<()>;

    /// Close the channel. Calling it twice is harmless.
    fn shutdown(&mut self);

    fn is_open(&self) -> bool;
}

/// Process-wide transport: one-time initialization plus channel creation.
pub trait Transport: Send + Sync {
    /// Initialize the transport under `node_name`. Anonymous nodes get a
    /// unique suffix. Returns `true` when this call performed the
    /// initialization and `false` when it had already happened.
    fn init(&self, node_name: &str, anonymous: bool) -> TransportResult<bool>;

    fn is_initialized(&self) -> bool;

    /// Resolved node name, once initialized.
    fn node_name(&self) -> Option<String>;

    /// Create a channel on `topic`. Advertising a topic that already has
    /// publishers yields an additional, independent handle.
    fn advertise(&self, topic: &str, queue_size: usize) -> TransportResult<Box<dyn Publisher>>;
}
