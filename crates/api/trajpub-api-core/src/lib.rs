//! trajpub-api-core: message shapes and topic names shared by the transport
//! and the discretization engine.

pub mod message;
pub mod topic;

pub use message::{Message, MessageKind};
pub use topic::{TopicError, TopicName};
