//! trajpub-transport-core
//!
//! The publish/subscribe contract used by the discretization engine and an
//! in-process implementation of it.
//!
//! - [`Transport`]: process-wide initialization and channel creation.
//! - [`Publisher`]: a channel handle with `publish` and `shutdown`.
//! - [`Bus`]: in-memory transport keeping a bounded history per topic, with
//!   cursor-based [`Subscription`]s for consumers and tests.

pub mod bus;
pub mod error;
pub mod traits;

pub use bus::{Bus, BusEntry, BusPublisher, Subscription};
pub use error::{TransportError, TransportResult};
pub use traits::{Publisher, Transport};
pub use trajpub_api_core::{Message, TopicName};
