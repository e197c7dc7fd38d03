//! ServerGem chat protocol
//!
//! Typed wire events exchanged over the chat channel between the backend
//! and its clients.

pub mod events;

pub use events::{
    ClientMessage, DeploymentCompletePayload, DeploymentUpdatePayload, MessageMetadata,
    MessagePayload, ServerEvent,
};
