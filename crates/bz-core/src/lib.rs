//! bz-core: Core abstractions and configuration for the Bazaar client
//!
//! This crate provides shared domain types, the error taxonomy, client
//! configuration, and the trait seams used by the session orchestrator and
//! its tests.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::BazaarError;
pub use types::{AttachedImage, ChannelState, ConversationEntry, EntryKind, Operation};
