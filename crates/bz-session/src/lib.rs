//! bz-session: Real-time session orchestrator for the Bazaar client
//!
//! This crate keeps the push channel alive with automatic reconnection,
//! drives the stateful exchanges (attach-image, submit-query,
//! reset-session) under single-flight discipline, and merges both sources
//! into one strictly ordered conversation log.
//!
//! The push channel and the request/response exchanges are independent
//! concurrent activities; connectivity of one never gates the other.

pub mod backoff;
pub mod channel;
pub mod dispatch;
pub mod exchange;
pub mod gate;
pub mod log;
pub mod orchestrator;
pub mod transport;

pub use backoff::ReconnectBackoff;
pub use channel::ChannelConnection;
pub use dispatch::MessageDispatcher;
pub use exchange::HttpExchange;
pub use gate::{OperationGate, OperationGuard};
pub use log::ConversationLog;
pub use orchestrator::{OperationOutcome, SessionOrchestrator};
pub use transport::WsTransport;
