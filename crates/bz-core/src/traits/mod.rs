//! Trait seams between the session orchestrator and the outside world

mod exchange;
mod transport;

pub use exchange::AgentExchange;
pub use transport::{PushStream, PushTransport, StreamEvent};
