//! Push transport traits

use async_trait::async_trait;

use crate::error::ChannelError;

/// One observation from a live push stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An inbound text frame
    Frame(String),
    /// The stream ended. `normal` distinguishes a clean, caller-requested
    /// closure from every other termination (which triggers reconnection).
    Closed { normal: bool },
}

/// A live push stream.
///
/// Implementations map transport errors to a terminal
/// `StreamEvent::Closed { normal: false }`; they never surface errors as a
/// separate event, so the connection state machine sees errors only as
/// close precursors.
#[async_trait]
pub trait PushStream: Send {
    /// Wait for the next stream event. After `Closed` is returned the
    /// stream yields nothing further.
    async fn next_event(&mut self) -> StreamEvent;

    /// Close the stream with a normal-closure signal
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Factory for push streams; one successful `connect` yields one live
/// stream.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    type Stream: PushStream + 'static;

    /// Open a new stream to the push endpoint
    async fn connect(&self) -> Result<Self::Stream, ChannelError>;
}
