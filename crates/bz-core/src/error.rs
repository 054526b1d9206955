//! Error taxonomy for the Bazaar client
//!
//! Propagation policy: push-channel failures never terminate the session
//! (the channel self-heals via reconnection); exchange failures are always
//! surfaced to the user as an `error` conversation entry. Decode failures on
//! the push channel are logged and dropped. No failure is fatal to the
//! process.

use bz_protocol::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the Bazaar client
#[derive(Error, Debug)]
pub enum BazaarError {
    /// Payload decode error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Request/response exchange error
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Push channel error
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a request/response exchange
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The server answered with a non-success status
    #[error("API Error: {0}")]
    Status(u16),

    /// The request never completed (network failure, timeout)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any other failure (used by test doubles and adapters)
    #[error("{0}")]
    Other(String),
}

/// Errors from the push channel
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Could not open the socket
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// The socket dropped unexpectedly
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Closing the socket failed
    #[error("Close failed: {0}")]
    CloseFailed(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
