//! Error types for the SmartTA client.

use std::time::Duration;

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid backend URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors raised by the shared HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Server returned HTTP {code} for {url}")]
    Status { url: String, code: u16, body: String },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("JSON codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors from attaching or driving the UI message bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("A display is already attached to this bus")]
    AlreadyAttached,

    #[error("Failed to spawn UI thread: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("UI thread panicked")]
    UiThreadPanicked,
}

/// Errors from session-level flows that happen outside dispatch.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to read {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save document to {path}: {source}")]
    SaveDocument {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
