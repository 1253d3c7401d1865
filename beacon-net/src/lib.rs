//! # Beacon Network
//!
//! Transport abstractions for Beacon telemetry.
//!
//! This crate provides:
//! - The `TelemetryTransport` trait every delivery backend implements
//! - The `TransportFactory` seam reporters use to construct their transport
//! - A recording `MockTransport` for tests
//! - An NDJSON file transport (feature `ndjson-transport`)

pub mod traits;

#[cfg(feature = "ndjson-transport")]
pub mod ndjson;

mod mock;
pub use mock::MockTransport;

#[cfg(feature = "ndjson-transport")]
pub use ndjson::NdjsonTransport;
pub use traits::{TelemetryTransport, TransportFactory, TransportIdentity};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::traits::*;
    pub use crate::TransportError;
}

/// Result type for transport operations
pub type Result<T> = core::result::Result<T, TransportError>;

/// Transport error types
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not be constructed
    #[error("transport construction failed: {0}")]
    Construction(String),
    /// An event could not be handed to the backend
    #[error("send failed: {0}")]
    SendFailed(String),
    /// The transport was already disposed
    #[error("transport disposed")]
    Disposed,
    /// Underlying I/O failure
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Event could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}
