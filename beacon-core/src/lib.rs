//! # Beacon Core
//!
//! Transport-independent building blocks for Beacon telemetry events.
//!
//! This crate provides:
//! - The event data model (`PropertyMap`, `MeasurementMap`, `EventRecord`)
//! - Allow-list extraction for structured connection/server inputs
//! - Error-message redaction for error events
//! - Process-wide common fields and the environment probe that computes them

pub mod allowlist;
pub mod environment;
pub mod record;
pub mod redact;

pub use allowlist::{ConnectionInfo, ServerInfo, TelemetryProjection, ALLOWLIST_VERSION};
pub use environment::{CommonFields, EnvHostVersion, EnvironmentProbe, HostVersionSource};
pub use record::{
    merge_measurements, merge_properties, EventKind, EventRecord, MeasurementMap, PropertyMap,
};
pub use redact::{ErrorInfo, REDACTION_MARKER};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::allowlist::*;
    pub use crate::environment::*;
    pub use crate::record::*;
    pub use crate::redact::*;
}

/// Result type for enrichment operations
pub type Result<T> = core::result::Result<T, EnrichError>;

/// Error raised when loosely-typed enrichment input cannot be used
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// The input was not a JSON object
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}
