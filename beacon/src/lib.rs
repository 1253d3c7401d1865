//! # Beacon
//!
//! **Typed telemetry events over a pluggable transport.**
//!
//! Beacon assembles structured events (a name, string properties, numeric
//! measurements), stamps process-wide common fields onto each one, and hands
//! them to a transport for delivery. Delivery itself (batching, retry,
//! opt-out) is the transport's job. Telemetry never fails the caller: send
//! errors and transport panics are logged and dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beacon::prelude::*;
//!
//! # async fn run() {
//! let config = ReporterConfig::builder("my-extension", "1.4.0", "instrumentation-key").build();
//! let reporter = Reporter::new(config, |id: &TransportIdentity| {
//!     NdjsonTransport::create("telemetry/events.ndjson", id)
//! });
//!
//! reporter.send_view_event("Dashboard");
//!
//! let timer = reporter.create_timed_action("Dashboard", "Refresh", "Grid", "Toolbar");
//! // ... do the work ...
//! timer.send();
//!
//! reporter.dispose().await;
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `ndjson-transport` (default): NDJSON file transport
//! - `tokio-clock` (default): Tokio-backed clock for timed actions
//!
//! ## Crate Structure
//!
//! - [`beacon_core`]: Event records, allow-list extraction, redaction, common fields
//! - [`beacon_net`]: Transport trait, construction seam, mock and file transports
//! - [`beacon_runtime`]: Clocks for timed actions

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

// Re-export sub-crates
pub use beacon_core as core;
pub use beacon_net as net;
pub use beacon_runtime as runtime;

pub use async_trait::async_trait;

// Re-export commonly used items at the top level
pub use beacon_core::{
    CommonFields, ConnectionInfo, ErrorInfo, EventRecord, MeasurementMap, PropertyMap, ServerInfo,
};
pub use beacon_net::{TelemetryTransport, TransportError, TransportFactory, TransportIdentity};
pub use beacon_runtime::TelemetryClock;

pub mod event;
pub mod reporter;
pub mod timed;

pub use event::EventBuilder;
pub use reporter::{Reporter, ReporterState, DURATION_KEY};
pub use timed::TimedAction;

/// Prelude module for convenient imports
///
/// ```rust,ignore
/// use beacon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::net::prelude::*;
    #[cfg(feature = "ndjson-transport")]
    pub use crate::net::NdjsonTransport;

    pub use crate::{EventBuilder, Reporter, ReporterConfig, ReporterState, TimedAction};
}

/// Configuration for a reporter
#[derive(Clone)]
pub struct ReporterConfig {
    /// Extension/application name handed to the transport
    pub extension_name: String,
    /// Extension/application version handed to the transport
    pub extension_version: String,
    /// Access key handed to the transport
    pub key: String,
    /// Fields stamped onto every event
    pub common_fields: CommonFields,
    /// Clock used by timed actions
    pub clock: Arc<dyn TelemetryClock>,
}

impl ReporterConfig {
    /// Configuration with process-wide common fields and the system clock
    pub fn new(
        extension_name: impl Into<String>,
        extension_version: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::builder(extension_name, extension_version, key).build()
    }

    /// Create a new builder
    pub fn builder(
        extension_name: impl Into<String>,
        extension_version: impl Into<String>,
        key: impl Into<String>,
    ) -> ReporterConfigBuilder {
        ReporterConfigBuilder::new(extension_name, extension_version, key)
    }
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("extension_name", &self.extension_name)
            .field("extension_version", &self.extension_version)
            .field("common_fields", &self.common_fields)
            .finish_non_exhaustive()
    }
}

/// Builder for ReporterConfig
pub struct ReporterConfigBuilder {
    extension_name: String,
    extension_version: String,
    key: String,
    common_fields: Option<CommonFields>,
    host_version: Option<String>,
    clock: Option<Arc<dyn TelemetryClock>>,
}

impl ReporterConfigBuilder {
    /// Create a new builder
    pub fn new(
        extension_name: impl Into<String>,
        extension_version: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            extension_name: extension_name.into(),
            extension_version: extension_version.into(),
            key: key.into(),
            common_fields: None,
            host_version: None,
            clock: None,
        }
    }

    /// Use these common fields instead of the process-wide ones
    pub fn common_fields(mut self, fields: CommonFields) -> Self {
        self.common_fields = Some(fields);
        self
    }

    /// Override the host version in the common fields
    pub fn host_version(mut self, version: impl Into<String>) -> Self {
        self.host_version = Some(version.into());
        self
    }

    /// Set the clock used by timed actions
    pub fn clock(mut self, clock: impl TelemetryClock) -> Self {
        let clock: Arc<dyn TelemetryClock> = Arc::new(clock);
        self.clock = Some(clock);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ReporterConfig {
        let mut common_fields = self
            .common_fields
            .unwrap_or_else(|| CommonFields::process_wide().clone());
        if let Some(version) = self.host_version {
            common_fields = common_fields.with_host_version(version);
        }
        let clock: Arc<dyn TelemetryClock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(beacon_runtime::default_clock()),
        };
        ReporterConfig {
            extension_name: self.extension_name,
            extension_version: self.extension_version,
            key: self.key,
            common_fields,
            clock,
        }
    }
}

impl fmt::Debug for ReporterConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfigBuilder")
            .field("extension_name", &self.extension_name)
            .field("extension_version", &self.extension_version)
            .field("host_version", &self.host_version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ReporterConfig::builder("sample-ext", "2.1.0", "key")
            .common_fields(CommonFields::empty().with_property("common.isinternal", "true"))
            .host_version("1.50.0")
            .build();

        assert_eq!(config.extension_name, "sample-ext");
        assert_eq!(config.extension_version, "2.1.0");
        assert_eq!(
            config.common_fields.properties[CommonFields::HOST_VERSION_KEY],
            "1.50.0"
        );
        assert_eq!(config.common_fields.properties["common.isinternal"], "true");
    }

    #[test]
    fn test_default_config_uses_process_fields() {
        let config = ReporterConfig::new("sample-ext", "2.1.0", "key");
        assert_eq!(&config.common_fields, CommonFields::process_wide());
    }
}
