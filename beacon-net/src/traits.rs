//! Transport traits and types
//!
//! This module defines the contract between event builders and whatever
//! actually delivers events. Batching, retry and user opt-out all live on the
//! transport side of this boundary.

use beacon_core::record::{MeasurementMap, PropertyMap};

use crate::{Result, TransportError};

/// Who is sending: handed to a [`TransportFactory`] at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportIdentity {
    /// Extension/application name. Transports namespace event names with it.
    pub extension_name: String,
    /// Extension/application version
    pub extension_version: String,
    /// Access key for the telemetry backend
    pub key: String,
}

/// Core transport trait for telemetry delivery
#[async_trait::async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// Hand one event to the backend
    fn send_event(
        &self,
        name: &str,
        properties: &PropertyMap,
        measurements: &MeasurementMap,
    ) -> Result<()>;

    /// Flush buffered events and release the backend
    async fn dispose(&self) -> Result<()>;
}

/// Builds the transport a reporter will own.
///
/// Implemented for any `FnOnce(&TransportIdentity) -> Result<T, E>` where the
/// error converts into a [`TransportError`].
pub trait TransportFactory {
    type Transport: TelemetryTransport + 'static;

    fn create(self, identity: &TransportIdentity) -> Result<Self::Transport>;
}

impl<F, T, E> TransportFactory for F
where
    F: FnOnce(&TransportIdentity) -> core::result::Result<T, E>,
    T: TelemetryTransport + 'static,
    E: Into<TransportError>,
{
    type Transport = T;

    fn create(self, identity: &TransportIdentity) -> Result<T> {
        self(identity).map_err(Into::into)
    }
}

#[async_trait::async_trait]
impl<T> TelemetryTransport for std::sync::Arc<T>
where
    T: TelemetryTransport + ?Sized,
{
    fn send_event(
        &self,
        name: &str,
        properties: &PropertyMap,
        measurements: &MeasurementMap,
    ) -> Result<()> {
        (**self).send_event(name, properties, measurements)
    }

    async fn dispose(&self) -> Result<()> {
        (**self).dispose().await
    }
}
