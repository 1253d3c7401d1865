//! Event builder: accumulates one event's fields and performs the send.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use beacon_core::allowlist::{
    ConnectionInfo, ServerInfo, TelemetryProjection, ALLOWLIST_VERSION,
};
use beacon_core::record::{
    merge_measurements, merge_properties, EventRecord, MeasurementMap, PropertyMap,
};
use beacon_net::{TelemetryTransport, TransportError};
use serde_json::Value;

/// Outcome of a send attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Handed to the transport
    Sent,
    /// No transport (degraded reporter); nothing happened
    Skipped,
}

/// One outgoing event, pre-populated by a [`Reporter`](crate::Reporter).
///
/// Enrichment calls consume and return the builder so they chain. `send()`
/// borrows, so a builder can be sent more than once; each send forwards the
/// current accumulated state.
pub struct EventBuilder {
    record: EventRecord,
    transport: Option<Arc<dyn TelemetryTransport>>,
}

impl EventBuilder {
    pub(crate) fn new(record: EventRecord, transport: Option<Arc<dyn TelemetryTransport>>) -> Self {
        Self { record, transport }
    }

    /// Merge `props` into the event. Colliding keys take the new value.
    pub fn with_additional_properties(mut self, props: &PropertyMap) -> Self {
        merge_properties(&mut self.record.properties, props);
        self
    }

    /// Merge `measures` into the event. Colliding keys take the new value.
    pub fn with_additional_measurements(mut self, measures: &MeasurementMap) -> Self {
        merge_measurements(&mut self.record.measurements, measures);
        self
    }

    /// Attach the allow-listed connection fields.
    pub fn with_connection_info(self, info: &ConnectionInfo) -> Self {
        self.with_projection(info)
    }

    /// Attach the allow-listed server fields.
    pub fn with_server_info(self, info: &ServerInfo) -> Self {
        self.with_projection(info)
    }

    /// Like [`with_connection_info`](Self::with_connection_info) for untyped
    /// input. Non-object input is logged and ignored.
    pub fn with_connection_info_json(self, info: &Value) -> Self {
        self.with_projection_json::<ConnectionInfo>(info, "connection")
    }

    /// Like [`with_server_info`](Self::with_server_info) for untyped input.
    /// Non-object input is logged and ignored.
    pub fn with_server_info_json(self, info: &Value) -> Self {
        self.with_projection_json::<ServerInfo>(info, "server")
    }

    fn with_projection<P: TelemetryProjection>(self, input: &P) -> Self {
        let mut props = input.to_properties();
        props.retain(|key, _| P::FIELDS.contains(&key.as_str()));
        tracing::trace!(
            event = %self.record.name,
            allowlist_version = ALLOWLIST_VERSION,
            fields = props.len(),
            "attaching allow-listed fields"
        );
        self.with_additional_properties(&props)
    }

    fn with_projection_json<P: TelemetryProjection>(self, input: &Value, what: &str) -> Self {
        match P::from_json(input) {
            Ok(parsed) => self.with_projection(&parsed),
            Err(err) => {
                tracing::warn!(
                    event = %self.record.name,
                    error = %err,
                    "ignoring malformed {what} info"
                );
                self
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.record.properties
    }

    pub fn measurements(&self) -> &MeasurementMap {
        &self.record.measurements
    }

    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    pub fn into_record(self) -> EventRecord {
        self.record
    }

    /// Forward the event to the transport.
    ///
    /// Never fails and never panics: transport errors and transport panics
    /// are logged and dropped.
    pub fn send(&self) {
        if let Err(err) = self.dispatch() {
            tracing::warn!(event = %self.record.name, error = %err, "telemetry send failed");
        }
    }

    pub(crate) fn dispatch(&self) -> Result<Delivery, TransportError> {
        let Some(transport) = self.transport.as_ref() else {
            tracing::debug!(event = %self.record.name, "no transport; telemetry event skipped");
            return Ok(Delivery::Skipped);
        };

        tracing::debug!(
            event = %self.record.name,
            properties = self.record.properties.len(),
            measurements = self.record.measurements.len(),
            "forwarding telemetry event"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            transport.send_event(
                &self.record.name,
                &self.record.properties,
                &self.record.measurements,
            )
        }));
        match outcome {
            Ok(result) => result.map(|()| Delivery::Sent),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::error!(event = %self.record.name, %reason, "telemetry transport panicked");
                Err(TransportError::SendFailed(format!(
                    "transport panicked: {reason}"
                )))
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl fmt::Debug for EventBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuilder")
            .field("record", &self.record)
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_net::MockTransport;
    use serde_json::json;

    fn props(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn builder_with(mock: &MockTransport) -> EventBuilder {
        let transport: Arc<dyn TelemetryTransport> = Arc::new(mock.clone());
        EventBuilder::new(EventRecord::new("custom"), Some(transport))
    }

    #[test]
    fn chained_properties_last_write_wins() {
        let event = EventBuilder::new(EventRecord::new("custom"), None)
            .with_additional_properties(&props(&[("a", "1"), ("shared", "first")]))
            .with_additional_properties(&props(&[("b", "2"), ("shared", "second")]));

        assert_eq!(event.properties()["a"], "1");
        assert_eq!(event.properties()["b"], "2");
        assert_eq!(event.properties()["shared"], "second");
    }

    #[test]
    fn caller_maps_are_not_mutated() {
        let extra = props(&[("a", "1")]);
        let _ = EventBuilder::new(EventRecord::new("custom"), None)
            .with_additional_properties(&extra)
            .with_additional_properties(&props(&[("a", "2")]));
        assert_eq!(extra["a"], "1");
    }

    #[test]
    fn connection_json_keeps_only_allow_listed_fields() {
        let event = EventBuilder::new(EventRecord::new("custom"), None).with_connection_info_json(
            &json!({ "authenticationType": "AAD", "providerName": "MSSQL", "extraField": "x" }),
        );
        assert_eq!(event.properties().len(), 2);
        assert_eq!(event.properties()["authenticationType"], "AAD");
        assert_eq!(event.properties()["providerName"], "MSSQL");
    }

    #[test]
    fn malformed_json_leaves_event_unchanged() {
        let base = EventBuilder::new(EventRecord::new("custom"), None)
            .with_additional_properties(&props(&[("view", "Home")]));
        let before = base.properties().clone();

        let event = base
            .with_connection_info_json(&json!("not-an-object"))
            .with_server_info_json(&json!([1, 2]));
        assert_eq!(event.properties(), &before);
    }

    #[test]
    fn server_json_with_one_bad_field_keeps_the_rest() {
        let event = EventBuilder::new(EventRecord::new("custom"), None).with_server_info_json(
            &json!({ "isCloud": true, "serverVersion": 16, "serverEdition": "Ent", "build": "x" }),
        );
        assert_eq!(event.properties()["connectionType"], "Azure");
        assert_eq!(event.properties()["serverVersion"], "16");
        assert_eq!(event.properties()["serverEdition"], "Ent");
        assert!(!event.properties().contains_key("build"));
    }

    #[test]
    fn server_info_maps_cloud_flag() {
        let event = EventBuilder::new(EventRecord::new("custom"), None).with_server_info(
            &ServerInfo {
                is_cloud: Some(true),
                server_version: Some("15.0".into()),
                ..ServerInfo::default()
            },
        );
        assert_eq!(event.properties()["connectionType"], "Azure");
        assert_eq!(event.properties()["serverVersion"], "15.0");
        assert_eq!(event.properties()["serverEdition"], "");
    }

    #[test]
    fn send_twice_resends_same_state() {
        let mock = MockTransport::new();
        let event = builder_with(&mock).with_additional_properties(&props(&[("k", "v")]));
        event.send();
        event.send();

        let sent = mock.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
        assert_eq!(event.properties()["k"], "v");
    }

    #[test]
    fn transport_failure_is_swallowed() {
        let mock = MockTransport::new().failing();
        let event = builder_with(&mock);
        assert!(matches!(event.dispatch(), Err(TransportError::SendFailed(_))));
        event.send();
        assert_eq!(mock.send_attempts(), 2);
    }

    #[test]
    fn transport_panic_is_contained() {
        let mock = MockTransport::new().panicking();
        let event = builder_with(&mock);
        event.send();
        let err = event.dispatch().unwrap_err();
        assert!(err.to_string().contains("mock transport panicked"));
    }

    #[test]
    fn missing_transport_skips() {
        let event = EventBuilder::new(EventRecord::new("custom"), None);
        assert_eq!(event.dispatch().unwrap(), Delivery::Skipped);
    }
}
