//! Reporter: builds correctly-shaped events and owns the transport.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use beacon_core::environment::CommonFields;
use beacon_core::record::{EventKind, EventRecord, MeasurementMap, PropertyMap};
use beacon_core::redact::ErrorInfo;
use beacon_net::{TelemetryTransport, TransportError, TransportFactory, TransportIdentity};
use beacon_runtime::TelemetryClock;
use tokio::sync::OnceCell;

use crate::event::{panic_message, EventBuilder};
use crate::timed::TimedAction;
use crate::ReporterConfig;

/// Measurement key carrying an action's duration.
pub const DURATION_KEY: &str = "durationMs";

/// Whether a reporter has a transport to send through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    /// Transport present; sends are forwarded
    Active,
    /// Transport construction failed; sends are silent no-ops
    Degraded,
}

/// Factory for typed telemetry events.
///
/// Every event it creates starts with the reporter's common fields; the
/// kind's required fields and any caller-supplied maps are applied on top,
/// so explicit fields win on key collisions.
pub struct Reporter {
    identity: TransportIdentity,
    common: CommonFields,
    clock: Arc<dyn TelemetryClock>,
    transport: Option<Arc<dyn TelemetryTransport>>,
    disposed: OnceCell<()>,
}

impl Reporter {
    /// Construct the transport through `factory` and wrap it.
    ///
    /// A factory error or panic is logged once and leaves the reporter
    /// `Degraded`.
    pub fn new<F: TransportFactory>(config: ReporterConfig, factory: F) -> Self {
        let identity = TransportIdentity {
            extension_name: config.extension_name,
            extension_version: config.extension_version,
            key: config.key,
        };

        let created = panic::catch_unwind(AssertUnwindSafe(|| factory.create(&identity)))
            .unwrap_or_else(|payload| {
                Err(TransportError::Construction(format!(
                    "transport factory panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        let transport = match created {
            Ok(transport) => {
                let transport: Arc<dyn TelemetryTransport> = Arc::new(transport);
                Some(transport)
            }
            Err(err) => {
                tracing::error!(
                    extension = %identity.extension_name,
                    error = %err,
                    "telemetry transport construction failed; reporter disabled"
                );
                None
            }
        };

        Self {
            identity,
            common: config.common_fields,
            clock: config.clock,
            transport,
            disposed: OnceCell::new(),
        }
    }

    /// Wrap an already-constructed transport.
    pub fn with_transport(config: ReporterConfig, transport: Arc<dyn TelemetryTransport>) -> Self {
        Self::new(config, move |_: &TransportIdentity| {
            Ok::<_, TransportError>(transport)
        })
    }

    pub fn state(&self) -> ReporterState {
        if self.transport.is_some() {
            ReporterState::Active
        } else {
            ReporterState::Degraded
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ReporterState::Active
    }

    pub fn identity(&self) -> &TransportIdentity {
        &self.identity
    }

    pub fn common_fields(&self) -> &CommonFields {
        &self.common
    }

    pub(crate) fn clock(&self) -> &dyn TelemetryClock {
        self.clock.as_ref()
    }

    fn event(&self, name: &str) -> EventRecord {
        let mut record = EventRecord::new(name);
        self.common.apply_to(&mut record);
        record
    }

    fn kind_event(&self, kind: EventKind) -> EventRecord {
        self.event(kind.event_name())
    }

    fn builder_for(&self, record: EventRecord) -> EventBuilder {
        EventBuilder::new(record, self.transport.clone())
    }

    /// A page or item was observed.
    pub fn create_view_event(&self, view: &str) -> EventBuilder {
        let mut record = self.kind_event(EventKind::View);
        record.set_property("view", view);
        self.builder_for(record)
    }

    pub fn send_view_event(&self, view: &str) {
        self.create_view_event(view).send();
    }

    /// A discrete action. `None` duration omits the measurement.
    pub fn create_action_event(
        &self,
        view: &str,
        action: &str,
        target: &str,
        source: &str,
        duration_ms: Option<f64>,
    ) -> EventBuilder {
        let mut record = self.kind_event(EventKind::Action);
        record.set_property("view", view);
        record.set_property("action", action);
        record.set_property("target", target);
        record.set_property("source", source);
        if let Some(duration) = duration_ms.filter(|d| d.is_finite()) {
            record.set_measurement(DURATION_KEY, duration);
        }
        self.builder_for(record)
    }

    pub fn send_action_event(
        &self,
        view: &str,
        action: &str,
        target: &str,
        source: &str,
        duration_ms: Option<f64>,
    ) {
        self.create_action_event(view, action, target, source, duration_ms)
            .send();
    }

    /// A batch of measurements tagged with `group_name`.
    pub fn create_metrics_event(
        &self,
        measurements: &MeasurementMap,
        group_name: &str,
    ) -> EventBuilder {
        let mut record = self.kind_event(EventKind::Metrics);
        record.set_property("groupName", group_name);
        self.builder_for(record)
            .with_additional_measurements(measurements)
    }

    pub fn send_metrics_event(&self, measurements: &MeasurementMap, group_name: &str) {
        self.create_metrics_event(measurements, group_name).send();
    }

    /// A failure identified by code and type only.
    pub fn create_error_event(
        &self,
        view: &str,
        name: &str,
        error_code: &str,
        error_type: &str,
    ) -> EventBuilder {
        let mut record = self.kind_event(EventKind::Error);
        record.set_property("view", view);
        record.set_property("name", name);
        record.set_property("errorCode", error_code);
        record.set_property("errorType", error_type);
        self.builder_for(record)
    }

    pub fn send_error_event(&self, view: &str, name: &str, error_code: &str, error_type: &str) {
        self.create_error_event(view, name, error_code, error_type)
            .send();
    }

    /// A failure with structured details.
    ///
    /// The message is only sent when `include_message` is set; otherwise it
    /// is empty and literal copies of it in the stack are redacted.
    pub fn create_error_event2(
        &self,
        view: &str,
        name: &str,
        error: Option<&ErrorInfo>,
        include_message: bool,
        error_code: &str,
        error_type: &str,
    ) -> EventBuilder {
        let (message, stack) = error
            .map(|e| e.telemetry_fields(include_message))
            .unwrap_or_default();

        let mut record = self.kind_event(EventKind::Error);
        record.set_property("view", view);
        record.set_property("name", name);
        record.set_property("errorCode", error_code);
        record.set_property("errorType", error_type);
        record.set_property("message", message);
        record.set_property("stack", stack);
        self.builder_for(record)
    }

    pub fn send_error_event2(
        &self,
        view: &str,
        name: &str,
        error: Option<&ErrorInfo>,
        include_message: bool,
        error_code: &str,
        error_type: &str,
    ) {
        self.create_error_event2(view, name, error, include_message, error_code, error_type)
            .send();
    }

    /// Caller-named event with no required fields.
    pub fn create_telemetry_event(
        &self,
        event_name: &str,
        properties: &PropertyMap,
        measurements: &MeasurementMap,
    ) -> EventBuilder {
        self.builder_for(self.event(event_name))
            .with_additional_properties(properties)
            .with_additional_measurements(measurements)
    }

    pub fn send_telemetry_event(
        &self,
        event_name: &str,
        properties: &PropertyMap,
        measurements: &MeasurementMap,
    ) {
        self.create_telemetry_event(event_name, properties, measurements)
            .send();
    }

    /// Start timing an action; the event is built when the timer is sent.
    pub fn create_timed_action(
        &self,
        view: &str,
        action: &str,
        target: &str,
        source: &str,
    ) -> TimedAction<'_> {
        TimedAction::new(self, view, action, target, source)
    }

    /// Flush and release the transport.
    ///
    /// Safe to call on a degraded reporter and safe to call repeatedly; only
    /// the first call reaches the transport. Concurrent callers all wait for
    /// that first teardown to finish.
    pub async fn dispose(&self) {
        self.disposed
            .get_or_init(|| async {
                let Some(transport) = self.transport.as_ref() else {
                    return;
                };
                if let Err(err) = transport.dispose().await {
                    tracing::warn!(
                        extension = %self.identity.extension_name,
                        error = %err,
                        "telemetry transport dispose failed"
                    );
                }
            })
            .await;
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("extension_name", &self.identity.extension_name)
            .field("extension_version", &self.identity.extension_version)
            .field("state", &self.state())
            .field("common", &self.common)
            .field("disposed", &self.disposed.initialized())
            .finish_non_exhaustive()
    }
}
