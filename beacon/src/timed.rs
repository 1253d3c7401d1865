//! Timed actions: an action event whose duration is measured for you.

use beacon_core::record::{merge_measurements, merge_properties, MeasurementMap, PropertyMap};

use crate::reporter::Reporter;

/// Stopwatch for one logical operation.
///
/// The action event is not built until [`send`](Self::send); extra fields
/// are held locally until then. Treat it as single-shot: a second `send`
/// measures again from the same start and reports a longer duration.
#[derive(Debug)]
pub struct TimedAction<'a> {
    reporter: &'a Reporter,
    view: String,
    action: String,
    target: String,
    source: String,
    start_ms: u64,
    properties: PropertyMap,
    measurements: MeasurementMap,
}

impl<'a> TimedAction<'a> {
    pub(crate) fn new(
        reporter: &'a Reporter,
        view: &str,
        action: &str,
        target: &str,
        source: &str,
    ) -> Self {
        Self {
            reporter,
            view: view.to_string(),
            action: action.to_string(),
            target: target.to_string(),
            source: source.to_string(),
            start_ms: reporter.clock().now_millis(),
            properties: PropertyMap::new(),
            measurements: MeasurementMap::new(),
        }
    }

    pub fn with_additional_properties(mut self, props: &PropertyMap) -> Self {
        merge_properties(&mut self.properties, props);
        self
    }

    pub fn with_additional_measures(mut self, measures: &MeasurementMap) -> Self {
        merge_measurements(&mut self.measurements, measures);
        self
    }

    /// Milliseconds since the action was created
    pub fn elapsed_millis(&self) -> u64 {
        self.reporter
            .clock()
            .now_millis()
            .saturating_sub(self.start_ms)
    }

    /// Build the action event with the elapsed duration and send it.
    pub fn send(&self) {
        let duration = self.elapsed_millis() as f64;
        self.reporter
            .create_action_event(
                &self.view,
                &self.action,
                &self.target,
                &self.source,
                Some(duration),
            )
            .with_additional_properties(&self.properties)
            .with_additional_measurements(&self.measurements)
            .send();
    }
}
