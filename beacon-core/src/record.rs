//! Event record schema.
//!
//! An event is a name plus two flat maps: string properties and numeric
//! measurements. Both maps are `BTreeMap`s so serialized records have a
//! deterministic key order.

use std::collections::BTreeMap;

/// String-valued event fields.
pub type PropertyMap = BTreeMap<String, String>;

/// Numeric event fields.
pub type MeasurementMap = BTreeMap<String, f64>;

/// Merge `extra` into `target`. Keys from `extra` overwrite existing keys.
pub fn merge_properties(target: &mut PropertyMap, extra: &PropertyMap) {
    for (k, v) in extra {
        target.insert(k.clone(), v.clone());
    }
}

/// Merge `extra` into `target`. Keys from `extra` overwrite existing keys.
pub fn merge_measurements(target: &mut MeasurementMap, extra: &MeasurementMap) {
    for (k, v) in extra {
        target.insert(k.clone(), *v);
    }
}

/// The fixed vocabulary of event shapes a reporter knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A page or item was observed
    View,
    /// A discrete user/system action
    Action,
    /// A batch of numeric measurements
    Metrics,
    /// A failure
    Error,
}

impl EventKind {
    /// Wire name of the event. Custom events carry a caller-chosen name
    /// and have no kind.
    pub const fn event_name(&self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::Action => "action",
            EventKind::Metrics => "metrics",
            EventKind::Error => "error",
        }
    }
}

/// One outgoing telemetry event.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub name: String,
    pub properties: PropertyMap,
    pub measurements: MeasurementMap,
}

impl EventRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: PropertyMap::new(),
            measurements: MeasurementMap::new(),
        }
    }

    /// Set a single property, replacing any previous value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Set a single measurement, replacing any previous value.
    pub fn set_measurement(&mut self, key: impl Into<String>, value: f64) {
        self.measurements.insert(key.into(), value);
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn measurement(&self, key: &str) -> Option<f64> {
        self.measurements.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn later_properties_win_and_unrelated_keys_survive() {
        let mut target = props(&[("a", "1"), ("b", "2")]);
        merge_properties(&mut target, &props(&[("b", "override"), ("c", "3")]));

        assert_eq!(target.len(), 3);
        assert_eq!(target["a"], "1");
        assert_eq!(target["b"], "override");
        assert_eq!(target["c"], "3");
    }

    #[test]
    fn measurement_merge_leaves_source_untouched() {
        let mut target = MeasurementMap::new();
        target.insert("x".into(), 1.0);
        let mut extra = MeasurementMap::new();
        extra.insert("x".into(), 2.0);

        merge_measurements(&mut target, &extra);

        assert_eq!(target["x"], 2.0);
        assert_eq!(extra.len(), 1);
    }

    #[test]
    fn kind_names() {
        assert_eq!(EventKind::View.event_name(), "view");
        assert_eq!(EventKind::Action.event_name(), "action");
        assert_eq!(EventKind::Metrics.event_name(), "metrics");
        assert_eq!(EventKind::Error.event_name(), "error");
    }

    #[test]
    fn record_serializes_camel_case() {
        let mut rec = EventRecord::new("view");
        rec.set_property("view", "Dashboard");
        rec.set_measurement("count", 3.0);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["name"], "view");
        assert_eq!(json["properties"]["view"], "Dashboard");
        assert_eq!(json["measurements"]["count"], 3.0);
    }
}
