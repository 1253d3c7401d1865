//! Allow-list extraction for structured enrichment inputs.
//!
//! Connection and server descriptors can carry far more than telemetry is
//! allowed to see. Only the fields named in each type's `FIELDS` list ever
//! reach an event. JSON input is read key by key: unknown keys are never
//! looked at, and an allow-listed key with an unusable value counts as
//! missing without affecting its neighbours.

use serde_json::{Map, Value};

use crate::record::PropertyMap;
use crate::{EnrichError, Result};

/// Version of the allow-lists below. Bump when a field is added or removed.
pub const ALLOWLIST_VERSION: u32 = 1;

/// Connection fields that may be attached to an event.
pub const CONNECTION_FIELDS_V1: &[&str] = &["authenticationType", "providerName"];

/// Server fields that may be attached to an event.
pub const SERVER_FIELDS_V1: &[&str] = &[
    "connectionType",
    "serverVersion",
    "serverEdition",
    "serverEngineEdition",
];

/// A structured input that can be projected onto its allow-listed properties.
pub trait TelemetryProjection: Sized {
    /// Property keys produced by [`to_properties`](Self::to_properties).
    const FIELDS: &'static [&'static str];

    /// Map the allow-listed fields to event properties. Every key in
    /// `FIELDS` is present in the output; missing values become `""`.
    fn to_properties(&self) -> PropertyMap;

    /// Pick the allow-listed keys out of a JSON object.
    fn from_object(object: &Map<String, Value>) -> Self;

    /// Decode from loosely-typed JSON. Anything that is not an object is
    /// rejected; inside an object every field is read permissively.
    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Self::from_object(object)),
            other => Err(EnrichError::NotAnObject(json_kind(other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings are kept, numbers and booleans rendered; anything else is missing.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn bool_field(object: &Map<String, Value>, key: &str) -> Option<bool> {
    match object.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn int_field(object: &Map<String, Value>, key: &str) -> Option<i64> {
    match object.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Connection descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub authentication_type: Option<String>,
    pub provider_name: Option<String>,
}

impl TelemetryProjection for ConnectionInfo {
    const FIELDS: &'static [&'static str] = CONNECTION_FIELDS_V1;

    fn to_properties(&self) -> PropertyMap {
        let mut out = PropertyMap::new();
        out.insert(
            "authenticationType".into(),
            self.authentication_type.clone().unwrap_or_default(),
        );
        out.insert(
            "providerName".into(),
            self.provider_name.clone().unwrap_or_default(),
        );
        out
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            authentication_type: text_field(object, "authenticationType"),
            provider_name: text_field(object, "providerName"),
        }
    }
}

/// Server descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub is_cloud: Option<bool>,
    pub server_version: Option<String>,
    pub server_edition: Option<String>,
    pub engine_edition_id: Option<i64>,
}

impl ServerInfo {
    /// Categorical deployment type: `"Azure"`, `"Standalone"`, or `""` when unknown.
    pub fn connection_type(&self) -> &'static str {
        match self.is_cloud {
            Some(true) => "Azure",
            Some(false) => "Standalone",
            None => "",
        }
    }
}

impl TelemetryProjection for ServerInfo {
    const FIELDS: &'static [&'static str] = SERVER_FIELDS_V1;

    fn to_properties(&self) -> PropertyMap {
        let mut out = PropertyMap::new();
        out.insert("connectionType".into(), self.connection_type().to_string());
        out.insert(
            "serverVersion".into(),
            self.server_version.clone().unwrap_or_default(),
        );
        out.insert(
            "serverEdition".into(),
            self.server_edition.clone().unwrap_or_default(),
        );
        out.insert(
            "serverEngineEdition".into(),
            self.engine_edition_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        out
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            is_cloud: bool_field(object, "isCloud"),
            server_version: text_field(object, "serverVersion"),
            server_edition: text_field(object, "serverEdition"),
            engine_edition_id: int_field(object, "engineEditionId"),
        }
    }
}
