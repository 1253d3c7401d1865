//! NDJSON file transport.
//!
//! Appends one JSON object per event to a file:
//! `{"name":"<extension>/<event>","properties":{..},"measurements":{..}}`.
//! Lines are buffered and only guaranteed on disk after `dispose()`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use beacon_core::record::{MeasurementMap, PropertyMap};

use crate::traits::{TelemetryTransport, TransportIdentity};
use crate::{Result, TransportError};

#[derive(Debug, serde::Serialize)]
struct EventLine<'a> {
    name: String,
    properties: &'a PropertyMap,
    measurements: &'a MeasurementMap,
}

/// File-backed transport (single writer enforced by an in-process mutex).
#[derive(Debug)]
pub struct NdjsonTransport {
    path: PathBuf,
    namespace: String,
    enabled: bool,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl NdjsonTransport {
    /// Open (or create) `path` for appending. Parent directories are created.
    pub fn create(path: impl AsRef<Path>, identity: &TransportIdentity) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if identity.extension_name.is_empty() {
            return Err(TransportError::Construction(
                "extension name must be non-empty".to_string(),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(
            path = %path.display(),
            extension = %identity.extension_name,
            "opened ndjson transport"
        );
        Ok(Self {
            path,
            namespace: identity.extension_name.clone(),
            enabled: true,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// Opt-out switch: a disabled transport accepts and drops every event.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn namespaced(&self, name: &str) -> String {
        format!("{}/{}", self.namespace, name)
    }

    fn guard(&self) -> Result<MutexGuard<'_, Option<BufWriter<File>>>> {
        self.writer
            .lock()
            .map_err(|_| TransportError::SendFailed("ndjson writer mutex poisoned".to_string()))
    }

    fn close(&self) -> Result<()> {
        let mut guard = self.guard()?;
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            tracing::debug!(path = %self.path.display(), "closed ndjson transport");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TelemetryTransport for NdjsonTransport {
    fn send_event(
        &self,
        name: &str,
        properties: &PropertyMap,
        measurements: &MeasurementMap,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let line = EventLine {
            name: self.namespaced(name),
            properties,
            measurements,
        };
        let mut buf =
            serde_json::to_vec(&line).map_err(|e| TransportError::Serialization(e.to_string()))?;
        buf.push(b'\n');

        let mut guard = self.guard()?;
        let writer = guard.as_mut().ok_or(TransportError::Disposed)?;
        writer.write_all(&buf)?;
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut dir = std::env::temp_dir();
        dir.push(format!("beacon_{prefix}_{pid}_{nanos}"));
        dir.join("events.ndjson")
    }

    fn identity() -> TransportIdentity {
        TransportIdentity {
            extension_name: "sample-ext".to_string(),
            extension_version: "0.1.0".to_string(),
            key: "test-key".to_string(),
        }
    }

    #[tokio::test]
    async fn writes_namespaced_lines_on_dispose() {
        let path = temp_path("writes_namespaced_lines");
        let transport = NdjsonTransport::create(&path, &identity()).unwrap();

        let mut props = PropertyMap::new();
        props.insert("view".into(), "Dashboard".into());
        transport
            .send_event("view", &props, &MeasurementMap::new())
            .unwrap();
        transport.dispose().await.unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["name"], "sample-ext/view");
        assert_eq!(value["properties"]["view"], "Dashboard");

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn disabled_transport_drops_events() {
        let path = temp_path("disabled_transport");
        let transport = NdjsonTransport::create(&path, &identity())
            .unwrap()
            .with_enabled(false);

        transport
            .send_event("view", &PropertyMap::new(), &MeasurementMap::new())
            .unwrap();
        transport.dispose().await.unwrap();

        assert!(fs::read_to_string(&path).unwrap().is_empty());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn send_after_dispose_is_rejected() {
        let path = temp_path("send_after_dispose");
        let transport = NdjsonTransport::create(&path, &identity()).unwrap();
        transport.dispose().await.unwrap();
        transport.dispose().await.unwrap();

        let err = transport
            .send_event("view", &PropertyMap::new(), &MeasurementMap::new())
            .unwrap_err();
        assert!(matches!(err, TransportError::Disposed));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn empty_extension_name_is_rejected() {
        let mut id = identity();
        id.extension_name.clear();
        let err = NdjsonTransport::create(temp_path("empty_name"), &id).unwrap_err();
        assert!(matches!(err, TransportError::Construction(_)));
    }
}
