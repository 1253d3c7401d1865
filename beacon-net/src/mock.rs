//! Mock transport for testing
//!
//! Records every event it is handed. Clones share the same recording, so a
//! test can keep one handle while a reporter owns another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use beacon_core::record::{EventRecord, MeasurementMap, PropertyMap};

use crate::traits::TelemetryTransport;
use crate::{Result, TransportError};

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<EventRecord>,
    send_attempts: usize,
    dispose_calls: usize,
}

/// Mock transport for testing without a real telemetry backend
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    /// Reject every send with `SendFailed`
    pub fail_sends: bool,
    /// Panic inside `send_event`
    pub panic_on_send: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail
    pub fn failing(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Make every send panic
    pub fn panicking(mut self) -> Self {
        self.panic_on_send = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Events accepted so far, in send order
    pub fn sent(&self) -> Vec<EventRecord> {
        self.state().sent.clone()
    }

    /// Most recently accepted event
    pub fn last(&self) -> Option<EventRecord> {
        self.state().sent.last().cloned()
    }

    /// Every call to `send_event`, including failed ones
    pub fn send_attempts(&self) -> usize {
        self.state().send_attempts
    }

    pub fn dispose_calls(&self) -> usize {
        self.state().dispose_calls
    }
}

#[async_trait::async_trait]
impl TelemetryTransport for MockTransport {
    fn send_event(
        &self,
        name: &str,
        properties: &PropertyMap,
        measurements: &MeasurementMap,
    ) -> Result<()> {
        self.state().send_attempts += 1;
        if self.panic_on_send {
            panic!("mock transport panicked sending {name}");
        }
        if self.fail_sends {
            return Err(TransportError::SendFailed(format!("mock rejected {name}")));
        }
        self.state().sent.push(EventRecord {
            name: name.to_string(),
            properties: properties.clone(),
            measurements: measurements.clone(),
        });
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.state().dispose_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_recording() {
        let mock = MockTransport::new();
        let handle = mock.clone();
        mock.send_event("view", &PropertyMap::new(), &MeasurementMap::new())
            .unwrap();
        assert_eq!(handle.sent().len(), 1);
        assert_eq!(handle.last().unwrap().name, "view");
    }

    #[test]
    fn failing_mock_counts_attempts_only() {
        let mock = MockTransport::new().failing();
        let err = mock
            .send_event("view", &PropertyMap::new(), &MeasurementMap::new())
            .unwrap_err();
        assert!(matches!(err, TransportError::SendFailed(_)));
        assert_eq!(mock.send_attempts(), 1);
        assert!(mock.sent().is_empty());
    }
}
