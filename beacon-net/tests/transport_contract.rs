//! Integration tests for the transport contract and construction seam.

use std::sync::Arc;

use beacon_core::record::{MeasurementMap, PropertyMap};
use beacon_net::{MockTransport, TelemetryTransport, TransportError, TransportFactory, TransportIdentity};

fn identity() -> TransportIdentity {
    TransportIdentity {
        extension_name: "sample-ext".to_string(),
        extension_version: "1.2.3".to_string(),
        key: "0000-key".to_string(),
    }
}

#[test]
fn closure_factory_receives_identity() {
    let factory = |id: &TransportIdentity| {
        assert_eq!(id.extension_name, "sample-ext");
        assert_eq!(id.key, "0000-key");
        Ok::<_, TransportError>(MockTransport::new())
    };
    assert!(factory.create(&identity()).is_ok());
}

#[test]
fn closure_factory_error_converts() {
    let factory = |_: &TransportIdentity| {
        Err::<MockTransport, _>(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "no access",
        ))
    };
    let err = factory.create(&identity()).unwrap_err();
    assert!(matches!(err, TransportError::Io(_)));
}

#[tokio::test]
async fn arc_and_trait_object_forward_to_inner() {
    let mock = MockTransport::new();
    let shared: Arc<dyn TelemetryTransport> = Arc::new(mock.clone());
    let outer = Arc::new(shared);

    let mut measures = MeasurementMap::new();
    measures.insert("latencyMs".into(), 42.0);
    outer
        .send_event("metrics", &PropertyMap::new(), &measures)
        .unwrap();
    outer.dispose().await.unwrap();

    assert_eq!(mock.last().unwrap().measurement("latencyMs"), Some(42.0));
    assert_eq!(mock.dispose_calls(), 1);
}
