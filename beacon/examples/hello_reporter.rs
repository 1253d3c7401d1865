//! Hello Reporter Example
//!
//! Sends a few events through the NDJSON transport and prints the file.

use std::time::Duration;

use beacon::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let path = std::env::temp_dir().join("beacon_hello").join("events.ndjson");

    let config = ReporterConfig::builder("hello-ext", env!("CARGO_PKG_VERSION"), "demo-key")
        .host_version("1.0.0-demo")
        .build();
    let reporter = Reporter::new(config, |id: &TransportIdentity| {
        NdjsonTransport::create(&path, id)
    });

    reporter.send_view_event("Welcome");

    let timer = reporter.create_timed_action("Welcome", "LoadSamples", "SampleList", "Startup");
    tokio::time::sleep(Duration::from_millis(25)).await;
    timer.send();

    let mut measures = MeasurementMap::new();
    measures.insert("samples".into(), 12.0);
    reporter.send_metrics_event(&measures, "Welcome");

    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "samples.json not found");
    reporter.send_error_event2(
        "Welcome",
        "SampleLoadFailed",
        Some(&ErrorInfo::from_error(&err)),
        false,
        "ENOENT",
        "Io",
    );

    reporter.dispose().await;

    println!("Events written to {}:", path.display());
    println!("{}", std::fs::read_to_string(&path)?);

    Ok(())
}
