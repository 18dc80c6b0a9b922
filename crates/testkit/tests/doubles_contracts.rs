//! Contract-style tests for the port doubles.

use scantel_domain::{CpuTimes, InstrumentName, InstrumentSpec, Metric, Stage};
use scantel_ports::{
    Attribute, Collector, CpuTimesPort, LoggerPort, MeterProviderPort, SnapshotStorePort,
    log_fields,
};
use scantel_shared::{ErrorCode, Result};
use scantel_testkit::errors::parse_error;
use scantel_testkit::{
    CapturingLogger, FailingCollector, FixedCpuSource, InMemorySnapshotStore,
    RecordingMeterProvider, StubCollector,
};
use std::path::Path;

#[test]
fn recording_provider_tracks_creations_and_samples() -> Result<()> {
    let provider = RecordingMeterProvider::new("recording");
    let spec = InstrumentSpec::counter(InstrumentName::parse("scan.rows")?);

    let counter = provider.counter(&spec)?;
    counter.add(3, &[Attribute::new("table", "t1")]);
    counter.add(4, &[]);

    assert_eq!(provider.creations("scan.rows"), 1);
    assert_eq!(provider.counter_total("scan.rows"), 7);
    assert_eq!(provider.counter_samples("scan.rows").len(), 2);
    Ok(())
}

#[test]
fn recording_provider_rejections() -> Result<()> {
    let provider = RecordingMeterProvider::new("recording");
    let spec = InstrumentSpec::histogram(InstrumentName::parse("scan.latency")?);

    provider.reject("scan.latency");
    let rejected = provider.histogram(&spec).err();
    assert_eq!(
        rejected.map(|error| error.code),
        Some(ErrorCode::instrument_creation())
    );
    assert_eq!(provider.total_creations(), 0);
    Ok(())
}

#[test]
fn collector_doubles() -> Result<()> {
    let stage = Stage::parse("start")?;
    let stub = StubCollector::new("stub", vec![Metric::gauge("up", "Up", 1.0)]);
    assert_eq!(stub.collect(&stage)?.len(), 1);
    assert_eq!(stub.stages(), vec!["start".to_string()]);

    let failing = FailingCollector::new("broken", parse_error());
    assert!(failing.collect(&stage).is_err());

    let source = FixedCpuSource::new(CpuTimes::default());
    source.set(CpuTimes {
        user: 1,
        system: 2,
        iowait: 3,
    });
    assert_eq!(source.read_cpu_times()?.system, 2);
    Ok(())
}

#[test]
fn in_memory_store_and_capturing_logger() -> Result<()> {
    let store = InMemorySnapshotStore::default();
    store.ensure_directory(Path::new("/snap"))?;
    let path = store.publish(Path::new("/snap"), "a.prom", b"up 1\n")?;
    assert_eq!(store.contents(&path).as_deref(), Some("up 1\n"));
    assert!(store.has_directory(Path::new("/snap")));

    let logger = CapturingLogger::default();
    let child = logger.child(log_fields([("component", "exporter".into())]));
    child.info("exporter.init", "init", None);
    let event = logger.last("exporter.init");
    assert!(
        event
            .and_then(|event| event.fields)
            .is_some_and(|fields| fields.contains_key("component"))
    );
    Ok(())
}
