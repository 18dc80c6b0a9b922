//! Resource exporter against the real file store and `/proc/stat` reader.

use scantel_adapters::host::ProcStatReader;
use scantel_adapters::snapshot_store::AtomicFileSnapshotStore;
use scantel_app::{ExporterDeps, ExporterRegistry, ExporterSettings};
use scantel_domain::{CpuTimes, Metric};
use scantel_shared::{ErrorCode, ErrorEnvelope, Result};
use scantel_testkit::fixtures::proc_stat_basic;
use scantel_testkit::{FailingCollector, FixedCpuSource, StubCollector};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn file_deps(cpu: CpuTimes) -> ExporterDeps {
    ExporterDeps {
        store: Arc::new(AtomicFileSnapshotStore::new()),
        cpu_times: Arc::new(FixedCpuSource::new(cpu)),
    }
}

fn settings(directory: &Path, prefix: &str) -> Result<ExporterSettings> {
    ExporterSettings::new(&directory.to_string_lossy(), prefix)
}

#[test]
fn cpu_snapshot_lands_at_stage_path() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let registry = ExporterRegistry::new();
    registry.init(
        settings(temp.path(), "planner")?,
        file_deps(CpuTimes {
            user: 10,
            system: 20,
            iowait: 30,
        }),
    )?;

    let path = registry.write_snapshot("start")?;
    assert_eq!(path, temp.path().join("planner_start.prom"));

    let text = fs::read_to_string(&path)?;
    assert!(text.contains(
        "# HELP planner_cpu_system_jiffies_total Aggregate CPU time spent in kernel mode, in jiffies\n"
    ));
    assert!(text.contains("# TYPE planner_cpu_system_jiffies_total counter\n"));
    assert!(text.contains("planner_cpu_system_jiffies_total{stage=\"start\"} 20\n"));
    assert!(text.contains("planner_cpu_user_jiffies_total{stage=\"start\"} 10\n"));
    assert!(text.contains("planner_cpu_iowait_jiffies_total{stage=\"start\"} 30\n"));
    Ok(())
}

#[test]
fn proc_stat_fixture_feeds_the_cpu_collector() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let stat =
        proc_stat_basic().map_err(|error| ErrorEnvelope::invalid_argument(error.to_string()))?;
    let registry = ExporterRegistry::new();
    registry.init(
        settings(temp.path(), "")?,
        ExporterDeps {
            store: Arc::new(AtomicFileSnapshotStore::new()),
            cpu_times: Arc::new(ProcStatReader::new(stat)),
        },
    )?;

    let path = registry.write_snapshot("")?;
    assert_eq!(path, temp.path().join("scantel.prom"));
    let text = fs::read_to_string(&path)?;
    assert!(text.contains("scantel_cpu_user_jiffies_total 10\n"));
    assert!(text.contains("scantel_cpu_system_jiffies_total 20\n"));
    assert!(text.contains("scantel_cpu_iowait_jiffies_total 30\n"));
    Ok(())
}

#[test]
fn registered_collector_gets_stage_label() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let registry = ExporterRegistry::new();
    registry.init(settings(temp.path(), "planner")?, file_deps(CpuTimes::default()))?;

    let stub = Arc::new(StubCollector::new(
        "stub",
        vec![
            Metric::gauge("stub_queue_depth", "Queued scan tasks", 3.0)
                .with_label("source", "stub"),
        ],
    ));
    registry.register_collector(stub.clone())?;

    let path = registry.write_snapshot("custom")?;
    let text = fs::read_to_string(path)?;
    assert!(text.contains("stub_queue_depth{source=\"stub\",stage=\"custom\"} 3\n"));
    assert_eq!(stub.stages(), vec!["custom".to_string()]);
    Ok(())
}

#[test]
fn failed_snapshot_keeps_previous_file() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let registry = ExporterRegistry::new();
    let exporter = registry.init(
        settings(temp.path(), "planner")?,
        file_deps(CpuTimes::default()),
    )?;

    let path = exporter.write_snapshot("end")?;
    let before = fs::read_to_string(&path)?;

    exporter.register(Arc::new(FailingCollector::new(
        "scheduler",
        ErrorEnvelope::parse("queue stats unavailable"),
    )))?;
    let error = exporter.write_snapshot("end").err();
    assert_eq!(
        error.as_ref().map(|error| &error.code),
        Some(&ErrorCode::collector_failed())
    );
    assert_eq!(
        error
            .as_ref()
            .and_then(|error| error.metadata.get("collector"))
            .map(String::as_str),
        Some("scheduler")
    );

    assert_eq!(fs::read_to_string(&path)?, before);
    let leftovers = fs::read_dir(temp.path())?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
    Ok(())
}

#[test]
fn snapshot_overwrites_whole_file() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let source = Arc::new(FixedCpuSource::new(CpuTimes {
        user: 1,
        system: 1,
        iowait: 1,
    }));
    let registry = ExporterRegistry::new();
    registry.init(
        settings(temp.path(), "planner")?,
        ExporterDeps {
            store: Arc::new(AtomicFileSnapshotStore::new()),
            cpu_times: source.clone(),
        },
    )?;

    let path = registry.write_snapshot("scan")?;
    source.set(CpuTimes {
        user: 2,
        system: 2,
        iowait: 2,
    });
    registry.write_snapshot("scan")?;

    let text = fs::read_to_string(path)?;
    assert!(text.contains("planner_cpu_user_jiffies_total{stage=\"scan\"} 2\n"));
    assert!(!text.contains("} 1\n"));
    Ok(())
}

#[test]
fn init_creates_nested_directory() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let nested = temp.path().join("a").join("b");
    let registry = ExporterRegistry::new();
    registry.init(settings(&nested, "planner")?, file_deps(CpuTimes::default()))?;
    assert!(nested.is_dir());
    Ok(())
}

#[test]
fn init_fails_when_directory_is_a_file() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let blocker = temp.path().join("occupied");
    fs::write(&blocker, "not a directory")?;

    let registry = ExporterRegistry::new();
    let error = registry
        .init(settings(&blocker, "planner")?, file_deps(CpuTimes::default()))
        .err();
    assert!(error.is_some_and(|error| error.code.is_io_family()));
    assert!(registry.current().is_none());
    Ok(())
}
