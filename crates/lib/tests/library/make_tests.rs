//! Incremental rebuild behavior across `make` calls and processes.

use koch_lib::driver::{Driver, MakeConfig, Outcome};
use koch_lib::fingerprint::{FingerprintStore, checksum_bytes};
use koch_lib::target::{Registry, Target};

use super::common::{Counter, Project};

fn single(target: Target) -> Registry {
  let mut registry = Registry::new();
  registry.register(target).unwrap();
  registry
}

#[test]
fn build_then_up_to_date_then_rebuild_on_change() {
  let project = Project::new();
  project.write("a.txt", "hello");
  let runs = Counter::default();

  let mut registry = Registry::new();
  registry
    .register(Target::new("T1").prereq(&project.spec("a.txt")).callback(runs.succeed()))
    .unwrap();

  {
    let mut driver = Driver::open(&registry, project.config()).unwrap();
    assert_eq!(driver.make(Some("T1")).unwrap().outcome, Outcome::Updated);
  }
  assert_eq!(runs.get(), 1);

  let store = FingerprintStore::load(project.store_path()).unwrap();
  assert_eq!(store.recorded("T1", &project.path("a.txt")), Some(checksum_bytes(b"hello")));

  {
    let mut driver = Driver::open(&registry, project.config()).unwrap();
    assert_eq!(driver.make(Some("T1")).unwrap().outcome, Outcome::UpToDate);
  }
  assert_eq!(runs.get(), 1);

  project.write("a.txt", "hello!");
  {
    let mut driver = Driver::open(&registry, project.config()).unwrap();
    assert_eq!(driver.make(Some("T1")).unwrap().outcome, Outcome::Updated);
  }
  assert_eq!(runs.get(), 2);
}

#[test]
fn staleness_propagates_through_target_references() {
  let project = Project::new();
  project.write("f.txt", "v1");
  let a_runs = Counter::default();
  let b_runs = Counter::default();

  let mut registry = Registry::new();
  registry
    .register(Target::new("B").prereq(&project.spec("f.txt")).callback(b_runs.succeed()))
    .unwrap();
  registry
    .register(Target::new("A").prereq("#B").callback(a_runs.succeed()))
    .unwrap();

  let mut driver = Driver::open(&registry, project.config()).unwrap();
  driver.make(Some("A")).unwrap();
  assert_eq!((a_runs.get(), b_runs.get()), (1, 1));

  project.write("f.txt", "v2");
  let report = driver.make(Some("A")).unwrap();

  assert_eq!(report.outcome, Outcome::Updated);
  assert_eq!(report.built, vec!["B", "A"]);
  assert_eq!((a_runs.get(), b_runs.get()), (2, 2));

  let report = driver.make(Some("A")).unwrap();
  assert_eq!(report.outcome, Outcome::UpToDate);
  assert_eq!(report.up_to_date, vec!["B", "A"]);
}

#[test]
fn failed_sub_target_blocks_dependent() {
  let project = Project::new();
  let t1_runs = Counter::default();
  let t2_runs = Counter::default();

  let mut registry = Registry::new();
  registry
    .register(Target::new("T1").callback(t1_runs.exit_with(1)))
    .unwrap();
  registry
    .register(Target::new("T2").prereq("#T1").callback(t2_runs.succeed()))
    .unwrap();

  let config = MakeConfig {
    force: true,
    ..project.config()
  };
  let mut driver = Driver::open(&registry, config).unwrap();
  let report = driver.make(Some("T2")).unwrap();

  assert_eq!(report.outcome, Outcome::Failed);
  assert_eq!(t1_runs.get(), 1);
  assert_eq!(t2_runs.get(), 0);
  let failed: Vec<_> = report.failed.iter().map(|f| f.name.as_str()).collect();
  assert_eq!(failed, vec!["T1"]);
}

#[test]
fn failed_build_leaves_recorded_fingerprints_alone() {
  let project = Project::new();
  project.write("a.txt", "v1");

  let good = single(Target::new("T").prereq(&project.spec("a.txt")).callback(|| Ok(0)));
  {
    let mut driver = Driver::open(&good, project.config()).unwrap();
    driver.make(Some("T")).unwrap();
  }

  project.write("a.txt", "v2");
  let bad = single(Target::new("T").prereq(&project.spec("a.txt")).callback(|| Ok(1)));
  {
    let mut driver = Driver::open(&bad, project.config()).unwrap();
    assert_eq!(driver.make(Some("T")).unwrap().outcome, Outcome::Failed);
    assert_eq!(
      driver.store().recorded("T", &project.path("a.txt")),
      Some(checksum_bytes(b"v1"))
    );
  }

  let store = FingerprintStore::load(project.store_path()).unwrap();
  assert_eq!(store.recorded("T", &project.path("a.txt")), Some(checksum_bytes(b"v1")));
}

#[test]
fn deleted_output_is_rebuilt() {
  let project = Project::new();
  project.write("src.txt", "x");
  let out = project.path("out.bin");
  let runs = Counter::default();

  let build = {
    let out = out.clone();
    let count = runs.succeed();
    move || {
      std::fs::write(&out, "built").map_err(koch_lib::action::ActionError::callback)?;
      count()
    }
  };

  let mut registry = Registry::new();
  registry
    .register(
      Target::new("out")
        .prereq(&project.spec("src.txt"))
        .output(&out)
        .callback(build),
    )
    .unwrap();

  let mut driver = Driver::open(&registry, project.config()).unwrap();
  driver.make(Some("out")).unwrap();
  assert_eq!(driver.make(Some("out")).unwrap().outcome, Outcome::UpToDate);

  project.remove("out.bin");
  assert_eq!(driver.make(Some("out")).unwrap().outcome, Outcome::Updated);
  assert!(out.exists());
  assert_eq!(runs.get(), 2);
}

#[test]
fn successful_siblings_survive_a_failed_make() {
  let project = Project::new();
  project.write("ok.txt", "ok");

  let mut registry = Registry::new();
  registry
    .register(Target::new("ok").prereq(&project.spec("ok.txt")).callback(|| Ok(0)))
    .unwrap();
  registry.register(Target::new("broken").callback(|| Ok(1))).unwrap();
  registry
    .register(Target::new("all").prereqs(["#ok", "#broken"]))
    .unwrap();

  let config = MakeConfig {
    force: true,
    ..project.config()
  };
  {
    let mut driver = Driver::open(&registry, config).unwrap();
    assert_eq!(driver.make(Some("all")).unwrap().outcome, Outcome::Failed);
  }

  let store = FingerprintStore::load(project.store_path()).unwrap();
  assert!(store.recorded("ok", &project.path("ok.txt")).is_some());
  assert!(!store.has_target("broken"));
  assert!(!store.has_target("all"));
}

#[test]
fn missing_prerequisite_counts_as_changed() {
  let project = Project::new();
  let runs = Counter::default();

  let mut registry = Registry::new();
  registry
    .register(Target::new("t").prereq(&project.spec("absent.txt")).callback(runs.succeed()))
    .unwrap();

  let mut driver = Driver::open(&registry, project.config()).unwrap();
  assert_eq!(driver.make(Some("t")).unwrap().outcome, Outcome::Updated);
  assert_eq!(driver.make(Some("t")).unwrap().outcome, Outcome::Updated);
  assert_eq!(runs.get(), 2);
}

#[test]
fn corrupt_store_is_fatal() {
  let project = Project::new();
  project.write("koch.dat", "not json");
  let registry = Registry::new();

  assert!(Driver::open(&registry, project.config()).is_err());
}

#[cfg(unix)]
#[test]
fn concurrent_driver_is_refused() {
  let project = Project::new();
  let registry = Registry::new();

  let _first = Driver::open(&registry, project.config()).unwrap();
  let second = Driver::open(&registry, project.config());

  assert!(matches!(second, Err(koch_lib::driver::DriverError::Lock(_))));
}

#[cfg(unix)]
#[test]
fn shell_actions_rebuild_outputs() {
  let project = Project::new();
  project.write("in.txt", "data");
  let out = project.path("out.txt");

  let mut registry = Registry::new();
  registry
    .register(
      Target::new("copy")
        .prereq(&project.spec("in.txt"))
        .action(format!("cp '{}' '{}'", project.path("in.txt").display(), out.display()))
        .output(&out),
    )
    .unwrap();

  let mut driver = Driver::open(&registry, project.config()).unwrap();
  assert_eq!(driver.make(Some("copy")).unwrap().outcome, Outcome::Updated);
  assert_eq!(std::fs::read_to_string(&out).unwrap(), "data");
  assert_eq!(driver.make(Some("copy")).unwrap().outcome, Outcome::UpToDate);
}
