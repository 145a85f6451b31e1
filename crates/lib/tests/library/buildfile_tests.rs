//! Build files driving real builds.

use koch_lib::buildfile::BuildFile;
use koch_lib::dispatch::Dispatcher;
use koch_lib::driver::{Driver, Outcome};

use super::common::Project;

fn registry_for(project: &Project, content: &str) -> koch_lib::target::Registry {
  let file = BuildFile::parse(content, &project.path("koch.toml")).unwrap();
  let mut config = project.config();
  file.apply_options(&mut config);
  file.into_registry(&config).unwrap()
}

#[cfg(unix)]
#[test]
fn shell_targets_build_incrementally() {
  let project = Project::new();
  project.write("src/main.txt", "hello");
  let src = project.spec("src/main.txt");
  let out = project.spec("out/main.txt");

  let content = format!(
    r##"
[options]
default = "all"

[[target]]
name = "copy"
prereqs = [{src:?}]
cmd = ["mkdir -p {dir}", "cp {src} {out}"]
output = {out:?}

[[target]]
name = "all"
prereqs = ["#copy"]
"##,
    dir = project.path("out").display(),
  );
  let registry = registry_for(&project, &content);

  let mut driver = Driver::open(&registry, project.config()).unwrap();
  let report = driver.make(None).unwrap();
  assert_eq!(report.outcome, Outcome::Updated);
  assert_eq!(std::fs::read_to_string(project.path("out/main.txt")).unwrap(), "hello");

  let report = driver.make(None).unwrap();
  assert_eq!(report.outcome, Outcome::UpToDate);

  project.write("src/main.txt", "changed");
  let report = driver.make(Some("copy")).unwrap();
  assert_eq!(report.outcome, Outcome::Updated);
  assert_eq!(std::fs::read_to_string(project.path("out/main.txt")).unwrap(), "changed");
}

#[cfg(unix)]
#[test]
fn failing_shell_target_fails_dependents() {
  let project = Project::new();
  let marker = project.spec("ran.txt");

  let content = format!(
    r##"
[[target]]
name = "broken"
cmd = "exit 1"

[[target]]
name = "after"
prereqs = ["#broken"]
cmd = "touch {marker}"
"##
  );
  let registry = registry_for(&project, &content);

  let config = koch_lib::driver::MakeConfig {
    force: true,
    ..project.config()
  };
  let mut driver = Driver::open(&registry, config).unwrap();
  let report = driver.make(Some("after")).unwrap();

  assert_eq!(report.outcome, Outcome::Failed);
  assert_eq!(report.failed[0].name, "broken");
  assert!(!project.path("ran.txt").exists());
}

#[test]
fn clean_command_forgets_everything() {
  let project = Project::new();
  project.write("a.txt", "a");
  let content = format!("[[target]]\nname = \"a\"\nprereqs = [{:?}]\n", project.spec("a.txt"));
  let registry = registry_for(&project, &content);

  let driver = Driver::open(&registry, project.config()).unwrap();
  let mut dispatcher = Dispatcher::new(driver);
  dispatcher.run(&["a".to_string()]).unwrap();
  assert!(project.store_path().exists());

  let report = dispatcher.run(&["clean".to_string()]).unwrap();
  assert!(report.is_success());
  assert!(!project.store_path().exists());
}

#[test]
fn clean_before_target_rebuilds_it() {
  let project = Project::new();
  project.write("a.txt", "a");
  let content = format!("[[target]]\nname = \"a\"\nprereqs = [{:?}]\n", project.spec("a.txt"));
  let registry = registry_for(&project, &content);

  {
    let mut driver = Driver::open(&registry, project.config()).unwrap();
    assert_eq!(driver.make(Some("a")).unwrap().outcome, Outcome::Updated);
  }

  let driver = Driver::open(&registry, project.config()).unwrap();
  let mut dispatcher = Dispatcher::new(driver);
  let report = dispatcher.run(&["clean".to_string(), "a".to_string()]).unwrap();

  assert!(report.is_success());
  assert_eq!(report.target_outcomes().collect::<Vec<_>>(), vec![("a", Outcome::Updated)]);
  assert!(project.store_path().exists());
  assert!(dispatcher.driver().store().has_target("a"));
}

#[cfg(unix)]
#[test]
fn timed_out_command_fails_the_target() {
  let project = Project::new();
  let content = r#"
[options]
timeout = 1

[[target]]
name = "slow"
cmd = "sleep 5"
"#;
  let file = BuildFile::parse(content, &project.path("koch.toml")).unwrap();
  let mut config = project.config();
  file.apply_options(&mut config);
  config.force = true;
  let registry = file.into_registry(&config).unwrap();

  let mut driver = Driver::open(&registry, config).unwrap();
  let report = driver.make(Some("slow")).unwrap();

  assert_eq!(report.outcome, Outcome::Failed);
  assert!(matches!(
    report.failed[0].error,
    koch_lib::action::ActionError::TimedOut { .. }
  ));
}
