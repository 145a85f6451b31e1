//! Token dispatch over a full driver session.

use std::sync::{Arc, Mutex};

use koch_lib::dispatch::{DispatchError, Dispatched, Dispatcher};
use koch_lib::driver::{Driver, MakeConfig, Outcome};
use koch_lib::target::{Arity, Command, Registry, Target};

use super::common::{Counter, Project};

fn tokens(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn mixed_targets_and_commands_run_left_to_right() {
  let project = Project::new();
  let order = Arc::new(Mutex::new(Vec::new()));

  let mut registry = Registry::new();
  for name in ["lib", "app"] {
    let order = order.clone();
    registry
      .register(Target::new(name).callback(move || {
        order.lock().unwrap().push(name.to_string());
        Ok(0)
      }))
      .unwrap();
  }
  let log = order.clone();
  registry
    .register_command(Command::new("say", "", Arity::Fixed(1), move |args| {
      log.lock().unwrap().push(format!("say {}", args[0]));
      Ok(0)
    }))
    .unwrap();

  let config = MakeConfig {
    force: true,
    ..project.config()
  };
  let mut dispatcher = Dispatcher::new(Driver::open(&registry, config).unwrap());
  let report = dispatcher.run(&tokens(&["app", "say", "hi", "lib"])).unwrap();

  assert!(report.is_success());
  assert_eq!(*order.lock().unwrap(), vec!["app", "say hi", "lib"]);
}

#[test]
fn default_target_needs_no_tokens() {
  let project = Project::new();
  let runs = Counter::default();

  let mut registry = Registry::new();
  registry.register(Target::new("main")).unwrap();
  registry
    .register(Target::new("all").prereq("#main").callback(runs.succeed()))
    .unwrap();
  registry.set_default("all");

  let config = MakeConfig {
    force: true,
    ..project.config()
  };
  let mut dispatcher = Dispatcher::new(Driver::open(&registry, config).unwrap());
  let report = dispatcher.run(&[]).unwrap();

  let outcomes: Vec<_> = report.target_outcomes().collect();
  assert_eq!(outcomes, vec![("all", Outcome::Updated)]);
  assert_eq!(runs.get(), 1);
}

#[test]
fn each_target_is_a_separate_make() {
  let project = Project::new();
  let runs = Counter::default();

  let mut registry = Registry::new();
  registry.register(Target::new("a").callback(runs.succeed())).unwrap();

  let config = MakeConfig {
    force: true,
    ..project.config()
  };
  let mut dispatcher = Dispatcher::new(Driver::open(&registry, config).unwrap());
  dispatcher.run(&tokens(&["a", "a"])).unwrap();

  assert_eq!(runs.get(), 2);
}

#[test]
fn unknown_token_stops_dispatch() {
  let project = Project::new();
  let runs = Counter::default();

  let mut registry = Registry::new();
  registry.register(Target::new("a").callback(runs.succeed())).unwrap();

  let config = MakeConfig {
    force: true,
    ..project.config()
  };
  let mut dispatcher = Dispatcher::new(Driver::open(&registry, config).unwrap());
  let err = dispatcher.run(&tokens(&["nope", "a"])).unwrap_err();

  assert_eq!(err.to_string(), "Invalid target/command: nope");
  assert!(matches!(err, DispatchError::UnknownTarget(_)));
  assert_eq!(runs.get(), 0);
}

#[test]
fn command_errors_are_reported() {
  let project = Project::new();

  let mut registry = Registry::new();
  registry
    .register_command(Command::new("oops", "", Arity::Variadic, |_| {
      Err(koch_lib::action::ActionError::callback("no can do"))
    }))
    .unwrap();

  let mut dispatcher = Dispatcher::new(Driver::open(&registry, project.config()).unwrap());
  let report = dispatcher.run(&tokens(&["oops", "x", "y"])).unwrap();

  assert!(!report.is_success());
  match &report.dispatched[0] {
    Dispatched::Command(run) => {
      assert_eq!(run.args, vec!["x", "y"]);
      assert!(run.result.is_err());
    }
    other => panic!("unexpected dispatch: {other:?}"),
  }
}
