//! Ad hoc commands through the binary.

use predicates::prelude::*;

use super::common::TestEnv;

const COMMANDS: &str = r#"
[[target]]
name = "all"

[[command]]
name = "pair"
desc = "write two arguments"
run = "echo \"$1 $2\" > pair.txt"
args = 2

[[command]]
name = "every"
desc = "write all arguments"
run = "echo \"$@\" > every.txt"
args = "*"
"#;

#[cfg(unix)]
#[test]
fn fixed_arity_command_takes_its_arguments() {
  let env = TestEnv::with_build_file(COMMANDS);

  env.koch_cmd().args(["pair", "x", "y", "all"]).assert().success();

  assert_eq!(env.read_file("pair.txt").trim(), "x y");
}

#[cfg(unix)]
#[test]
fn variadic_command_takes_everything_after_it() {
  let env = TestEnv::with_build_file(COMMANDS);

  env.koch_cmd().args(["every", "a", "-b", "all"]).assert().success();

  assert_eq!(env.read_file("every.txt").trim(), "a -b all");
}

#[test]
fn missing_arguments_fail() {
  let env = TestEnv::with_build_file(COMMANDS);

  env
    .koch_cmd()
    .args(["pair", "x"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("command 'pair' expects 2 arguments"));
}

#[cfg(unix)]
#[test]
fn failing_command_sets_exit_code() {
  let env = TestEnv::with_build_file("[[command]]\nname = \"boom\"\nrun = \"exit 4\"\n");

  env
    .koch_cmd()
    .arg("boom")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("command 'boom' failed"));
}
