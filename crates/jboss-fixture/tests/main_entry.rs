//! Integration tests for the `jboss-fixture` binary entry point.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;

#[test]
fn status_against_closed_port_reports_not_ready() {
    let mut command = cargo_bin_cmd!("jboss-fixture");
    command.args(["--host", "127.0.0.1", "--port", "1", "status"]);
    command
        .assert()
        .success()
        .stdout(contains("server is not ready at http://127.0.0.1:1"));
}

#[test]
fn missing_command_exits_with_failure() {
    let mut command = cargo_bin_cmd!("jboss-fixture");
    command.args(["--port", "1"]);
    command.assert().failure().stderr(contains("Usage"));
}

#[test]
fn deploy_against_closed_port_fails() {
    let mut command = cargo_bin_cmd!("jboss-fixture");
    command.args([
        "--host",
        "127.0.0.1",
        "--port",
        "1",
        "deploy",
        "http://repo.example/app.war",
    ]);
    command
        .assert()
        .failure()
        .stderr(contains("management call"));
}

#[test]
fn help_lists_commands() {
    let mut command = cargo_bin_cmd!("jboss-fixture");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("deploy").and(contains("undeploy")));
}
