//! Tests for the lifecycle controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use jboss_config::ManagementEndpoint;
use mockall::{Sequence, mock};
use rstest::rstest;

use crate::control::{
    Artifact, ControlError, DeploymentAction, ManagementClient, ManagementRequest, fixtures,
};
use crate::lifecycle::{
    LaunchCommand, LifecycleError, Server, ServerSettings, StartOutcome, StopOutcome,
};

mock! {
    Console {}
    impl ManagementClient for Console {
        fn call(&self, request: &ManagementRequest) -> Result<String, ControlError>;
    }
}

const APP: &str = "http://repo.example/app.war";

fn settings(command: LaunchCommand, lazy: bool) -> ServerSettings {
    ServerSettings {
        lazy,
        poll_interval: Duration::from_millis(10),
        shutdown_timeout: Duration::from_secs(2),
        handle_signals: false,
        ..ServerSettings::new(command, ManagementEndpoint::new("127.0.0.1", 1))
    }
}

fn sleeper() -> LaunchCommand {
    LaunchCommand::new("sleep").arg("30")
}

fn server(console: MockConsole, lazy: bool) -> Server<MockConsole> {
    Server::new(settings(sleeper(), lazy), console)
}

fn artifact() -> Artifact {
    APP.parse().expect("valid artifact")
}

fn unreachable() -> ControlError {
    ControlError::Status {
        url: String::from("http://127.0.0.1:1/jmx-console/HtmlAdaptor"),
        status: 503,
        body: String::new(),
    }
}

fn is_shutdown(request: &ManagementRequest) -> bool {
    request.method() == Some("shutdown")
}

#[test]
fn refuses_to_start_over_a_running_server() {
    let mut console = MockConsole::new();
    console
        .expect_call()
        .times(1)
        .returning(|_| Ok(fixtures::status_page("True")));
    let server = server(console, false);

    let error = server.start(Duration::ZERO).expect_err("start must fail");

    assert!(matches!(error, LifecycleError::AlreadyRunning { .. }));
    assert_eq!(server.pid(), None, "nothing should be launched");
}

#[test]
fn lazy_mode_reuses_and_keeps_running_server() {
    let mut console = MockConsole::new();
    console
        .expect_call()
        .times(1)
        .returning(|_| Ok(fixtures::status_page("True")));
    let server = server(console, true);

    assert_eq!(server.start(Duration::ZERO).expect("start"), StartOutcome::Skipped);
    assert_eq!(server.stop().expect("stop"), StopOutcome::Skipped);
}

#[test]
fn stopping_an_unstarted_server_is_a_no_op() {
    let mut console = MockConsole::new();
    console.expect_call().never();
    let server = server(console, false);

    assert_eq!(server.stop().expect("first stop"), StopOutcome::NotRunning);
    assert_eq!(server.stop().expect("second stop"), StopOutcome::NotRunning);
}

#[test]
fn unreachable_console_reads_as_not_ready() {
    let mut console = MockConsole::new();
    console.expect_call().returning(|_| Err(unreachable()));
    assert!(!server(console, false).is_ready());
}

#[rstest]
#[case::confirmed(fixtures::success_page(), true)]
#[case::declined(fixtures::failure_page(), false)]
fn deploy_reports_console_verdict(#[case] body: String, #[case] expected: bool) {
    let mut console = MockConsole::new();
    console
        .expect_call()
        .withf(|request| {
            request.method() == Some("redeploy")
                && request.param("argType") == Some("java.net.URL")
                && request.param("arg0") == Some(APP)
        })
        .times(1)
        .returning(move |_| Ok(body.clone()));
    let server = server(console, false);

    let report = server.deploy(&artifact()).expect("deploy");

    assert_eq!(report.action, DeploymentAction::Deploy);
    assert_eq!(report.succeeded, expected);
    assert_eq!(report.artifact, artifact());
}

#[test]
fn redeploying_after_undeploy_issues_every_call() {
    let mut console = MockConsole::new();
    let mut sequence = Sequence::new();
    for method in ["redeploy", "undeploy", "redeploy"] {
        console
            .expect_call()
            .withf(move |request| request.method() == Some(method))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(fixtures::success_page()));
    }
    let server = server(console, false);

    assert!(server.deploy(&artifact()).expect("deploy").succeeded);
    assert!(server.undeploy(&artifact()).expect("undeploy").succeeded);
    assert!(server.deploy(&artifact()).expect("redeploy").succeeded);
}

#[test]
fn deploy_propagates_transport_failures() {
    let mut console = MockConsole::new();
    console.expect_call().returning(|_| Err(unreachable()));
    let server = server(console, false);

    let error = server.deploy(&artifact()).expect_err("deploy must fail");

    assert!(matches!(error, LifecycleError::Control(ref control) if control.is_transport()));
}

#[test]
fn zero_wait_returns_launched_pid() {
    let mut console = MockConsole::new();
    console
        .expect_call()
        .returning(|request| {
            if is_shutdown(request) {
                Ok(fixtures::failure_page())
            } else {
                Ok(fixtures::status_page("False"))
            }
        });
    let server = Server::new(
        ServerSettings {
            poll_interval: Duration::from_secs(5),
            ..settings(sleeper(), false)
        },
        console,
    );

    let started = Instant::now();
    let outcome = server.start(Duration::ZERO).expect("start");
    let waited = started.elapsed();
    let pid = server.pid().expect("launched");

    assert_eq!(outcome, StartOutcome::Launched { pid });
    assert!(waited < Duration::from_secs(1), "zero wait blocked for {waited:?}");
    assert_eq!(server.stop().expect("stop"), StopOutcome::Forced { pid });
}

#[test]
fn waits_for_started_attribute() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let mut console = MockConsole::new();
    console.expect_call().returning(move |request| {
        if is_shutdown(request) {
            return Err(unreachable());
        }
        // The first call is the pre-launch check.
        let call = counter.fetch_add(1, Ordering::SeqCst);
        let value = if call >= 3 { "True" } else { "False" };
        Ok(fixtures::status_page(value))
    });
    let server = server(console, false);

    let outcome = server.start(Duration::from_secs(5)).expect("start");
    let pid = server.pid().expect("launched");

    assert!(matches!(outcome, StartOutcome::Ready { pid: ready, .. } if ready == pid));
    assert_eq!(polls.load(Ordering::SeqCst), 4);
    assert_eq!(server.stop().expect("stop"), StopOutcome::Forced { pid });
}

#[test]
fn failed_start_stops_the_launched_process() {
    let mut console = MockConsole::new();
    console
        .expect_call()
        .returning(|_| Ok(fixtures::status_page("False")));
    let server = server(console, false);

    let error = server
        .start(Duration::from_millis(150))
        .expect_err("server never becomes ready");

    assert!(matches!(error, LifecycleError::StartupTimeout { .. }));
    assert_eq!(server.pid(), None, "launched process must be cleaned up");
    assert_eq!(server.stop().expect("stop"), StopOutcome::NotRunning);
}

#[test]
fn clean_shutdown_reports_stopped() {
    let mut console = MockConsole::new();
    console.expect_call().returning(|request| {
        if is_shutdown(request) {
            Ok(fixtures::success_page())
        } else {
            Ok(fixtures::status_page("False"))
        }
    });
    let command = LaunchCommand::new("sh").arg("-c").arg("sleep 0.3");
    let server = Server::new(settings(command, false), console);

    server.start(Duration::ZERO).expect("start");
    let pid = server.pid().expect("launched");

    assert_eq!(server.stop().expect("stop"), StopOutcome::Stopped { pid });
    assert_eq!(server.stop().expect("second stop"), StopOutcome::NotRunning);
}

#[test]
fn missing_launcher_is_reported() {
    let mut console = MockConsole::new();
    console
        .expect_call()
        .returning(|_| Ok(fixtures::status_page("False")));
    let command = LaunchCommand::new("/nonexistent/run.sh");
    let server = Server::new(settings(command, false), console);

    let error = server.start(Duration::ZERO).expect_err("launch must fail");

    assert!(matches!(error, LifecycleError::Launch { .. }));
}
