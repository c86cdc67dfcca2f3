//! Daemon startup, admin-socket handling, and basic job/robot round trips
//! through the admin protocol.

use assert_cmd::cargo::CommandCargoExt;

use crate::prelude::*;

#[test]
#[serial]
fn daemon_creates_state_files_on_start() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    assert!(temp.admin_socket().exists(), "admin socket should exist after startup");
    assert!(temp.state_dir().join("casared.lock").exists(), "lock file should exist after startup");
    assert!(temp.state_dir().join("data").exists(), "storage dir should exist after startup");
}

#[test]
#[serial]
fn robot_list_is_empty_on_fresh_daemon() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    temp.cli().args(&["robot", "list"]).passes().stdout_has("no robots");
}

#[test]
#[serial]
fn schedule_list_is_empty_on_fresh_daemon() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    temp.cli().args(&["schedule", "list"]).passes().stdout_has("no schedules");
}

#[test]
#[serial]
fn job_get_reports_not_found_for_unknown_id() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    temp.cli().args(&["job", "get", "job_doesnotexist"]).passes().stdout_has("not found");
}

#[test]
#[serial]
fn schedule_create_then_appears_in_list() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    let created = temp
        .cli()
        .args(&["schedule", "create", "--name", "nightly-report", "--workflow", "workflow_missing", "--frequency", "daily"])
        .passes();
    assert!(created.stdout().contains("created"), "expected a created-schedule confirmation: {}", created.stdout());

    temp.cli().args(&["schedule", "list"]).passes().stdout_has("nightly-report");
}

#[test]
#[serial]
fn job_submit_against_unknown_workflow_fails_cleanly() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    // No workflow has been published, so submission must be rejected rather
    // than silently enqueueing a job with no definition to run.
    temp.cli()
        .args(&["job", "submit", "--workflow", "workflow_missing"])
        .passes()
        .stdout_has("error");
}

#[test]
#[serial]
fn json_format_emits_valid_json() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    let output = temp.cli().args(&["--format", "json", "robot", "list"]).passes();
    let parsed: serde_json::Value = serde_json::from_str(&output.stdout()).expect("--format json output should parse as JSON");
    assert_eq!(parsed["type"], "robots", "expected the robots response variant tag");
}

#[test]
#[serial]
fn second_daemon_refuses_to_start_while_first_holds_the_lock() {
    let temp = Harness::empty();
    let _daemon = temp.start_daemon();

    let second = std::process::Command::cargo_bin("casared")
        .expect("locate casared binary")
        .env("CASARE_STATE_DIR", temp.state_dir())
        .env("CASARE_WEBSOCKET_BIND", "127.0.0.1:18767")
        .env("CASARE_WEBHOOK_BIND", "127.0.0.1:18768")
        .output()
        .expect("run second casared");
    assert!(!second.status.success(), "a second daemon must not start while the lock is held");

    // The first daemon must still be reachable: the failed second instance
    // must not have deleted the socket or lock file out from under it.
    temp.cli().args(&["robot", "list"]).passes();
}
