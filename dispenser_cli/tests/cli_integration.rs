use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_schedule(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("schedule.toml");
    fs::write(&path, body).unwrap();
    path
}

const VALID_SCHEDULE: &str = r#"
[[dose]]
day = "monday"
meal = "breakfast"
timing = "before"
hour = 8
minute = 0

[[dose]]
day = "monday"
meal = "breakfast"
timing = "after"
hour = 9
minute = 30
"#;

#[rstest]
fn help_prints_usage() {
    Command::cargo_bin("dispenser_cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[rstest]
fn self_check_prints_ok() {
    // Without the `hardware` feature the CLI drives simulated devices.
    Command::cargo_bin("dispenser_cli")
        .unwrap()
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[rstest]
fn schedule_command_prints_physical_addressing() {
    let dir = tempdir().unwrap();
    let schedule = write_schedule(&dir, VALID_SCHEDULE);

    Command::cargo_bin("dispenser_cli")
        .unwrap()
        .arg("--schedule")
        .arg(&schedule)
        .arg("schedule")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 configured dose(s)"))
        .stdout(predicate::str::contains("compartment 0 actuator A"))
        .stdout(predicate::str::contains("compartment 0 actuator B"));
}

#[rstest]
#[case("hour = 24", "out of range")]
#[case("hour = 8", "duplicate")]
fn schedule_command_rejects_invalid_documents(#[case] hour_line: &str, #[case] needle: &str) {
    // Two breakfast-before entries for the same day: the second is either
    // out of range or a duplicate depending on the case.
    let body = format!(
        r#"
[[dose]]
day = "monday"
meal = "breakfast"
timing = "before"
hour = 8
minute = 0

[[dose]]
day = "monday"
meal = "breakfast"
timing = "before"
{hour_line}
minute = 0
"#
    );
    let dir = tempdir().unwrap();
    let schedule = write_schedule(&dir, &body);

    Command::cargo_bin("dispenser_cli")
        .unwrap()
        .arg("--schedule")
        .arg(&schedule)
        .arg("schedule")
        .assert()
        .failure()
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn run_executes_bounded_ticks_in_sim_mode() {
    let dir = tempdir().unwrap();
    let schedule = write_schedule(&dir, VALID_SCHEDULE);
    let event_log = dir.path().join("events.log");

    Command::cargo_bin("dispenser_cli")
        .unwrap()
        .arg("--schedule")
        .arg(&schedule)
        .arg("run")
        .arg("--tick-ms")
        .arg("10")
        .arg("--max-ticks")
        .arg("3")
        .arg("--event-log")
        .arg(&event_log)
        .assert()
        .success();
}

#[rstest]
fn missing_schedule_file_fails_with_context() {
    Command::cargo_bin("dispenser_cli")
        .unwrap()
        .arg("--schedule")
        .arg("does/not/exist.toml")
        .arg("schedule")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does/not/exist.toml"));
}
