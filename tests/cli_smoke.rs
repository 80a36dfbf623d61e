use assert_cmd::Command;
use predicates::prelude::*;

fn trellis() -> Command {
    let mut cmd = Command::cargo_bin("trellis").expect("binary builds");
    cmd.env_remove("TRELLIS_SPREADSHEET_ID")
        .env_remove("TRELLIS_API_KEY")
        .env_remove("TRELLIS_RANGE")
        .env_remove("TRELLIS_CONFIG");
    cmd
}

#[test]
fn help_lists_the_core_commands() {
    trellis()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("board"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("task"));
}

#[test]
fn task_help_lists_mutations() {
    trellis()
        .args(["task", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("rm"));
}

#[test]
fn invalid_filter_is_a_user_error() {
    trellis()
        .args(["board", "--filter", "bogus"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid filter"));
}

#[test]
fn missing_sheet_id_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    trellis()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("spreadsheet_id"));
}

#[test]
fn json_errors_use_the_envelope() {
    let dir = tempfile::tempdir().unwrap();
    trellis()
        .current_dir(dir.path())
        .args(["--json", "fetch"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"schema_version\": \"trellis.v1\""))
        .stdout(predicate::str::contains("\"status\": \"error\""))
        .stdout(predicate::str::contains("\"kind\": \"user_error\""));
}

#[test]
fn explicit_missing_config_file_fails() {
    trellis()
        .args(["--config", "/nonexistent/trellis.toml", "fetch"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn malformed_config_file_is_an_operation_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("trellis.toml"), "not [valid").unwrap();
    trellis()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .code(4);
}
