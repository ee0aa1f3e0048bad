//! Commands that run without network access

use assert_cmd::Command;
use predicates::prelude::*;

fn ecotoxfred() -> Command {
    let mut cmd = Command::cargo_bin("ecotoxfred").unwrap();
    cmd.env_remove("ECOTOXFRED_PROMPTS_DIR");
    cmd
}

#[test]
fn tools_lists_the_catalog() {
    ecotoxfred()
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("CypherSearch"))
        .stdout(predicate::str::contains("GeographicMap"))
        .stdout(predicate::str::contains("Wikipedia"));
}

#[test]
fn prompt_general_keeps_only_the_question_open() {
    ecotoxfred()
        .args(["prompt", "general"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{question}"))
        .stdout(predicate::str::contains("{meta}").not())
        .stdout(predicate::str::contains("MEASURED_AT"));
}

#[test]
fn prompt_map_includes_the_required_columns() {
    ecotoxfred()
        .args(["prompt", "map"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SiteName"))
        .stdout(predicate::str::contains("Lat"));
}

#[test]
fn prompt_with_missing_directory_fails() {
    ecotoxfred()
        .args(["--prompts-dir", "/nonexistent/prompts", "prompt", "agent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("basic_intro"));
}

#[test]
fn unknown_prompt_kind_is_rejected() {
    ecotoxfred()
        .args(["prompt", "weather"])
        .assert()
        .failure();
}
