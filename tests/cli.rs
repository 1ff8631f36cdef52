//! Integration tests for the scopeline CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use scopeline::testing::fixtures;
use std::fs;
use tempfile::TempDir;

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn no_arguments_shows_usage_and_fails() {
    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn tokenizes_a_file_as_json() {
    let dir = TempDir::new().unwrap();
    let grammar = write_fixture(&dir, "grammar.json", fixtures::KEYWORD);
    let input = write_fixture(&dir, "input.demo", "int x;\nplain\n");

    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.arg(&grammar).arg(&input).arg("--format").arg("token-json");

    let assert = cmd.assert().success().stdout(predicate::str::contains("keyword"));

    // The output must be well-formed JSON with one record per line.
    let output = assert.get_output().stdout.clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[test]
fn scope_table_joins_scope_paths() {
    let dir = TempDir::new().unwrap();
    let grammar = write_fixture(&dir, "grammar.json", fixtures::C_LIKE);
    let input = write_fixture(&dir, "input.demo", "/* TODO */\n");

    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.arg(&grammar).arg(&input).arg("--format").arg("scope-table");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("comment.block > keyword.todo"));
}

#[test]
fn token_simple_prints_one_token_per_line() {
    let dir = TempDir::new().unwrap();
    let grammar = write_fixture(&dir, "grammar.json", fixtures::KEYWORD);
    let input = write_fixture(&dir, "input.demo", "int x;\n");

    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.arg(&grammar).arg(&input).arg("--format").arg("token-simple");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0:0-3 keyword \"int\""));
}

#[test]
fn broken_grammar_is_a_load_time_error() {
    let dir = TempDir::new().unwrap();
    let grammar = write_fixture(&dir, "grammar.json", "{ this is not a grammar");
    let input = write_fixture(&dir, "input.demo", "int x;\n");

    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.arg(&grammar).arg(&input);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed parsing grammar"));
}

#[test]
fn unknown_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    let grammar = write_fixture(&dir, "grammar.json", fixtures::KEYWORD);
    let input = write_fixture(&dir, "input.demo", "int x;\n");

    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.arg(&grammar).arg(&input).arg("--format").arg("nonsense");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn multiline_comment_threads_state_between_lines() {
    let dir = TempDir::new().unwrap();
    let grammar = write_fixture(&dir, "grammar.json", fixtures::BLOCK_COMMENT);
    let input = write_fixture(&dir, "input.demo", "/* first\nsecond */ tail\n");

    let mut cmd = Command::cargo_bin("scopeline").unwrap();
    cmd.arg(&grammar).arg(&input).arg("--format").arg("token-simple");

    cmd.assert()
        .success()
        // Line 1 stays inside the comment that line 0 opened.
        .stdout(predicate::str::contains("1:0-9 comment \"second */\""));
}
