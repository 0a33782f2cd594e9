use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn cnf_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn purity() -> Command {
    let mut cmd = Command::cargo_bin("purity").unwrap();
    cmd.env_remove("PURITY_MAX_VARIABLES")
        .env_remove("PURITY_BACKTRACK")
        .env("RUST_LOG", "off");
    cmd
}

fn run_cnf(content: &str, expected: &str) {
    let file = cnf_file(content);
    for backtrack in &["copy", "trail"] {
        purity()
            .env("PURITY_BACKTRACK", backtrack)
            .arg(file.path())
            .assert()
            .success()
            .stdout(format!("{}\n", expected));
    }
}

#[test]
fn single_unit() {
    run_cnf("p cnf 1 1\n1 0\n", "v 1 0");
}

#[test]
fn propagation_chain() {
    run_cnf("p cnf 2 2\n1 2 0\n-1 0\n", "v -1 2 0");
}

#[test]
fn complementary_units() {
    run_cnf("p cnf 2 2\n1 0\n-1 0\n", "UNSAT");
}

#[test]
fn pure_literal() {
    run_cnf("p cnf 2 2\n1 2 0\n1 -2 0\n", "v 1 2 0");
}

#[test]
fn comments_and_free_variables() {
    run_cnf("c header comment\nc another one\np cnf 4 1\n-3 0\n", "v 1 2 -3 4 0");
}

#[test]
fn pigeonhole_file() {
    purity()
        .arg("testcases/pigeonhole/ph3.cnf")
        .assert()
        .success()
        .stdout("UNSAT\n");
}

#[test]
fn too_many_variables() {
    let file = cnf_file("p cnf 1501 1\n1 0\n");
    purity()
        .arg(file.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Too many variables"))
        .stdout(predicate::str::starts_with("v").not());
}

#[test]
fn raised_capacity() {
    let file = cnf_file("p cnf 1501 1\n1501 0\n");
    purity()
        .env("PURITY_MAX_VARIABLES", "2000")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("v 1 2 3 "))
        .stdout(predicate::str::ends_with(" 1501 0\n"));
}

#[test]
fn invalid_capacity_setting() {
    let file = cnf_file("p cnf 1 1\n1 0\n");
    purity()
        .env("PURITY_MAX_VARIABLES", "many")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PURITY_MAX_VARIABLES"));
}

#[test]
fn missing_argument() {
    purity()
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn extra_argument() {
    purity()
        .args(&["a.cnf", "b.cnf"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn unreadable_file() {
    purity()
        .arg("testcases/does_not_exist.cnf")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot open file"))
        .stderr(predicate::str::contains("Caused by:"));
}

#[test]
fn unknown_leading_letter() {
    let file = cnf_file("c fine\nq what\np cnf 1 1\n1 0\n");
    purity()
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown letter at line 2"));
}
