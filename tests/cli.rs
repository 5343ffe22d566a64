mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{SHOE_EXPORT, TestWorkspace};

fn binary() -> Command {
    Command::cargo_bin("stock-query").expect("binary under test")
}

#[test]
fn roles_subcommand_prints_inferred_assignments() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("export.csv", SHOE_EXPORT);
    binary()
        .arg("roles")
        .arg("-i")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"code\": 0"))
        .stdout(predicate::str::contains("\"quantity\": 5"));
}

#[test]
fn query_subcommand_prints_a_json_product() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("export.csv", SHOE_EXPORT);
    binary()
        .arg("query")
        .arg("-i")
        .arg(&path)
        .arg("100000089")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"product\""))
        .stdout(predicate::str::contains("\"stock_total\": 3"));
}

#[test]
fn query_subcommand_reports_missing_export_as_error() {
    binary()
        .arg("query")
        .arg("-i")
        .arg("/no/such/export.csv")
        .arg("zapatilla")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn suggest_subcommand_completes_prefixes() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("export.csv", SHOE_EXPORT);
    binary()
        .arg("suggest")
        .arg("-i")
        .arg(&path)
        .arg("zapa")
        .assert()
        .success()
        .stdout(predicate::str::contains("zapatilla"));
}
