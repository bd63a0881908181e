//! E2E tests for the hkimport command line

use assert_cmd::Command;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A command with its settings and history kept in a fresh temp dir
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Workspace {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    fn settings(&self) -> PathBuf {
        self.dir.path().join("settings.json")
    }

    fn history(&self) -> PathBuf {
        self.dir.path().join("history.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_hkimport"));
        cmd.arg("--settings")
            .arg(self.settings())
            .arg("--history")
            .arg(self.history());
        cmd
    }
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("run hkimport");
    assert!(output.status.success(), "Command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn amount(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => s.parse().expect("decimal string"),
        other => other.to_string().parse().expect("decimal number"),
    }
}

#[test]
fn tax_table_for_prp() {
    Workspace::new()
        .cmd()
        .args(["tax", "--prp", "350000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total FRT: HK$255,500"))
        .stdout(predicate::str::contains("above HK$500,000"))
        .stdout(predicate::str::contains("115%"));
}

#[test]
fn tax_json_keeps_cents() {
    let json = json_stdout(Workspace::new().cmd().args(["tax", "--prp", "150000.01", "--json"]));
    assert_eq!(amount(&json["total"]), dec!(69000.0086));
    assert_eq!(json["tiers"].as_array().map(Vec::len), Some(4));
}

#[test]
fn estimate_japan_with_defaults() {
    Workspace::new()
        .cmd()
        .args([
            "estimate",
            "--country",
            "jp",
            "--price",
            "1,500,000",
            "--prp",
            "350000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("¥1,500,000"))
        .stdout(predicate::str::contains("HK$79,500"))
        .stdout(predicate::str::contains("HK$6,360"))
        .stdout(predicate::str::contains("HK$255,500"))
        .stdout(predicate::str::contains("HK$351,860"))
        .stdout(predicate::str::contains("HK$359,160"));
}

#[test]
fn estimate_json_breakdown() {
    let json = json_stdout(Workspace::new().cmd().args([
        "estimate",
        "--input",
        "tests/data/request_jp.json",
        "--json",
    ]));
    let breakdown = &json["breakdown"];
    assert_eq!(amount(&breakdown["car_price_hkd"]), dec!(79500));
    assert_eq!(amount(&breakdown["origin_fees_total_hkd"]), dec!(6360));
    assert_eq!(amount(&breakdown["registration_tax"]), dec!(255500));
    assert_eq!(amount(&breakdown["landed_cost"]), dec!(351860));
    assert_eq!(amount(&breakdown["total_cost"]), dec!(359160));
    assert_eq!(json["car"]["model"], "Alphard");
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(0));
}

#[test]
fn estimate_from_stdin() {
    let request = fs::read_to_string("tests/data/request_jp.json").unwrap();
    Workspace::new()
        .cmd()
        .args(["estimate", "--input", "-"])
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains("Toyota Alphard (2019)"))
        .stdout(predicate::str::contains("HK$359,160"));
}

#[test]
fn estimate_needs_a_country() {
    Workspace::new()
        .cmd()
        .args(["estimate", "--price", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--country"));
}

#[test]
fn fee_override_applies_to_one_estimate_only() {
    let ws = Workspace::new();
    let json = json_stdout(ws.cmd().args([
        "estimate",
        "--input",
        "tests/data/request_jp.json",
        "--fee",
        "local_misc.parts=4000",
        "--json",
    ]));
    assert_eq!(amount(&json["breakdown"]["local_misc_total_hkd"]), dec!(11500));
    assert_eq!(amount(&json["breakdown"]["total_cost"]), dec!(360160));

    let json = json_stdout(ws.cmd().args(["settings", "show", "--json"]));
    assert_eq!(amount(&json["fees"]["JP"]["local_misc"]["parts"]["value"]), dec!(3000));
}

#[test]
fn bad_amounts_count_as_zero_with_warnings() {
    let json = json_stdout(Workspace::new().cmd().args([
        "estimate",
        "--input",
        "tests/data/request_bad.json",
        "--json",
    ]));
    assert_eq!(amount(&json["breakdown"]["landed_cost"]), Decimal::ZERO);
    assert_eq!(amount(&json["breakdown"]["total_cost"]), dec!(5800));
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(4));
}

#[test]
fn save_then_list_export_and_verify() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["estimate", "--input", "tests/data/request_jp.json", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved estimate"));

    ws.cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Toyota Alphard (2019)"))
        .stdout(predicate::str::contains("HK$359,160"));

    ws.cmd()
        .args(["history", "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,created_at,country,make"))
        .stdout(predicate::str::contains("AGH30"))
        .stdout(predicate::str::contains(",359160"));

    ws.cmd()
        .args(["history", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recompute exactly"));
}

#[test]
fn saved_estimate_ignores_later_rate_changes() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["estimate", "--input", "tests/data/request_jp.json", "--save"])
        .assert()
        .success();
    ws.cmd()
        .args(["settings", "set-rate", "jp", "0.06"])
        .assert()
        .success();

    let json = json_stdout(ws.cmd().args(["history", "--json"]));
    let records = json.as_array().expect("array");
    assert_eq!(records.len(), 1);
    assert_eq!(amount(&records[0]["breakdown"]["total_cost"]), dec!(359160));

    ws.cmd().args(["history", "--verify"]).assert().success();
}

#[test]
fn saved_estimate_ignores_later_frt_changes() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["estimate", "--input", "tests/data/request_jp.json", "--save"])
        .assert()
        .success();
    fs::write(
        ws.settings(),
        r#"{ "frt": { "brackets": [{ "width": 150000, "rate": 0.5 }], "top_rate": 1.4 } }"#,
    )
    .unwrap();

    let json = json_stdout(ws.cmd().args(["tax", "--prp", "350000", "--json"]));
    assert_eq!(amount(&json["total"]), dec!(355000));

    ws.cmd()
        .args(["history", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recompute exactly"));
}

#[test]
fn zero_estimate_is_not_saved() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["estimate", "--input", "tests/data/request_empty.json", "--save"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Estimate not saved"));
    assert!(!ws.history().exists());
}

#[test]
fn delete_saved_estimate() {
    let ws = Workspace::new();
    let json = json_stdout(ws.cmd().args([
        "estimate",
        "--input",
        "tests/data/request_jp.json",
        "--save",
        "--json",
    ]));
    let id = json["saved_id"].as_i64().expect("saved id").to_string();

    ws.cmd()
        .args(["history", "--delete", id.as_str()])
        .assert()
        .success();
    ws.cmd()
        .args(["history", "--delete", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved estimate"));
    ws.cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved estimates"));
}

#[test]
fn settings_rate_edit_feeds_new_estimates() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["settings", "set-rate", "JP", "0.05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("JP exchange rate set to 0.05"));

    let json = json_stdout(ws.cmd().args([
        "estimate", "--country", "jp", "--price", "1000000", "--json",
    ]));
    assert_eq!(amount(&json["breakdown"]["car_price_hkd"]), dec!(50000));
}

#[test]
fn settings_reject_bad_edits() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["settings", "set-rate", "uk", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a number"));
    ws.cmd()
        .args(["settings", "set-fee", "jp", "origin", "freight", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fee: origin.freight"));
    ws.cmd()
        .args(["settings", "set-fee", "de", "local_misc", "parts", "-10"])
        .assert()
        .failure();
    assert!(!ws.settings().exists());
}

#[test]
fn settings_fee_edit_and_reset() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["settings", "set-fee", "uk", "origin", "shipping", "1,800"])
        .assert()
        .success();
    let json = json_stdout(ws.cmd().args(["settings", "show", "--json"]));
    assert_eq!(json["fees"]["UK"]["origin"]["shipping"]["value"], "1,800");

    ws.cmd().args(["settings", "reset"]).assert().success();
    let json = json_stdout(ws.cmd().args(["settings", "show", "--json"]));
    assert_eq!(amount(&json["fees"]["UK"]["origin"]["shipping"]["value"]), dec!(1500));
}

#[test]
fn settings_show_tables() {
    Workspace::new()
        .cmd()
        .arg("settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXCHANGE RATES"))
        .stdout(predicate::str::contains("DEFAULT FEES: Germany (EUR)"))
        .stdout(predicate::str::contains("HK$300,000 - HK$500,000"));
}

#[test]
fn legacy_combined_settings() {
    let ws = Workspace::new();
    fs::copy("tests/data/settings_legacy.json", ws.settings()).unwrap();

    let json = json_stdout(ws.cmd().args([
        "estimate", "--country", "jp", "--price", "1000000", "--prp", "100000", "--json",
    ]));
    let breakdown = &json["breakdown"];
    assert_eq!(amount(&breakdown["origin_fees_total_hkd"]), dec!(6000));
    assert_eq!(amount(&breakdown["local_misc_total_hkd"]), dec!(7800));
    assert_eq!(amount(&breakdown["license_fees_total_hkd"]), Decimal::ZERO);
    assert_eq!(amount(&breakdown["total_cost"]), dec!(109800));

    ws.cmd()
        .args(["settings", "set-fee", "jp", "local_license", "insurance", "1500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no local_license bucket"));
}

#[test]
fn validate_reports_coerced_amounts() {
    Workspace::new()
        .cmd()
        .args(["validate", "--input", "tests/data/request_bad.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("4 issue(s) found"))
        .stdout(predicate::str::contains("[NegativeClamped] car_price"))
        .stdout(predicate::str::contains("[UnparsableAmount] origin.shipping"));
}

#[test]
fn validate_clean_request() {
    Workspace::new()
        .cmd()
        .args(["validate", "--input", "tests/data/request_jp.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn validate_json_output() {
    let output = Workspace::new()
        .cmd()
        .args(["validate", "--input", "tests/data/request_bad.json", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["warning_count"], 4);
    assert_eq!(json["warnings"][0]["type"], "NegativeClamped");
    assert_eq!(json["warnings"][0]["field"], "car_price");
}

#[test]
fn schema_outputs() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["schema", "json-schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"EstimateRequest\""));
    ws.cmd()
        .args(["schema", "settings-schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Configuration\""));
    ws.cmd()
        .args(["schema", "csv-header"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,created_at,country"));
    ws.cmd()
        .args(["schema", "csv-fields"])
        .assert()
        .success()
        .stdout(predicate::str::contains("First Registration Tax in HKD"));
}
