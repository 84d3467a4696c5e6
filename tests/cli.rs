use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `tally` with HOME pointed at a scratch directory.
fn tally(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn init(home: &TempDir) {
    let data_dir = home.path().join("data");
    tally(home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn init_creates_settings_and_ledger() {
    let home = TempDir::new().unwrap();
    let data_dir = home.path().join("data");
    tally(&home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"schema_version\": 2"))
        .stdout(predicate::str::contains("\"credentials_configured\": false"));

    assert!(data_dir.join("tally.db").exists());
    assert!(home.path().join(".config/tally/settings.json").exists());
}

#[test]
fn snapshot_on_empty_ledger() {
    let home = TempDir::new().unwrap();
    tally(&home)
        .arg("snapshot")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_balance\": 0.0"))
        .stdout(predicate::str::contains("\"runway_months\": null"))
        .stdout(predicate::str::contains("\"trend\": \"stable\""));
}

#[test]
fn sync_without_credentials_is_a_configuration_error() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .arg("sync")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not set up"));
}

#[test]
fn budgets_set_list_and_status() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .args(["budgets", "set", "groceries", "--limit", "500"])
        .assert()
        .success();
    tally(&home)
        .args(["budgets", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tag\": \"groceries\""))
        .stdout(predicate::str::contains("\"alert_threshold\": 0.9"));
    tally(&home)
        .args(["budgets", "status", "--month", "2024-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"month\": \"2024-03\""))
        .stdout(predicate::str::contains("\"remaining\": 500.0"));
    tally(&home)
        .args(["budgets", "status", "--month", "March"])
        .assert()
        .code(2);
}

#[test]
fn invalid_rule_pattern_is_rejected() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .args(["rules", "add", "(unclosed", "--tag", "x"])
        .assert()
        .code(2);
    tally(&home)
        .args(["rules", "add", "starbucks", "--tag", "coffee", "--priority", "5"])
        .assert()
        .success();
    tally(&home)
        .args(["rules", "list", "--table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("starbucks"))
        .stdout(predicate::str::contains("coffee"));
}

#[test]
fn export_empty_ledger_is_header_only() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home).arg("export").assert().success().stdout(
        "transaction_id,account_id,date,name,merchant_name,amount,category,subcategory,tag,pending,payment_channel\n",
    );
}

#[test]
fn bad_date_filter_is_rejected() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .args(["transactions", "--from", "01/02/2024"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn search_on_empty_ledger() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .args(["search", "coffee"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 0"));
}

#[test]
fn items_list_hides_access_tokens() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .args(["items", "add", "item-1", "--access-token", "access-secret-token", "--institution", "Bank"])
        .assert()
        .success();
    tally(&home)
        .args(["items", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("item-1"))
        .stdout(predicate::str::contains("access-secret-token").not());
    tally(&home)
        .args(["items", "remove", "item-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sync_state_removed\": false"));
}

#[test]
fn malformed_settings_are_left_untouched() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config/tally");
    std::fs::create_dir_all(&config_dir).unwrap();
    let settings = config_dir.join("settings.json");
    let content = r#"{"client_id":"cid","secret":"sec","items":[{"item_id":"old","access_token":"access-old"}],}"#;
    std::fs::write(&settings, content).unwrap();

    tally(&home)
        .args(["items", "add", "new", "--access-token", "access-new"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("malformed settings"));
    tally(&home)
        .args(["init", "--client-id", "other"])
        .assert()
        .code(2);
    assert_eq!(std::fs::read_to_string(&settings).unwrap(), content);
}

#[test]
fn tagging_unknown_transaction_fails() {
    let home = TempDir::new().unwrap();
    init(&home);
    tally(&home)
        .args(["tag", "missing", "coffee"])
        .assert()
        .code(2);
}
