use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn dbkey(roaming: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dbkey").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--roaming-dir")
        .arg(roaming)
        .arg("--local-dir")
        .arg(roaming.join("local"));
    cmd
}

fn write_config(root: &Path, wrapped: &[u8]) {
    let app = root.join("Signal");
    fs::create_dir_all(&app).unwrap();
    let config = serde_json::json!({ "encryptedKey": hex::encode(wrapped) });
    fs::write(app.join("config.json"), config.to_string()).unwrap();
}

fn write_local_state(root: &Path, encrypted_key_b64: &str) {
    let app = root.join("Signal");
    fs::create_dir_all(&app).unwrap();
    let state = serde_json::json!({ "os_crypt": { "encrypted_key": encrypted_key_b64 } });
    fs::write(app.join("Local State"), state.to_string()).unwrap();
}

fn fake_wrapped(header: &[u8], ciphertext_len: usize) -> Vec<u8> {
    let mut wrapped = header.to_vec();
    wrapped.extend_from_slice(&[0x11; 12]);
    wrapped.extend(std::iter::repeat(0x22u8).take(ciphertext_len));
    wrapped.extend_from_slice(&[0x33; 16]);
    wrapped
}

#[test]
fn paths_reports_override_locations() {
    let dir = tempdir().unwrap();
    let output = dbkey(dir.path()).arg("paths").arg("--json").output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let expected_state = dir.path().join("Signal").join("Local State");
    let expected_config = dir.path().join("Signal").join("config.json");
    assert_eq!(value["local_state"], expected_state.display().to_string());
    assert_eq!(value["config"], expected_config.display().to_string());
}

#[test]
fn settings_file_changes_app_dir() {
    let dir = tempdir().unwrap();
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{"app_dir_name": "Signal Beta"}"#).unwrap();
    dbkey(dir.path())
        .arg("--settings")
        .arg(&settings)
        .arg("paths")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signal Beta"));
}

#[test]
fn inspect_describes_layout_without_decrypting() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), &fake_wrapped(b"v11", 64));
    dbkey(dir.path())
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains("version:     v11"))
        .stdout(predicate::str::contains(hex::encode([0x11u8; 12])))
        .stdout(predicate::str::contains("ciphertext:  64 bytes"))
        .stdout(predicate::str::contains("total:       95 bytes"));
}

#[test]
fn inspect_rejects_unknown_header_as_json_report() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), &fake_wrapped(b"v09", 64));
    let output = dbkey(dir.path())
        .arg("inspect")
        .arg("--json")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stage"], "unwrap_key");
    assert_eq!(report["kind"], "FormatError");
    assert!(report["message"]
        .as_str()
        .unwrap()
        .contains("unsupported header"));
}

#[test]
fn inspect_rejects_truncated_blob() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), b"v10short");
    dbkey(dir.path())
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("truncated wrapped key"))
        .stderr(predicate::str::contains("format problem"));
}

#[test]
fn extract_without_files_names_first_stage() {
    let dir = tempdir().unwrap();
    dbkey(dir.path())
        .arg("extract")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("read local state failed"))
        .stderr(predicate::str::contains("Kind:  IoError"));
}

#[test]
fn extract_rejects_blob_without_marker() {
    let dir = tempdir().unwrap();
    // base64 of "NOTDPAPIxxxx"
    write_local_state(dir.path(), "Tk9URFBBUEl4eHh4");
    write_config(dir.path(), &fake_wrapped(b"v10", 64));
    dbkey(dir.path())
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolve master key failed"))
        .stderr(predicate::str::contains("missing DPAPI marker"))
        .stderr(predicate::str::contains("Kind:  FormatError"));
}

#[cfg(not(windows))]
#[test]
fn extract_reports_missing_platform_protection() {
    let dir = tempdir().unwrap();
    // base64 of "DPAPIxxxx"
    write_local_state(dir.path(), "RFBBUEl4eHh4");
    write_config(dir.path(), &fake_wrapped(b"v10", 64));
    let output = dbkey(dir.path())
        .arg("extract")
        .arg("--json")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stage"], "resolve_master_key");
    assert_eq!(report["kind"], "PlatformProtectionError");
    assert!(report["hint"].as_str().unwrap().contains("same user"));
}

#[test]
fn default_log_level_reports_failed_stage() {
    let dir = tempdir().unwrap();
    dbkey(dir.path())
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("key extraction stopped"))
        .stderr(predicate::str::contains("read local state"));
}

#[test]
fn extract_rejects_non_utf8_local_state() {
    let dir = tempdir().unwrap();
    let app = dir.path().join("Signal");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("Local State"), b"{\xff\xfe}").unwrap();
    dbkey(dir.path())
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not UTF-8"))
        .stderr(predicate::str::contains("Kind:  FormatError"));
}
