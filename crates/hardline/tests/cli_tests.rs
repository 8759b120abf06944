//! Integration tests for the hardline binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

use hardline::target::{
    Connection, Filesystem, InMemorySystem, InterfaceType, NetworkView, SecurityView, StorageView,
    SystemState, TargetSystem,
};
use hardline_common::{DiskSize, HardlinePaths};

fn hardline(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hardline").unwrap();
    cmd.env_remove("HARDLINE_SECURITY_POLICY")
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(root);
    cmd
}

fn write_state(dir: &TempDir) -> PathBuf {
    let state = SystemState {
        storage: Some(StorageView::new(vec![Filesystem::mounted(
            "/dev/mapper/root",
            "/",
            DiskSize::gib(40),
        )
        .encrypted()])),
        network: Some(NetworkView {
            connections: vec![Connection::new("wlan0", InterfaceType::Wireless, true)],
        }),
        security: Some(SecurityView::default()),
        ..SystemState::default()
    };
    let path = dir.path().join("system.json");
    fs::write(&path, serde_json::to_string_pretty(&state).unwrap()).unwrap();
    path
}

#[test]
fn lists_policies() {
    let root = tempdir().unwrap();
    hardline(root.path())
        .args(["policies", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "stig""#))
        .stdout(predicate::str::contains(r#""rules": 9"#));
}

#[test]
fn check_reports_failing_rules() {
    let root = tempdir().unwrap();
    let state = write_state(&root);

    hardline(root.path())
        .args(["check", "--policy", "stig", "--format", "json", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("SLES-15-040200"))
        .stdout(predicate::str::contains("Active wireless connections: wlan0"))
        .stdout(predicate::str::contains("SLES-15-010330").not());
}

#[test]
fn check_scope_filter() {
    let root = tempdir().unwrap();
    let state = write_state(&root);

    hardline(root.path())
        .args(["check", "--policy", "stig", "--scope", "network", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("SLES-15-010380"))
        .stdout(predicate::str::contains("SLES-15-040200").not());
}

#[test]
fn check_uses_environment_policy() {
    let root = tempdir().unwrap();
    let state = write_state(&root);

    hardline(root.path())
        .env("HARDLINE_SECURITY_POLICY", "STIG")
        .args(["check", "--format", "json", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("SLES-15-010220"));
}

#[test]
fn check_without_policy_fails() {
    let root = tempdir().unwrap();
    let state = write_state(&root);

    hardline(root.path())
        .args(["check", "--state"])
        .arg(&state)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No security policy is enabled"));
}

#[test]
fn fix_updates_state_file() {
    let root = tempdir().unwrap();
    let state = write_state(&root);

    hardline(root.path())
        .args(["fix", "--policy", "stig", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed 2 of"));

    let system = InMemorySystem::open(&state).unwrap();
    assert!(system.security().unwrap().firewall_enabled);
    assert_eq!(system.network().unwrap().active_wireless().count(), 0);
}

#[test]
fn write_persists_failing_rules() {
    let root = tempdir().unwrap();
    let state = write_state(&root);
    let paths = HardlinePaths::with_root(root.path());

    hardline(root.path())
        .args(["write", "--policy", "stig", "--action", "none", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy stig:"));

    let failed = fs::read_to_string(paths.failed_rules()).unwrap();
    assert!(failed.lines().any(|line| line == "SLES-15-010220"));
    assert!(failed.ends_with('\n'));
    assert!(!paths.ssg_apply_override().exists());
}

#[test]
fn write_imports_profile() {
    let root = tempdir().unwrap();
    let state = write_state(&root);
    let profile = root.path().join("profile.json");
    fs::write(
        &profile,
        r#"{"policy": "stig", "disabled_rules": ["SLES-15-010220", "CIS-1.1"]}"#,
    )
    .unwrap();

    hardline(root.path())
        .args(["write", "--state"])
        .arg(&state)
        .arg("--profile")
        .arg(&profile)
        .assert()
        .success();

    // Disabled rules still end up in the failing rules file
    let failed = fs::read_to_string(HardlinePaths::with_root(root.path()).failed_rules()).unwrap();
    assert!(failed.contains("SLES-15-010220\n"));
    assert!(!failed.contains("CIS-1.1"));
}

#[test]
fn write_without_policy_is_a_no_op() {
    let root = tempdir().unwrap();
    let state = write_state(&root);

    hardline(root.path())
        .args(["write", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("No security policy enabled"));

    assert!(!HardlinePaths::with_root(root.path()).failed_rules().exists());
}

#[test]
fn mode_from_command_line() {
    let root = tempdir().unwrap();

    hardline(root.path())
        .args(["mode", "--cmdline", "security=selinux selinux=1 enforcing=0"])
        .assert()
        .success()
        .stdout("Permissive\n");

    hardline(root.path())
        .args(["mode", "--cmdline", "quiet enforcing=1"])
        .assert()
        .success()
        .stdout("Disabled\n");
}

#[test]
fn mode_falls_back_to_configuration() {
    let root = tempdir().unwrap();
    let config = HardlinePaths::with_root(root.path()).lsm_config();
    fs::create_dir_all(config.parent().unwrap()).unwrap();
    fs::write(&config, "# SELinux configuration\nSELINUX=enforcing\nSELINUXTYPE=targeted\n").unwrap();

    hardline(root.path())
        .args(["mode", "--cmdline", "security=selinux selinux=1"])
        .assert()
        .success()
        .stdout("Enforcing\n");
}

#[test]
fn rejects_bad_scap_action() {
    let root = tempdir().unwrap();
    hardline(root.path())
        .args(["write", "--state", "system.json", "--action", "harden"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid SCAP action"));
}
