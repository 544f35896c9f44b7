//! CLI-level tests that run the binary without touching host network state.

use assert_cmd::Command;
use predicates::prelude::*;

fn cask() -> Command {
    Command::cargo_bin("cask").expect("binary builds")
}

#[test]
fn help_lists_run_command() {
    cask()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"));
}

#[test]
fn run_without_command_fails() {
    cask().args(["run", "alpine"]).assert().failure();
}

#[test]
fn init_outside_launcher_reports_missing_parameter() {
    // The init role is only valid under the launcher's re-exec; invoked by
    // hand it must abort before touching anything, naming the absent key.
    cask()
        .arg("init")
        .env_remove("ROOTFS")
        .env_remove("CID")
        .env_remove("CIP")
        .env_remove("VETH")
        .env_remove("VOLUMES")
        .env_remove("CMD")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing container parameter"));
}

#[test]
fn images_lists_store_entries() {
    let temp = tempfile::tempdir().unwrap();
    let image_dir = temp.path().join("busybox");
    std::fs::create_dir_all(&image_dir).unwrap();
    std::fs::write(image_dir.join("layer.tar"), b"").unwrap();

    cask()
        .arg("images")
        .env("CASK_IMAGES_DIR", temp.path())
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("busybox"));
}

#[test]
fn images_with_empty_store_prints_nothing() {
    let temp = tempfile::tempdir().unwrap();

    cask()
        .arg("images")
        .env("CASK_IMAGES_DIR", temp.path())
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
