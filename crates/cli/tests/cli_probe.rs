use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use tempfile::tempdir;

fn write_kernel_image(dir: &Path) -> PathBuf {
    let mut image = vec![0u8; 1024];
    image[510..512].copy_from_slice(&0xAA55u16.to_le_bytes());
    image[514..518].copy_from_slice(b"HdrS");
    let path = dir.join("vmlinuz");
    fs::write(&path, image).expect("write image");
    path
}

/// A kernel boot image is described by the built-in rules.
#[test]
fn probe_reports_kernel_image() {
    let dir = tempdir().expect("tempdir");
    let image = write_kernel_image(dir.path());

    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Linux kernel x86 boot executable"))
        .stdout(predicate::str::starts_with(format!("file {} is type", image.display())));
}

/// Files no rule recognizes are reported as data.
#[test]
fn probe_reports_data_for_unknown_content() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("blob.bin");
    fs::write(&path, [0u8; 64]).expect("write blob");

    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::ends_with("is type data\n"));
}

#[test]
fn json_output_carries_group_and_messages() {
    let dir = tempdir().expect("tempdir");
    let image = write_kernel_image(dir.path());

    let output = assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg("--json")
        .arg(&image)
        .output()
        .expect("run filemagic");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["group"], "kernel");
    assert_eq!(value["messages"][0], "Linux kernel");
}

#[test]
fn json_output_is_null_without_match() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty");
    fs::write(&path, b"").expect("write empty");

    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg("--json")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));
}

#[test]
fn extra_magic_files_are_probed() {
    let dir = tempdir().expect("tempdir");
    let magic = dir.path().join("custom.magic");
    fs::write(&magic, "0 string RIFF RIFF data\n>8 string WAVE \\b, WAVE audio\n")
        .expect("write magic");
    let target = dir.path().join("sound.wav");
    fs::write(&target, b"RIFF\x24\x00\x00\x00WAVEfmt ").expect("write target");

    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg("--no-builtin")
        .arg("--magic")
        .arg(&magic)
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("is type RIFF data, WAVE audio"));
}

#[test]
fn config_file_supplies_magic_files() {
    let dir = tempdir().expect("tempdir");
    let magic = dir.path().join("custom.magic");
    fs::write(&magic, "0 string PK zip archive\n").expect("write magic");
    let config = dir.path().join("filemagic.json");
    let body = serde_json::json!({ "include_builtin": false, "magic_files": [magic] });
    fs::write(&config, body.to_string()).expect("write config");
    let target = dir.path().join("bundle.zip");
    fs::write(&target, b"PK\x03\x04").expect("write target");

    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg("--config")
        .arg(&config)
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("is type zip archive"));
}

#[test]
fn missing_file_fails() {
    let dir = tempdir().expect("tempdir");
    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open file"));
}

#[test]
fn no_rules_at_all_fails() {
    let dir = tempdir().expect("tempdir");
    let image = write_kernel_image(dir.path());
    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg("--no-builtin")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No magic rules configured"));
}

#[test]
fn malformed_magic_file_fails_with_line() {
    let dir = tempdir().expect("tempdir");
    let magic = dir.path().join("broken.magic");
    fs::write(&magic, "0 lenumber 5 foo\n").expect("write magic");
    let image = write_kernel_image(dir.path());

    assert_cmd::cargo::cargo_bin_cmd!("filemagic")
        .arg("--magic")
        .arg(&magic)
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to compile magic rules"))
        .stderr(predicate::str::contains("lenumber"));
}
