use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn source_tree() -> Result<tempfile::TempDir, Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), b"hi")?;
    fs::create_dir(dir.path().join("sub"))?;
    fs::write(dir.path().join("sub/b.txt"), vec![0x42u8; 5000])?;
    fs::write(dir.path().join("empty.txt"), b"")?;
    Ok(dir)
}

#[test]
fn test_cli_pack_list_unpack_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let source = source_tree()?;
    let work = tempdir()?;
    let archive_path = work.path().join("cycle.arc");

    // 1. Pack: per-file progress and the empty-file skip go to stdout
    let mut cmd = Command::cargo_bin("pagearc-pack")?;
    cmd.arg(&archive_path)
        .arg(source.path())
        .arg("--name")
        .arg("cycle");
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("Writing")
                .and(predicate::str::contains("a.txt"))
                .and(predicate::str::contains("Skipping")),
        );
    assert_eq!(fs::metadata(&archive_path)?.len(), 4 * 4096);

    // 2. List
    let mut cmd = Command::cargo_bin("pagearc-unpack")?;
    cmd.arg(&archive_path).arg("--list");
    cmd.assert().success().stdout(
        predicate::str::contains("a.txt")
            .and(predicate::str::contains("sub/"))
            .and(predicate::str::contains("sub/b.txt")),
    );

    // 3. Unpack
    let dest = work.path().join("out");
    let mut cmd = Command::cargo_bin("pagearc-unpack")?;
    cmd.arg(&archive_path).arg(&dest);
    cmd.assert().success();

    assert_eq!(fs::read(dest.join("a.txt"))?, b"hi");
    assert_eq!(fs::read(dest.join("sub/b.txt"))?, vec![0x42u8; 5000]);
    assert!(!dest.join("empty.txt").exists());

    Ok(())
}

#[test]
fn test_cli_list_json() -> Result<(), Box<dyn std::error::Error>> {
    let source = source_tree()?;
    let work = tempdir()?;
    let archive_path = work.path().join("json.arc");

    Command::cargo_bin("pagearc-pack")?
        .arg(&archive_path)
        .arg(source.path())
        .assert()
        .success();

    let output = Command::cargo_bin("pagearc-unpack")?
        .arg(&archive_path)
        .arg("--list")
        .arg("--json")
        .output()?;
    assert!(output.status.success());

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let entries = listed.as_array().ok_or("expected a JSON array")?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["path"], "a.txt");
    assert_eq!(entries[0]["size"], 2);
    assert_eq!(entries[1]["is_dir"], true);
    assert_eq!(entries[2]["path"], "sub/b.txt");

    Ok(())
}

#[test]
fn test_cli_rejects_corrupt_archive() -> Result<(), Box<dyn std::error::Error>> {
    let work = tempdir()?;
    let archive_path = work.path().join("garbage.arc");
    fs::write(&archive_path, vec![0xAAu8; 5000])?;

    let mut cmd = Command::cargo_bin("pagearc-unpack")?;
    cmd.arg(&archive_path).arg(work.path().join("out"));
    cmd.assert()
        .failure()
        .stdout(predicate::str::starts_with("ERROR:").and(predicate::str::contains("signature")));

    Ok(())
}

#[test]
fn test_cli_rejects_empty_source() -> Result<(), Box<dyn std::error::Error>> {
    let source = tempdir()?;
    let work = tempdir()?;
    let archive_path = work.path().join("empty.arc");

    let mut cmd = Command::cargo_bin("pagearc-pack")?;
    cmd.arg(&archive_path).arg(source.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ERROR:"));
    assert!(!archive_path.exists());

    Ok(())
}

#[test]
fn test_cli_rejects_long_name() -> Result<(), Box<dyn std::error::Error>> {
    let source = tempdir()?;
    fs::write(source.path().join("z".repeat(50)), b"data")?;
    let work = tempdir()?;
    let archive_path = work.path().join("long.arc");

    let mut cmd = Command::cargo_bin("pagearc-pack")?;
    cmd.arg(&archive_path).arg(source.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("too long"));
    assert!(!archive_path.exists());

    Ok(())
}

#[test]
fn test_cli_unpack_requires_destination() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pagearc-unpack")?;
    cmd.arg("whatever.arc");
    cmd.assert().failure();
    Ok(())
}
