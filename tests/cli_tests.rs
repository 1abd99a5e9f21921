use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::net::TcpListener;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_requires_a_target() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("boar")?;
    cmd.env_remove("BOAR_PORT");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("No directory nor file provided"));
    Ok(())
}

#[test]
fn test_cli_missing_target_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("does-not-exist");

    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg(&missing);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Path not found"));
    Ok(())
}

#[test]
fn test_cli_occupied_port_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("report.pdf");
    std::fs::write(&file, vec![0u8; 2048])?;

    let occupied = TcpListener::bind("127.0.0.1:0")?;
    let port = occupied.local_addr()?.port();

    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg("--bind")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg(&file);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Failed to bind"));
    Ok(())
}

#[test]
fn test_cli_bad_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config = dir.path().join("boar.toml");
    std::fs::write(&config, "compression = \"lzma\"")?;

    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg("--config").arg(&config).arg(dir.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Invalid configuration"));

    // Nothing was archived before the config was rejected
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn test_cli_version_and_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg("-v");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("--nozip")
            .and(predicate::str::contains("--children"))
            .and(predicate::str::contains("BOAR_PORT")),
    );
    Ok(())
}

#[test]
fn test_cli_single_dash_nozip_disables_archiving() -> Result<(), Box<dyn std::error::Error>> {
    let share = tempdir()?;
    std::fs::write(share.path().join("a.txt"), "hello")?;
    let out = tempdir()?;
    let config = out.path().join("boar.toml");
    std::fs::write(
        &config,
        format!("archive_dir = {:?}\nkeep_archive = true\n", out.path().display().to_string()),
    )?;

    let occupied = TcpListener::bind("127.0.0.1:0")?;
    let port = occupied.local_addr()?.port();

    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg("-nz")
        .arg("--config")
        .arg(&config)
        .arg("--bind")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg(share.path());
    cmd.assert().failure().stdout(
        predicate::str::contains("Archiving disabled").and(predicate::str::contains("Failed to bind")),
    );

    // Only the config file, no archive
    assert_eq!(std::fs::read_dir(out.path())?.count(), 1);
    Ok(())
}

#[test]
fn test_cli_boolean_env_vars_accept_numeric_values() -> Result<(), Box<dyn std::error::Error>> {
    let share = tempdir()?;
    std::fs::create_dir(share.path().join("photos"))?;
    std::fs::write(share.path().join("photos/cat.jpg"), "meow")?;
    let out = tempdir()?;
    let config = out.path().join("boar.toml");
    std::fs::write(
        &config,
        format!("archive_dir = {:?}\nkeep_archive = true\n", out.path().display().to_string()),
    )?;

    let occupied = TcpListener::bind("127.0.0.1:0")?;
    let port = occupied.local_addr()?.port();

    // BOAR_NOZIP=1 wins over BOAR_CHILDREN=1
    let mut cmd = Command::cargo_bin("boar")?;
    cmd.env("BOAR_NOZIP", "1")
        .env("BOAR_CHILDREN", "1")
        .env("BOAR_PORT", port.to_string())
        .env("BOAR_BIND", "127.0.0.1")
        .arg("--config")
        .arg(&config)
        .arg(share.path());
    cmd.assert().failure().stdout(
        predicate::str::contains("Archiving disabled")
            .and(predicate::str::contains("Failed to bind"))
            .and(predicate::str::contains(format!(":{port}"))),
    );
    assert_eq!(std::fs::read_dir(out.path())?.count(), 1);

    // BOAR_CHILDREN=1 alone archives the directory and its subdirectory
    let mut cmd = Command::cargo_bin("boar")?;
    cmd.env_remove("BOAR_NOZIP")
        .env("BOAR_CHILDREN", "1")
        .env("BOAR_PORT", port.to_string())
        .env("BOAR_BIND", "127.0.0.1")
        .arg("--config")
        .arg(&config)
        .arg(share.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Failed to bind"));
    assert_eq!(std::fs::read_dir(out.path())?.count(), 3);

    // False-ish values leave the flags off
    let mut cmd = Command::cargo_bin("boar")?;
    cmd.env("BOAR_NOZIP", "0")
        .env("BOAR_CHILDREN", "no")
        .env("BOAR_PORT", port.to_string())
        .env("BOAR_BIND", "127.0.0.1")
        .arg("--config")
        .arg(&config)
        .arg(share.path());
    cmd.assert().failure().stdout(
        predicate::str::contains("Failed to bind")
            .and(predicate::str::contains("Archiving disabled").not()),
    );
    assert_eq!(std::fs::read_dir(out.path())?.count(), 4);
    Ok(())
}

#[test]
fn test_cli_reports_fatal_error_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("does-not-exist");

    let mut cmd = Command::cargo_bin("boar")?;
    cmd.arg(&missing);
    let output = cmd.output()?;
    assert!(!output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(stdout.matches("Path not found").count(), 1);
    assert!(!stderr.contains("Path not found"));
    assert!(!stderr.contains("Error:"));
    Ok(())
}
