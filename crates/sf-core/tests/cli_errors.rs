//! CLI error handling tests for scormify.
//!
//! These tests verify that invalid arguments and commands produce
//! appropriate error messages and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the scormify binary, isolated from user config.
fn scormify(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scormify").expect("scormify binary should exist");
    cmd.env_remove("SCORMIFY_CONFIG")
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("SCORMIFY_CONTENT_DIR", home.path().join("content"))
        .env("SCORMIFY_LIBRARY_DIR", home.path().join("libraries"));
    cmd
}

// ============================================================================
// Invalid Subcommand Tests
// ============================================================================

mod invalid_subcommand {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn missing_command_fails() {
        let home = TempDir::new().unwrap();
        scormify(&home).assert().failure();
    }
}

// ============================================================================
// Convert Argument Tests
// ============================================================================

mod convert_args {
    use super::*;

    #[test]
    fn missing_mastery_score_is_args_error() {
        let home = TempDir::new().unwrap();
        let input = home.path().join("course.h5p");
        std::fs::write(&input, b"irrelevant").unwrap();

        scormify(&home)
            .arg("convert")
            .arg(&input)
            .assert()
            .code(10)
            .stderr(predicate::str::contains("masteryScore is required"));

        assert!(!home.path().join("content").exists());
    }

    #[test]
    fn out_of_range_mastery_score_is_args_error() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args(["convert", "course.h5p", "--mastery-score", "150"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("between 0 and 100"));
    }

    #[test]
    fn restrict_without_width_is_args_error() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args([
                "convert",
                "course.h5p",
                "--mastery-score",
                "80",
                "--restrict-width-and-center",
            ])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("maxWidth"));
    }

    #[test]
    fn negative_margin_rejected_by_parser() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args(["convert", "course.h5p", "--mastery-score", "80", "--margin-x", "-4"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn undecodable_package_is_package_error() {
        let home = TempDir::new().unwrap();
        let input = home.path().join("broken.h5p");
        std::fs::write(&input, b"definitely not a zip").unwrap();

        scormify(&home)
            .current_dir(home.path())
            .arg("convert")
            .arg(&input)
            .args(["--mastery-score", "80"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("package cannot be decoded"));

        assert!(!home.path().join("broken.zip").exists());
    }

    #[test]
    fn missing_input_file_is_io_error() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args(["convert", "does-not-exist.h5p", "--mastery-score", "80"])
            .current_dir(home.path())
            .assert()
            .code(21);
    }

    #[test]
    fn unreadable_config_is_args_error() {
        let home = TempDir::new().unwrap();
        let config = home.path().join("scormify.toml");
        std::fs::write(&config, "[storage\n").unwrap();

        scormify(&home)
            .arg("--config")
            .arg(&config)
            .args(["convert", "course.h5p", "--mastery-score", "80"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("invalid config"));
    }
}

// ============================================================================
// Filename Command Tests
// ============================================================================

mod filename {
    use super::*;

    #[test]
    fn prints_sanitized_archive_name() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args(["filename", "--title", "Agamotto!", "--date", "2022-05-10"])
            .assert()
            .success()
            .stdout("Agamotto_v1.0.0_2022-05-10.zip\n");
    }

    #[test]
    fn custom_version() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args([
                "filename",
                "--title",
                "Ünïcode Quiz 2",
                "--version",
                "2.1.0",
                "--date",
                "2024-01-31",
            ])
            .assert()
            .success()
            .stdout("ncodeQuiz2_v2.1.0_2024-01-31.zip\n");
    }

    #[test]
    fn invalid_date_fails() {
        let home = TempDir::new().unwrap();
        scormify(&home)
            .args(["filename", "--title", "X", "--date", "10/05/2022"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn bash_completions_mention_subcommands() {
    let home = TempDir::new().unwrap();
    scormify(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filename"));
}
