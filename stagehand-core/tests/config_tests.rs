//! Config error-message, atomic-write-safety and validation integration tests.
//! Storage: ~/.stagehand/config.yaml

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rstest::rstest;
use stagehand_core::{
    config::{self, PublishConfig},
    ConfigError, Identity,
};
use std::fs;

fn sample(home: &assert_fs::TempDir) -> PublishConfig {
    PublishConfig::new(
        home.path().join("farm"),
        home.path().join("staging"),
        "artist",
    )
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
    assert!(err.to_string().contains("stagehand config init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".stagehand/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_missing_field_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".stagehand/config.yaml")
        .write_str("shared_root: /farm\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[rstest]
#[case("shared_root: farm\nstaging_root: /staging\nidentity: artist\n")]
#[case("shared_root: /farm\nstaging_root: staging\nidentity: artist\n")]
#[case("shared_root: /farm\nstaging_root: /staging\nidentity: ''\n")]
fn load_rejects_invalid_values(#[case] yaml: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".stagehand/config.yaml")
        .write_str(yaml)
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_cleans_up_tmp_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample(&home)).expect("save");

    home.child(".stagehand/config.yaml")
        .assert(predicate::path::exists());
    home.child(".stagehand/config.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample(&home)).expect("save");

    let path = config::config_path_at(home.path());
    let original = fs::read(&path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = path.with_file_name("config.yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    assert_eq!(fs::read(&path).expect("read after crash"), original);
    let loaded = config::load_at(home.path()).expect("load after crash");
    assert_eq!(loaded.identity, Identity::from("artist"));
}

#[test]
fn save_invalid_config_writes_nothing() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cfg = PublishConfig::new("relative/farm", "/staging", "artist");

    let err = config::save_at(home.path(), &cfg).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    home.child(".stagehand").assert(predicate::path::missing());
}

#[test]
fn saved_yaml_is_human_readable() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample(&home)).expect("save");

    home.child(".stagehand/config.yaml")
        .assert(predicate::str::contains("identity: artist"));
}
