//! Config file error-message, atomic-save, and permission integration tests.

use assert_fs::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use toolbelt_core::{
    config::{self, Config, TempPlacement},
    ConfigError,
};

fn write_config(home: &assert_fs::TempDir, yaml: &str) {
    home.child(".toolbelt")
        .child("config.yaml")
        .write_str(yaml)
        .expect("write config");
}

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

#[rstest]
#[case("same_directory", TempPlacement::SameDirectory)]
#[case("system_temp", TempPlacement::SystemTemp)]
fn load_parses_unit_placements(#[case] raw: &str, #[case] expected: TempPlacement) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, &format!("buffer_size: 1024\ntemp_placement: {raw}\n"));

    let config = config::load_at(home.path()).expect("load");
    assert_eq!(config.buffer_size, 1024);
    assert_eq!(config.temp_placement, expected);
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, ": : corrupt : yaml : !!!\n  - broken: [unclosed");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "got: {err}");
}

#[test]
fn load_wrong_type_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, "buffer_size: huge\n");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_zero_buffer_size_is_invalid() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, "buffer_size: 0\n");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    assert!(err.to_string().contains("buffer_size"));
}

// ---------------------------------------------------------------------------
// 2. Save
// ---------------------------------------------------------------------------

#[test]
fn save_creates_file_and_cleans_up_tmp() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = config::save_at(home.path(), &Config::default()).expect("save");

    home.child(".toolbelt/config.yaml")
        .assert(predicate::path::exists());
    home.child(".toolbelt/config.yaml.tmp")
        .assert(predicate::path::missing());
    assert_eq!(path, config::config_path_at(home.path()));
}

#[test]
fn save_omits_unset_spool_limit() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &Config::default()).expect("save");

    home.child(".toolbelt/config.yaml")
        .assert(predicate::str::contains("buffer_size: 4096"))
        .assert(predicate::str::contains("spool_limit").not());
}

#[test]
#[cfg(unix)]
fn save_sets_restrictive_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = config::save_at(home.path(), &Config::default()).expect("save");

    let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(file_mode, 0o600, "config.yaml must be 0600");
    let dir_mode = fs::metadata(path.parent().unwrap())
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(dir_mode, 0o700, ".toolbelt/ must be 0700");
}

#[test]
fn save_overwrites_previous_config() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &Config::default()).expect("first save");

    let updated = Config {
        buffer_size: 8192,
        spool_limit: Some(4096),
        ..Config::default()
    };
    config::save_at(home.path(), &updated).expect("second save");
    assert_eq!(config::load_at(home.path()).expect("load"), updated);
}
