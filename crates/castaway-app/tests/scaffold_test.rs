// Checks on the files the scorer ships with.

use std::path::Path;

/// Verify that defaults/league.toml is valid TOML.
#[test]
fn league_toml_is_valid() {
    let content =
        std::fs::read_to_string("defaults/league.toml").expect("defaults/league.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "defaults/league.toml is not valid TOML: {:?}", parsed.err());
}

/// Verify that the sample snapshot is valid JSON.
#[test]
fn sample_snapshot_is_valid_json() {
    let content =
        std::fs::read_to_string("data/season.json").expect("data/season.json should exist");
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(&content);
    assert!(parsed.is_ok(), "data/season.json is not valid JSON: {:?}", parsed.err());
}

/// Verify that all expected directories exist.
#[test]
fn directory_structure_exists() {
    for dir in ["src", "defaults", "data", "tests"] {
        assert!(Path::new(dir).is_dir(), "expected directory {dir}/");
    }
}
