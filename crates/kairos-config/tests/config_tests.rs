use kairos_config::{build_engine, load_config, load_default_config, parse_config, ProviderConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.provider, ProviderConfig::Analytic);
    assert!(config.profiles.include_builtin);
    assert_eq!(config.engine.cache_capacity, 256);

    let engine = build_engine(&config).unwrap();
    assert_eq!(engine.provider().name(), "analytic");
    assert!(engine.profiles().get("ask-for-raise").is_ok());
}

#[test]
fn test_engine_section_overrides_settings() {
    let config = parse_config(
        r#"
        [engine]
        aspect_orb = 6.0
        search_workers = 3

        [engine.scoring.primary]
        trine = 12
        "#,
    )
    .unwrap();
    assert_eq!(config.engine.aspect_orb, 6.0);
    assert_eq!(config.engine.search_workers, 3);
    assert_eq!(config.engine.scoring.primary.trine, 12);
    assert_eq!(config.engine.void_cap_hours, 72);
}

#[test]
fn test_invalid_settings_are_rejected() {
    assert!(parse_config("[engine]\naspect_orb = 0.0\n").is_err());
    assert!(parse_config("[engine]\nsearch_step_minutes = -5\n").is_err());
    assert!(parse_config("[provider]\nkind = \"oracle\"\n").is_err());
}

#[test]
fn test_oversized_time_settings_are_rejected() {
    let err = parse_config("[engine]\nvoid_cap_hours = 9000000000000000\n").unwrap_err();
    assert!(err.to_string().contains("void_cap_hours"));
    assert!(parse_config("[engine]\nvoid_step_minutes = 100000\n").is_err());
    assert!(parse_config("[engine]\nsearch_step_minutes = 9223372036854775807\n").is_err());
    assert!(parse_config("[engine]\nmax_days_ahead = 4000000000\n").is_err());

    let config = parse_config("[engine]\nvoid_cap_hours = 720\nsearch_step_minutes = 1440\n").unwrap();
    build_engine(&config).unwrap();
}

#[test]
fn test_swiss_provider_is_selected_explicitly() {
    let config = parse_config("[provider]\nkind = \"swiss\"\nephemeris_path = \"/nonexistent\"\n").unwrap();
    assert!(matches!(config.provider, ProviderConfig::Swiss { .. }));
    // missing data files, or a build without the swisseph feature, is an error
    // rather than a silent fall back to the analytic provider
    assert!(build_engine(&config).is_err());
}

#[test]
fn test_profiles_file_resolves_next_to_config() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("profiles.toml"),
        r#"
        [[profile]]
        id = "plant-garden"
        primary_houses = [4]
        beneficial_bodies = ["moon", "venus"]
        preferred_aspects = ["trine"]
        "#,
    )
    .unwrap();
    let config_path = dir.path().join("kairos.toml");
    fs::write(
        &config_path,
        "[profiles]\ninclude_builtin = false\npath = \"profiles.toml\"\n",
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let engine = build_engine(&config).unwrap();
    assert_eq!(engine.profiles().len(), 1);
    assert!(engine.profiles().get("plant-garden").is_ok());
}

#[test]
fn test_no_profiles_is_an_error() {
    let config = parse_config("[profiles]\ninclude_builtin = false\n").unwrap();
    let err = build_engine(&config).err().unwrap();
    assert!(err.to_string().contains("No action profiles"));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_shipped_config_parses() {
    let text = include_str!("../../../configs/kairos.toml");
    let config = parse_config(text).unwrap();
    assert_eq!(config.engine.search_step_minutes, 360);
    build_engine(&config).unwrap();
}

#[test]
fn test_default_config_found_from_crate_dir() {
    let config = load_default_config().unwrap();
    assert_eq!(config.provider, ProviderConfig::Analytic);
    assert!(config.profiles.include_builtin);
}
