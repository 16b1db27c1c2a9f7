use gramevo::config::{AppConfig, ConfigManager};
use gramevo::engines::generation::OverflowPolicy;
use gramevo::error::GramevoError;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_defaults_are_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.genome.overflow_policy().unwrap(), OverflowPolicy::Wrap);
}

#[test]
fn test_toml_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gramevo.toml");

    let manager = ConfigManager::new();
    manager
        .update(|config| {
            config.initialization.population_size = 250;
            config.initialization.start_max_depth = 3;
            config.initialization.end_max_depth = 9;
            config.initialization.seed = Some(7);
            config.genome.wrapping = false;
            config.genome.extending = true;
            config.genome.max_codon = 1023;
            config.grammar.path = PathBuf::from("grammars/arith.bnf");
        })
        .unwrap();
    manager.save_to_file(&path).unwrap();

    let reloaded = ConfigManager::new();
    reloaded.load_from_file(&path).unwrap();
    assert_eq!(reloaded.get(), manager.get());
    assert_eq!(
        reloaded.get().genome.overflow_policy().unwrap(),
        OverflowPolicy::Extend { max_codon: 1023 }
    );
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[initialization]\npopulation_size = 12\n").unwrap();

    let manager = ConfigManager::new();
    manager.load_from_file(&path).unwrap();
    let config = manager.get();
    assert_eq!(config.initialization.population_size, 12);
    assert_eq!(config.initialization.end_max_depth, 6);
    assert_eq!(config.genome, AppConfig::default().genome);
}

#[test]
fn test_json_file_is_accepted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{ "genome": { "max_codon": 511, "initial_length": 40 } }"#).unwrap();

    let manager = ConfigManager::new();
    manager.load_from_file(&path).unwrap();
    assert_eq!(manager.get().genome.max_codon, 511);
    assert_eq!(manager.get().genome.initial_length, 40);
}

#[test]
fn test_invalid_file_is_rejected_and_config_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[genome]\nwrapping = true\nextending = true\n").unwrap();

    let manager = ConfigManager::new();
    let result = manager.load_from_file(&path);
    assert!(matches!(result, Err(GramevoError::Configuration(_))));
    assert_eq!(manager.get(), AppConfig::default());
}

#[test]
fn test_invalid_update_is_discarded() {
    let manager = ConfigManager::new();
    let result = manager.update(|config| {
        config.initialization.start_max_depth = 10;
        config.initialization.end_max_depth = 4;
    });
    assert!(result.is_err());
    assert_eq!(manager.get(), AppConfig::default());
}

#[test]
fn test_missing_file_is_configuration_error() {
    let dir = tempdir().unwrap();
    let manager = ConfigManager::new();
    let result = manager.load_from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(GramevoError::Configuration(_))));
}
