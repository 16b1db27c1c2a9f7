use super::{
    genome::GenomeConfig,
    grammar::GrammarConfig,
    initialization::InitializationConfig,
    traits::ConfigSection,
};
use crate::error::GramevoError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix for environment overrides, e.g. `GRAMEVO_INITIALIZATION__POPULATION_SIZE=500`.
pub const ENV_PREFIX: &str = "GRAMEVO";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub initialization: InitializationConfig,
    pub genome: GenomeConfig,
    pub grammar: GrammarConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), GramevoError> {
        validate_section(&self.initialization)?;
        validate_section(&self.genome)?;
        validate_section(&self.grammar)?;
        Ok(())
    }
}

/// Tag configuration errors with the section they came from.
fn validate_section<S: ConfigSection>(section: &S) -> Result<(), GramevoError> {
    section.validate().map_err(|e| match e {
        GramevoError::Configuration(msg) => {
            GramevoError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    })
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Load a TOML or JSON file (by extension), then apply `GRAMEVO_*` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GramevoError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GramevoError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| GramevoError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GramevoError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| GramevoError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| GramevoError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to a copy and keep it only if the result validates.
    pub fn update<F>(&self, f: F) -> Result<(), GramevoError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
