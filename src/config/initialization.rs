use super::traits::ConfigSection;
use crate::engines::generation::DEFAULT_MAX_RETRIES;
use crate::error::GramevoError;
use serde::{Deserialize, Serialize};

/// Ramped half-and-half parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializationConfig {
    pub population_size: usize,
    pub start_max_depth: usize,
    pub end_max_depth: usize,
    pub max_retries: usize, // duplicate rebuilds allowed per individual
    pub seed: Option<u64>,
}

impl Default for InitializationConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            start_max_depth: 2,
            end_max_depth: 6,
            max_retries: DEFAULT_MAX_RETRIES,
            seed: None,
        }
    }
}

impl ConfigSection for InitializationConfig {
    fn section_name() -> &'static str {
        "initialization"
    }

    fn validate(&self) -> Result<(), GramevoError> {
        if self.population_size == 0 {
            return Err(GramevoError::Configuration(
                "Population size must be at least 1".to_string()
            ));
        }
        if self.start_max_depth > self.end_max_depth {
            return Err(GramevoError::Configuration(format!(
                "Start max depth {} must not exceed end max depth {}",
                self.start_max_depth, self.end_max_depth
            )));
        }
        if self.max_retries == 0 {
            return Err(GramevoError::Configuration(
                "Max retries must be at least 1".to_string()
            ));
        }
        Ok(())
    }
}
