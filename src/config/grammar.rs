use super::traits::ConfigSection;
use crate::error::GramevoError;
use crate::grammar::Grammar;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub path: PathBuf,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("grammar.bnf"),
        }
    }
}

impl GrammarConfig {
    /// Read and parse the grammar file.
    pub fn load(&self) -> Result<Grammar, GramevoError> {
        let text = std::fs::read_to_string(&self.path)?;
        Grammar::parse(&text)
    }
}

impl ConfigSection for GrammarConfig {
    fn section_name() -> &'static str {
        "grammar"
    }

    fn validate(&self) -> Result<(), GramevoError> {
        if self.path.as_os_str().is_empty() {
            return Err(GramevoError::Configuration(
                "Grammar path must not be empty".to_string()
            ));
        }
        Ok(())
    }
}
