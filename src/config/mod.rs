pub mod traits;
pub mod initialization;
pub mod genome;
pub mod grammar;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use initialization::InitializationConfig;
pub use genome::GenomeConfig;
pub use grammar::GrammarConfig;
pub use traits::ConfigSection;
