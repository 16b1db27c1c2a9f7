pub mod analysis;
pub mod model;
pub mod parser;

pub use model::{Grammar, LiteralId, Production, Reach, Rule, RuleId, Symbol};
