//! Grammar-driven derivation engine for evolutionary program synthesis.
//!
//! ```text
//!   BNF text ──parse──▶ Grammar (rule arena + depth analysis)
//!                          │
//!          ┌───────────────┴────────────────┐
//!          ▼                                ▼
//!   Full / Grow builders             Chromosome ──map──▶ DerivationTree
//!          │                                ▲
//!   RampedHalfAndHalf ──unmap (sensible init)┘
//! ```
//!
//! The grammar is immutable and shared; every individual owns its tree,
//! its chromosome and, when built in parallel, its random source.

pub mod config;
pub mod engines;
pub mod error;
pub mod grammar;
pub mod types;

pub use engines::generation::{
    Chromosome, DerivationBuilder, DerivationTree, FullBuilder, GrowBuilder, MappedIndividual,
    Mapper, OverflowPolicy, RampedHalfAndHalf, TreeIndividual, Validity,
};
pub use error::{GramevoError, Result};
pub use grammar::{Grammar, LiteralId, Rule, RuleId, Symbol};
pub use types::{Codon, GenerationMethod};
