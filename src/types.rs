use serde::{Deserialize, Serialize};
use std::fmt;

/// One integer of a linear genome.
pub type Codon = u32;

/// Tree construction policy used when building a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMethod {
    Full, // every branch grows as deep as the grammar allows
    Grow, // uniform choice among productions that fit
}

impl GenerationMethod {
    /// Ramped half-and-half alternation: even indices use Full, odd use Grow.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            GenerationMethod::Full
        } else {
            GenerationMethod::Grow
        }
    }
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMethod::Full => write!(f, "full"),
            GenerationMethod::Grow => write!(f, "grow"),
        }
    }
}
