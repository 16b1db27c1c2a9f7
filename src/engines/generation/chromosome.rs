//! Linear genome for the grammatical-evolution representation.
//!
//! A chromosome is a sequence of integer codons. The mapper reads them one by
//! one, and each codon picks a production at one non-terminal:
//! - codon `c` at a rule with `n` eligible alternatives selects `c % n`
//! - codons are consumed in depth-first, left-to-right order
//!
//! What happens when the mapper reads past the last codon is decided by the
//! chromosome's [`OverflowPolicy`].
//!
//! # Example
//!
//! ```
//! use gramevo::engines::generation::{Chromosome, OverflowPolicy};
//!
//! let mut chromosome = Chromosome::new(vec![3, 8, 1], OverflowPolicy::Wrap).unwrap();
//! let mut rng = rand::thread_rng();
//! assert_eq!(chromosome.read(4, &mut rng), Some(8));
//! ```

use crate::error::{GramevoError, Result};
use crate::types::Codon;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Behaviour when a read goes past the last codon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Reading past the end reports exhaustion.
    Exhaust,
    /// Index `i` reads codon `i % len`.
    Wrap,
    /// Reading past the end appends fresh codons drawn from `0..=max_codon`.
    Extend { max_codon: Codon },
}

impl OverflowPolicy {
    /// Resolve the two configuration flags into a policy.
    pub fn from_flags(wrapping: bool, extending: bool, max_codon: Codon) -> Result<Self> {
        match (wrapping, extending) {
            (true, true) => Err(GramevoError::Configuration(
                "a chromosome cannot both wrap and extend".to_string(),
            )),
            (true, false) => Ok(OverflowPolicy::Wrap),
            (false, true) => Ok(OverflowPolicy::Extend { max_codon }),
            (false, false) => Ok(OverflowPolicy::Exhaust),
        }
    }

    pub fn is_wrapping(self) -> bool {
        matches!(self, OverflowPolicy::Wrap)
    }

    pub fn is_extending(self) -> bool {
        matches!(self, OverflowPolicy::Extend { .. })
    }
}

/// Deserialisation goes through [`Chromosome::new`], so stored chromosomes
/// obey the same invariants as constructed ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChromosome")]
pub struct Chromosome {
    pub(crate) codons: Vec<Codon>,
    pub(crate) policy: OverflowPolicy,
}

#[derive(Deserialize)]
struct RawChromosome {
    codons: Vec<Codon>,
    policy: OverflowPolicy,
}

impl TryFrom<RawChromosome> for Chromosome {
    type Error = GramevoError;

    fn try_from(raw: RawChromosome) -> Result<Self> {
        Chromosome::new(raw.codons, raw.policy)
    }
}

impl Chromosome {
    /// A wrapping chromosome needs at least one codon to wrap around to.
    pub fn new(codons: Vec<Codon>, policy: OverflowPolicy) -> Result<Self> {
        if policy.is_wrapping() && codons.is_empty() {
            return Err(GramevoError::State(
                "a wrapping chromosome needs at least one codon".to_string(),
            ));
        }
        Ok(Self { codons, policy })
    }

    pub fn codons(&self) -> &[Codon] {
        &self.codons
    }

    pub fn into_codons(self) -> Vec<Codon> {
        self.codons
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.codons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codons.is_empty()
    }

    /// Read the codon at `index` without growing the chromosome.
    ///
    /// Under `Extend` a read past the end returns `None` here; use [`Chromosome::read`]
    /// to grow it.
    pub fn peek(&self, index: usize) -> Option<Codon> {
        match self.policy {
            OverflowPolicy::Wrap if !self.codons.is_empty() => {
                Some(self.codons[index % self.codons.len()])
            }
            _ => self.codons.get(index).copied(),
        }
    }

    /// Read the codon at `index`, applying the overflow policy.
    ///
    /// Returns `None` (exhausted) only under `Exhaust` once `index >= len`.
    /// Under `Extend`, codons are appended until `index` exists.
    pub fn read<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Option<Codon> {
        if let OverflowPolicy::Extend { max_codon } = self.policy {
            while self.codons.len() <= index {
                self.codons.push(rng.gen_range(0..=max_codon));
            }
        }
        self.peek(index)
    }

    /// True when reading `index` would report exhaustion.
    pub fn is_exhausted_at(&self, index: usize) -> bool {
        matches!(self.policy, OverflowPolicy::Exhaust) && index >= self.codons.len()
    }
}
