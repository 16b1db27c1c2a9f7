use super::traits::ConfigSection;
use crate::engines::generation::{random_chromosome, Chromosome, OverflowPolicy};
use crate::error::GramevoError;
use crate::types::Codon;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Genome representation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    pub max_codon: Codon,
    pub initial_length: usize,
    pub wrapping: bool,
    pub extending: bool,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            max_codon: 255,
            initial_length: 100,
            wrapping: true,
            extending: false,
        }
    }
}

impl GenomeConfig {
    pub fn overflow_policy(&self) -> Result<OverflowPolicy, GramevoError> {
        OverflowPolicy::from_flags(self.wrapping, self.extending, self.max_codon)
    }

    /// Uniformly random genomes of `initial_length` codons, the classic
    /// alternative to tree-based (sensible) initialisation.
    pub fn random_population<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<Chromosome>, GramevoError> {
        let policy = self.overflow_policy()?;
        (0..size)
            .map(|_| random_chromosome(self.initial_length, self.max_codon, policy, rng))
            .collect()
    }
}

impl ConfigSection for GenomeConfig {
    fn section_name() -> &'static str {
        "genome"
    }

    fn validate(&self) -> Result<(), GramevoError> {
        self.overflow_policy()?;
        if self.wrapping && self.initial_length == 0 {
            return Err(GramevoError::Configuration(
                "Wrapping genomes need an initial length of at least 1".to_string()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_population_uses_initial_length() {
        let config = GenomeConfig {
            max_codon: 15,
            initial_length: 24,
            wrapping: false,
            extending: true,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let population = config.random_population(10, &mut rng).unwrap();

        assert_eq!(population.len(), 10);
        for chromosome in &population {
            assert_eq!(chromosome.len(), 24);
            assert_eq!(chromosome.policy(), OverflowPolicy::Extend { max_codon: 15 });
            assert!(chromosome.codons().iter().all(|&c| c <= 15));
        }
    }

    #[test]
    fn test_random_population_rejects_conflicting_flags() {
        let config = GenomeConfig {
            wrapping: true,
            extending: true,
            ..GenomeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            config.random_population(3, &mut rng),
            Err(GramevoError::Configuration(_))
        ));
    }
}
