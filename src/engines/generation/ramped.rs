//! Ramped half-and-half population initialisation.
//!
//! Individual `i` is built at depth `depths[i % depths.len()]` over the
//! inclusive depth ramp, with Full for even `i` and Grow for odd `i`. Trees
//! structurally equal to an earlier individual are rebuilt, up to
//! `max_retries` extra attempts per individual.

use crate::config::InitializationConfig;
use crate::engines::generation::{
    chromosome::{Chromosome, OverflowPolicy},
    mapper::Mapper,
    tree::{DerivationTree, TreeIndividual},
};
use crate::error::{GramevoError, Result};
use crate::grammar::Grammar;
use crate::types::{Codon, GenerationMethod};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_MAX_RETRIES: usize = 1000;

pub struct RampedHalfAndHalf<R> {
    grammar: Option<Arc<Grammar>>,
    rng: Option<R>,
    population_size: usize,
    start_max_depth: usize,
    end_max_depth: usize,
    max_retries: usize,
}

impl<R: Rng> Default for RampedHalfAndHalf<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl RampedHalfAndHalf<StdRng> {
    /// Initializer for a run: sizes and depths from `config`, RNG seeded from
    /// `config.seed` or from entropy when unset.
    pub fn from_config(config: &InitializationConfig, grammar: Arc<Grammar>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new()
            .with_grammar(grammar)
            .with_rng(rng)
            .with_population_size(config.population_size)
            .with_depth_range(config.start_max_depth, config.end_max_depth)
            .with_max_retries(config.max_retries)
    }
}

impl<R: Rng> RampedHalfAndHalf<R> {
    pub fn new() -> Self {
        Self {
            grammar: None,
            rng: None,
            population_size: 0,
            start_max_depth: 0,
            end_max_depth: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_grammar(mut self, grammar: Arc<Grammar>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn with_rng(mut self, rng: R) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_depth_range(mut self, start_max_depth: usize, end_max_depth: usize) -> Self {
        self.start_max_depth = start_max_depth;
        self.end_max_depth = end_max_depth;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn grammar(&self) -> Option<&Arc<Grammar>> {
        self.grammar.as_ref()
    }

    /// Build `population_size` structurally distinct individuals.
    pub fn initial_population(&mut self) -> Result<Vec<TreeIndividual>> {
        let (grammar, depths) = self.validated_setup()?;
        let rng = self
            .rng
            .as_mut()
            .ok_or_else(|| GramevoError::State("random source is not set".to_string()))?;

        let mut seen: HashSet<DerivationTree> = HashSet::with_capacity(self.population_size);
        let mut population = Vec::with_capacity(self.population_size);
        let mut total_retries = 0usize;

        for index in 0..self.population_size {
            let max_depth = depths[index % depths.len()];
            let method = GenerationMethod::for_index(index);

            let mut attempts = 0usize;
            let tree = loop {
                let candidate = method.build(&grammar, max_depth, rng)?;
                attempts += 1;
                if !seen.contains(&candidate) {
                    break candidate;
                }
                if attempts > self.max_retries {
                    warn!(
                        "individual {} ({} at depth {}) stayed a duplicate after {} attempts",
                        index, method, max_depth, attempts
                    );
                    return Err(GramevoError::DuplicateRetriesExhausted { index, attempts });
                }
            };
            if attempts > 1 {
                debug!("individual {} needed {} attempts", index, attempts);
                total_retries += attempts - 1;
            }

            seen.insert(tree.clone());
            population.push(TreeIndividual {
                tree,
                method,
                max_depth,
            });
        }

        info!(
            "initialised {} individuals over depths {}..={} ({} duplicate rebuilds)",
            population.len(),
            depths[0],
            depths[depths.len() - 1],
            total_retries
        );
        Ok(population)
    }

    /// Sensible initialisation for the genome representation: build the ramped
    /// tree population and encode each tree as a chromosome that maps back to it
    /// under a mapper bounded by the end depth.
    pub fn initial_chromosomes(
        &mut self,
        policy: OverflowPolicy,
        max_codon: Codon,
    ) -> Result<Vec<Chromosome>> {
        let population = self.initial_population()?;
        let grammar = self
            .grammar
            .clone()
            .ok_or_else(|| GramevoError::State("grammar is not set".to_string()))?;
        let mapper = Mapper::new(grammar, self.end_max_depth);
        let rng = self
            .rng
            .as_mut()
            .ok_or_else(|| GramevoError::State("random source is not set".to_string()))?;

        population
            .iter()
            .map(|individual| mapper.unmap(&individual.tree, policy, max_codon, rng))
            .collect()
    }

    /// Check the preconditions and return the grammar and depth ramp.
    fn validated_setup(&self) -> Result<(Arc<Grammar>, Vec<usize>)> {
        if self.population_size == 0 {
            return Err(GramevoError::State(
                "population size must be positive".to_string(),
            ));
        }
        let grammar = self
            .grammar
            .clone()
            .ok_or_else(|| GramevoError::State("grammar is not set".to_string()))?;
        if self.rng.is_none() {
            return Err(GramevoError::State("random source is not set".to_string()));
        }
        if self.start_max_depth > self.end_max_depth {
            return Err(GramevoError::State(format!(
                "start max depth {} is greater than end max depth {}",
                self.start_max_depth, self.end_max_depth
            )));
        }

        let min_depth = grammar.start_rule().min_depth().unwrap_or(usize::MAX);
        if self.end_max_depth < min_depth {
            return Err(GramevoError::State(format!(
                "end max depth {} is below the minimum derivation depth {} of <{}>",
                self.end_max_depth,
                min_depth,
                grammar.start_rule().name()
            )));
        }

        let first = self.start_max_depth.max(min_depth);
        if first > self.start_max_depth {
            warn!(
                "depth ramp starts at {} instead of {}: <{}> needs at least {} levels",
                first,
                self.start_max_depth,
                grammar.start_rule().name(),
                min_depth
            );
        }

        Ok((grammar, (first..=self.end_max_depth).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPR: &str = "<e> ::= <e> <op> <e> | ( <e> ) | <v>\n<op> ::= + | - | *\n<v> ::= x | y | 1";

    fn initializer(size: usize, start: usize, end: usize) -> RampedHalfAndHalf<StdRng> {
        RampedHalfAndHalf::new()
            .with_grammar(Arc::new(Grammar::parse(EXPR).unwrap()))
            .with_rng(StdRng::seed_from_u64(17))
            .with_population_size(size)
            .with_depth_range(start, end)
    }

    #[test]
    fn test_population_is_distinct_and_alternating() {
        let population = initializer(40, 3, 7).initial_population().unwrap();
        assert_eq!(population.len(), 40);

        let distinct: HashSet<_> = population.iter().map(|i| &i.tree).collect();
        assert_eq!(distinct.len(), 40);

        for (i, individual) in population.iter().enumerate() {
            let expected = if i % 2 == 0 {
                GenerationMethod::Full
            } else {
                GenerationMethod::Grow
            };
            assert_eq!(individual.method, expected);
            assert_eq!(individual.max_depth, 3 + i % 5);
            assert!(individual.tree.depth() <= individual.max_depth);
        }
    }

    #[test]
    fn test_preconditions() {
        let state = |r: Result<Vec<TreeIndividual>>| matches!(r, Err(GramevoError::State(_)));

        assert!(state(initializer(0, 2, 4).initial_population()));
        assert!(state(initializer(10, 5, 4).initial_population()));
        assert!(state(initializer(10, 1, 1).initial_population()));

        let mut no_grammar = RampedHalfAndHalf::new()
            .with_rng(StdRng::seed_from_u64(0))
            .with_population_size(5)
            .with_depth_range(2, 4);
        assert!(state(no_grammar.initial_population()));

        let mut no_rng: RampedHalfAndHalf<StdRng> = RampedHalfAndHalf::new()
            .with_grammar(Arc::new(Grammar::parse(EXPR).unwrap()))
            .with_population_size(5)
            .with_depth_range(2, 4);
        assert!(state(no_rng.initial_population()));
    }

    #[test]
    fn test_ramp_clamped_to_minimum_depth() {
        let population = initializer(4, 0, 3).initial_population().unwrap();
        let depths: Vec<usize> = population.iter().map(|i| i.max_depth).collect();
        assert_eq!(depths, vec![2, 3, 2, 3]);
    }

    #[test]
    fn test_retry_cap_reports_exhaustion() {
        let grammar = Arc::new(Grammar::parse("<a> ::= x | y").unwrap());
        let mut init = RampedHalfAndHalf::new()
            .with_grammar(grammar)
            .with_rng(StdRng::seed_from_u64(1))
            .with_population_size(3)
            .with_depth_range(1, 1)
            .with_max_retries(50);
        let result = init.initial_population();
        assert!(matches!(
            result,
            Err(GramevoError::DuplicateRetriesExhausted { index: 2, .. })
        ));
    }

    #[test]
    fn test_initial_chromosomes_map_back() {
        let mut init = initializer(20, 3, 5);
        let chromosomes = init.initial_chromosomes(OverflowPolicy::Wrap, 255).unwrap();
        assert_eq!(chromosomes.len(), 20);

        let mapper = Mapper::new(init.grammar().cloned().unwrap(), 5);
        let mut rng = StdRng::seed_from_u64(0);
        let trees: HashSet<DerivationTree> = chromosomes
            .into_iter()
            .map(|c| mapper.map(c, &mut rng))
            .map(|m| {
                assert!(m.is_valid());
                m.tree.unwrap()
            })
            .collect();
        assert_eq!(trees.len(), 20);
    }
}
