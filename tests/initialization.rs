use gramevo::config::{GenomeConfig, InitializationConfig};
use gramevo::engines::generation::{Mapper, OverflowPolicy, RampedHalfAndHalf};
use gramevo::error::GramevoError;
use gramevo::grammar::Grammar;
use gramevo::types::GenerationMethod;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

const ARITH: &str = "\
<expr> ::= <expr> <op> <expr> | ( <expr> ) | <pre> ( <expr> ) | <var>
<op>   ::= + | - | * | /
<pre>  ::= sin | cos | exp
<var>  ::= x | y | 1.0
";

fn arith() -> Arc<Grammar> {
    Arc::new(Grammar::parse(ARITH).unwrap())
}

fn config(size: usize, start: usize, end: usize) -> InitializationConfig {
    InitializationConfig {
        population_size: size,
        start_max_depth: start,
        end_max_depth: end,
        seed: Some(2024),
        ..InitializationConfig::default()
    }
}

#[test]
fn test_population_size_distinctness_and_depth_bounds() {
    let grammar = arith();
    let mut init = RampedHalfAndHalf::from_config(&config(60, 3, 8), Arc::clone(&grammar));
    let population = init.initial_population().unwrap();

    assert_eq!(population.len(), 60);
    let distinct: HashSet<_> = population.iter().map(|i| i.tree.clone()).collect();
    assert_eq!(distinct.len(), 60);

    let full = population
        .iter()
        .filter(|i| i.method == GenerationMethod::Full)
        .count();
    assert_eq!(full, 30);

    for individual in &population {
        assert!(individual.tree.depth() <= individual.max_depth);
        assert!(individual.tree.is_complete(&grammar));
    }
}

#[test]
fn test_full_individuals_reach_their_depth() {
    let grammar = arith();
    let mut init = RampedHalfAndHalf::from_config(&config(20, 3, 7), Arc::clone(&grammar));
    for individual in init.initial_population().unwrap() {
        if individual.method == GenerationMethod::Full {
            assert_eq!(individual.tree.depth(), individual.max_depth);
        }
    }
}

#[test]
fn test_seeded_initialisation_is_reproducible() {
    let grammar = arith();
    let first = RampedHalfAndHalf::from_config(&config(15, 2, 5), Arc::clone(&grammar))
        .initial_population()
        .unwrap();
    let second = RampedHalfAndHalf::from_config(&config(15, 2, 5), Arc::clone(&grammar))
        .initial_population()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_depth_below_minimum_is_state_error() {
    let grammar = arith();
    assert_eq!(grammar.start_rule().min_depth(), Some(2));
    let result = RampedHalfAndHalf::from_config(&config(10, 1, 1), grammar).initial_population();
    assert!(matches!(result, Err(GramevoError::State(_))));
}

#[test]
fn test_low_diversity_grammar_hits_retry_cap() {
    let grammar = Arc::new(Grammar::parse("<bit> ::= 0 | 1").unwrap());
    let mut settings = config(5, 1, 1);
    settings.max_retries = 25;
    let result = RampedHalfAndHalf::from_config(&settings, grammar).initial_population();
    match result {
        Err(GramevoError::DuplicateRetriesExhausted { index, attempts }) => {
            assert_eq!(index, 2);
            assert_eq!(attempts, 26);
        }
        other => panic!("expected retry exhaustion, got {:?}", other),
    }
}

#[test]
fn test_sensible_initialisation_round_trips_through_mapper() {
    let grammar = arith();
    let mut init = RampedHalfAndHalf::from_config(&config(30, 3, 6), Arc::clone(&grammar));
    let chromosomes = init
        .initial_chromosomes(OverflowPolicy::Exhaust, 10_000)
        .unwrap();

    let mapper = Mapper::new(grammar, 6);
    let mapped = mapper.map_population(chromosomes, 0);
    assert!(mapped.iter().all(|m| m.is_valid()));
    let trees: HashSet<_> = mapped.into_iter().filter_map(|m| m.tree).collect();
    assert_eq!(trees.len(), 30);
}

#[test]
fn test_random_genomes_follow_genome_config() {
    let grammar = arith();
    let genome = GenomeConfig {
        initial_length: 12,
        ..GenomeConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(31);
    let chromosomes = genome.random_population(25, &mut rng).unwrap();
    assert!(chromosomes.iter().all(|c| c.len() == 12));

    // Default genomes wrap, so every one of them maps at a depth the grammar allows.
    let mapped = Mapper::new(grammar, 6).map_population(chromosomes, 0);
    assert!(mapped.iter().all(|m| m.is_valid()));
}
