use crate::engines::generation::{
    chromosome::{Chromosome, OverflowPolicy},
    codon_reader::CodonReader,
    tree::DerivationTree,
};
use crate::error::{GramevoError, Result};
use crate::grammar::{Grammar, RuleId, Symbol};
use crate::types::Codon;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Why a chromosome failed to produce a complete derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidReason {
    /// Ran out of codons before every non-terminal was expanded.
    CodonsExhausted,
    /// A non-terminal had no production that fits in the remaining depth.
    DepthExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Validity {
    Valid,
    Invalid(InvalidReason),
}

/// Result of mapping one chromosome.
///
/// Invalid individuals are still returned so the outer loop can keep going;
/// fitness evaluation must check [`MappedIndividual::is_valid`] and penalise them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedIndividual {
    pub tree: Option<DerivationTree>,
    pub chromosome: Chromosome,
    pub codons_used: usize,
    pub validity: Validity,
}

impl MappedIndividual {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// Depth-first genotype-to-phenotype mapper.
pub struct Mapper {
    grammar: Arc<Grammar>,
    max_depth: usize,
}

impl Mapper {
    pub fn new(grammar: Arc<Grammar>, max_depth: usize) -> Self {
        Self { grammar, max_depth }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Main entry point: derive a tree from `chromosome`.
    ///
    /// `rng` is only drawn from when the chromosome extends itself; for the
    /// other policies the result depends on the codons alone. The walk recurses
    /// per level, so `max_depth` should stay within ordinary GP bounds.
    pub fn map<R: Rng + ?Sized>(&self, mut chromosome: Chromosome, rng: &mut R) -> MappedIndividual {
        let (outcome, codons_used) = {
            let mut reader = CodonReader::new(&mut chromosome, rng);
            let outcome = self.expand(self.grammar.start(), self.max_depth, &mut reader);
            (outcome, reader.position())
        };

        match outcome {
            Ok(tree) => MappedIndividual {
                tree: Some(tree),
                chromosome,
                codons_used,
                validity: Validity::Valid,
            },
            Err(reason) => {
                debug!("mapping invalid after {} codon(s): {:?}", codons_used, reason);
                MappedIndividual {
                    tree: None,
                    chromosome,
                    codons_used,
                    validity: Validity::Invalid(reason),
                }
            }
        }
    }

    /// Map many chromosomes in parallel. Individual `i` extends (if it does)
    /// from its own RNG seeded with `seed + i`, so results do not depend on
    /// thread scheduling.
    pub fn map_population(&self, chromosomes: Vec<Chromosome>, seed: u64) -> Vec<MappedIndividual> {
        chromosomes
            .into_par_iter()
            .enumerate()
            .map(|(i, chromosome)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                self.map(chromosome, &mut rng)
            })
            .collect()
    }

    fn expand<R: Rng + ?Sized>(
        &self,
        rule_id: RuleId,
        budget: usize,
        reader: &mut CodonReader<'_, R>,
    ) -> std::result::Result<DerivationTree, InvalidReason> {
        let rule = self.grammar.rule(rule_id);
        let eligible = rule.eligible_productions(budget);
        if eligible.is_empty() {
            return Err(InvalidReason::DepthExceeded);
        }

        let choice = reader
            .choose(eligible.len())
            .ok_or(InvalidReason::CodonsExhausted)?;
        let production = eligible[choice];

        let symbols = rule.productions()[production].symbols();
        let mut children = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            children.push(match symbol {
                Symbol::Literal(literal) => DerivationTree::Terminal(*literal),
                Symbol::Rule(child) => self.expand(*child, budget - 1, reader)?,
            });
        }

        Ok(DerivationTree::NonTerminal {
            rule: rule_id,
            production,
            children,
        })
    }

    /// Inverse mapping: encode `tree` as codons that [`Mapper::map`] turns back into it.
    ///
    /// Each codon is `k + m * n`, where `k` is the chosen production's position
    /// among the `n` eligible ones and `m` is random, keeping codons in
    /// `0..=max_codon`.
    pub fn unmap<R: Rng + ?Sized>(
        &self,
        tree: &DerivationTree,
        policy: OverflowPolicy,
        max_codon: Codon,
        rng: &mut R,
    ) -> Result<Chromosome> {
        if tree.rule() != Some(self.grammar.start()) {
            return Err(GramevoError::State(
                "tree is not rooted at the grammar's start rule".to_string(),
            ));
        }
        let mut codons = Vec::with_capacity(tree.node_count());
        self.encode(tree, self.max_depth, max_codon, rng, &mut codons)?;
        Chromosome::new(codons, policy)
    }

    fn encode<R: Rng + ?Sized>(
        &self,
        node: &DerivationTree,
        budget: usize,
        max_codon: Codon,
        rng: &mut R,
        codons: &mut Vec<Codon>,
    ) -> Result<()> {
        let DerivationTree::NonTerminal {
            rule,
            production,
            children,
        } = node
        else {
            return Ok(());
        };

        let grammar_rule = self.grammar.get_rule(*rule).ok_or_else(|| {
            GramevoError::State(format!("tree references unknown rule {}", rule.index()))
        })?;
        let eligible = grammar_rule.eligible_productions(budget);
        let position = eligible.iter().position(|p| p == production).ok_or_else(|| {
            GramevoError::State(format!(
                "production {} of <{}> does not fit in depth {}",
                production,
                grammar_rule.name(),
                budget
            ))
        })?;

        let choices = eligible.len() as u64;
        let base = position as u64;
        if base > u64::from(max_codon) {
            return Err(GramevoError::State(format!(
                "max codon {} cannot select alternative {} of <{}>",
                max_codon,
                position,
                grammar_rule.name()
            )));
        }
        let multiples = (u64::from(max_codon) - base) / choices;
        let codon = base + choices * rng.gen_range(0..=multiples);
        codons.push(codon as Codon);

        let symbols = grammar_rule.productions()[*production].symbols();
        if symbols.len() != children.len() {
            return Err(GramevoError::State(format!(
                "node of <{}> has {} children, production has {} symbols",
                grammar_rule.name(),
                children.len(),
                symbols.len()
            )));
        }
        for (symbol, child) in symbols.iter().zip(children) {
            match (symbol, child) {
                (Symbol::Rule(expected), DerivationTree::NonTerminal { rule: found, .. })
                    if expected == found =>
                {
                    self.encode(child, budget - 1, max_codon, rng, codons)?
                }
                (Symbol::Literal(expected), DerivationTree::Terminal(found)) if expected == found => {}
                _ => {
                    return Err(GramevoError::State(format!(
                        "tree does not follow production {} of <{}>",
                        production,
                        grammar_rule.name()
                    )))
                }
            }
        }
        Ok(())
    }
}
