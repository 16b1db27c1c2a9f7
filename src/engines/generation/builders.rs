//! Depth-bounded random derivation builders.
//!
//! Both builders share the same eligibility rule: with `r` levels of budget
//! left, a production may be expanded only if its minimum depth is at most
//! `r`. Children are expanded with `r - 1`; literals cost nothing. This keeps
//! every tree within the requested bound by construction.
//!
//! Expansion recurses once per tree level, as do the [`DerivationTree`]
//! walkers and its drop glue. Depth bounds are meant to be small (GP runs use
//! single or low double digits); bounds in the tens of thousands on a
//! right-recursive grammar will overflow the thread stack under
//! [`FullBuilder`].

use crate::error::{GramevoError, Result};
use crate::engines::generation::tree::DerivationTree;
use crate::grammar::{Grammar, Rule, RuleId, Symbol};
use crate::types::GenerationMethod;
use rand::seq::SliceRandom;
use rand::Rng;

/// A tree construction policy.
///
/// Implementors only decide which productions are candidates at each
/// expansion; the depth-first walk is shared.
pub trait DerivationBuilder {
    /// Production indices of `rule` that may be picked with `budget` levels left.
    fn candidates(&self, rule: &Rule, budget: usize) -> Vec<usize>;

    /// Build a tree rooted at `start` (or the grammar's start rule) no deeper than `max_depth`.
    fn build<R: Rng + ?Sized>(
        &self,
        grammar: &Grammar,
        max_depth: usize,
        rng: &mut R,
        start: Option<RuleId>,
    ) -> Result<DerivationTree> {
        let root = start.unwrap_or_else(|| grammar.start());
        if grammar.get_rule(root).is_none() {
            return Err(GramevoError::State(format!(
                "start rule {} does not belong to this grammar",
                root.index()
            )));
        }
        expand(self, grammar, root, max_depth, rng)
    }
}

fn expand<B, R>(
    builder: &B,
    grammar: &Grammar,
    rule_id: RuleId,
    budget: usize,
    rng: &mut R,
) -> Result<DerivationTree>
where
    B: DerivationBuilder + ?Sized,
    R: Rng + ?Sized,
{
    let rule = grammar.rule(rule_id);
    let candidates = builder.candidates(rule, budget);
    let production = *candidates.choose(rng).ok_or_else(|| {
        GramevoError::State(format!(
            "no production of <{}> fits in depth {} (needs {})",
            rule.name(),
            budget,
            rule.min_depth()
                .map_or_else(|| "an infinite depth".to_string(), |d| d.to_string())
        ))
    })?;

    let symbols = rule.productions()[production].symbols();
    let mut children = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        children.push(match symbol {
            Symbol::Literal(literal) => DerivationTree::Terminal(*literal),
            Symbol::Rule(child) => expand(builder, grammar, *child, budget - 1, rng)?,
        });
    }

    Ok(DerivationTree::NonTerminal {
        rule: rule_id,
        production,
        children,
    })
}

/// Uniform choice among every production that fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowBuilder;

impl DerivationBuilder for GrowBuilder {
    fn candidates(&self, rule: &Rule, budget: usize) -> Vec<usize> {
        rule.eligible_productions(budget)
    }
}

/// Prefers productions that can still fill the remaining budget, so branches
/// reach the full depth whenever the grammar allows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullBuilder;

impl DerivationBuilder for FullBuilder {
    fn candidates(&self, rule: &Rule, budget: usize) -> Vec<usize> {
        let eligible = rule.eligible_productions(budget);
        if budget <= 1 {
            return eligible;
        }

        let productions = rule.productions();
        let filling: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|&i| productions[i].max_depth().reaches(budget))
            .collect();
        if !filling.is_empty() {
            return filling;
        }

        // Nothing reaches the bound; keep the deepest-reaching alternatives.
        let Some(deepest) = eligible.iter().map(|&i| productions[i].max_depth()).max() else {
            return eligible;
        };
        eligible
            .into_iter()
            .filter(|&i| productions[i].max_depth() == deepest)
            .collect()
    }
}

impl GenerationMethod {
    pub fn build<R: Rng + ?Sized>(
        self,
        grammar: &Grammar,
        max_depth: usize,
        rng: &mut R,
    ) -> Result<DerivationTree> {
        match self {
            GenerationMethod::Full => FullBuilder.build(grammar, max_depth, rng, None),
            GenerationMethod::Grow => GrowBuilder.build(grammar, max_depth, rng, None),
        }
    }
}
