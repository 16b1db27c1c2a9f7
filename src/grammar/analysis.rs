//! Recursion and depth analysis over the rule graph.
//!
//! The rule graph may contain cycles (mutual recursion), so every quantity
//! here is computed iteratively over the arena rather than by recursive
//! descent through rules.

use crate::error::{GramevoError, Result};
use crate::grammar::model::{Reach, Rule, RuleId};
use log::debug;
use std::collections::BTreeSet;

pub(crate) fn analyze(rules: &mut [Rule], start: RuleId) -> Result<()> {
    let edges = rule_edges(rules);

    let recursive = recursion_flags(&edges);
    let min_depths = min_depths(rules);

    let reachable = reachable_from(&edges, start.0);
    let infinite: Vec<&str> = reachable
        .iter()
        .filter(|&&r| min_depths[r].is_none())
        .map(|&r| rules[r].name.as_str())
        .collect();
    if !infinite.is_empty() {
        return Err(GramevoError::GrammarMalformed(format!(
            "grammar is infinite: rule(s) {} can never finish deriving",
            infinite
                .iter()
                .map(|n| format!("<{}>", n))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let max_depths = max_depths(rules, &edges, &recursive);

    for (index, rule) in rules.iter_mut().enumerate() {
        rule.recursive = recursive[index];
        rule.min_depth = min_depths[index];
        rule.max_depth = max_depths[index];
        for production in &mut rule.productions {
            production.min_depth = production_min_depth(production.rule_refs(), &min_depths);
            production.max_depth = production_max_depth(production.rule_refs(), &max_depths);
        }
        debug!(
            "rule <{}>: recursive={}, min_depth={:?}, max_depth={}",
            rule.name, rule.recursive, rule.min_depth, rule.max_depth
        );
    }

    Ok(())
}

/// Distinct successors of each rule in the rule-reference graph.
fn rule_edges(rules: &[Rule]) -> Vec<BTreeSet<usize>> {
    rules
        .iter()
        .map(|rule| {
            rule.productions
                .iter()
                .flat_map(|p| p.rule_refs().map(RuleId::index))
                .collect()
        })
        .collect()
}

/// Rules reachable from `from` through one or more edges.
fn successors_closure(edges: &[BTreeSet<usize>], from: usize) -> Vec<bool> {
    let mut seen = vec![false; edges.len()];
    let mut stack: Vec<usize> = edges[from].iter().copied().collect();
    while let Some(next) = stack.pop() {
        if !seen[next] {
            seen[next] = true;
            stack.extend(edges[next].iter().copied());
        }
    }
    seen
}

/// Rules reachable from `start`, including `start` itself.
fn reachable_from(edges: &[BTreeSet<usize>], start: usize) -> Vec<usize> {
    let mut closure = successors_closure(edges, start);
    closure[start] = true;
    closure
        .iter()
        .enumerate()
        .filter(|(_, &reached)| reached)
        .map(|(i, _)| i)
        .collect()
}

fn recursion_flags(edges: &[BTreeSet<usize>]) -> Vec<bool> {
    (0..edges.len())
        .map(|r| successors_closure(edges, r)[r])
        .collect()
}

/// Fixed-point relaxation of the smallest terminating depth of each rule.
fn min_depths(rules: &[Rule]) -> Vec<Option<usize>> {
    let mut depths: Vec<Option<usize>> = vec![None; rules.len()];
    let mut changed = true;
    let mut rounds = 0usize;

    while changed {
        changed = false;
        rounds += 1;
        for (index, rule) in rules.iter().enumerate() {
            let best = rule
                .productions
                .iter()
                .filter_map(|p| production_min_depth(p.rule_refs(), &depths))
                .min();
            if let Some(candidate) = best {
                if depths[index].map_or(true, |current| candidate < current) {
                    depths[index] = Some(candidate);
                    changed = true;
                }
            }
        }
    }

    debug!("min depth relaxation converged after {} round(s)", rounds);
    depths
}

fn production_min_depth(
    refs: impl Iterator<Item = RuleId>,
    depths: &[Option<usize>],
) -> Option<usize> {
    let mut deepest = 0usize;
    for id in refs {
        deepest = deepest.max(depths[id.0]?);
    }
    Some(deepest + 1)
}

/// Deepest derivation of each rule. Any rule that can reach a cycle is unbounded;
/// the remaining rules form a DAG and settle by relaxation.
fn max_depths(rules: &[Rule], edges: &[BTreeSet<usize>], recursive: &[bool]) -> Vec<Reach> {
    let count = rules.len();
    let mut depths: Vec<Option<Reach>> = (0..count)
        .map(|r| {
            let reaches_cycle = recursive[r]
                || successors_closure(edges, r)
                    .iter()
                    .zip(recursive)
                    .any(|(&seen, &rec)| seen && rec);
            reaches_cycle.then_some(Reach::Unbounded)
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (index, rule) in rules.iter().enumerate() {
            if depths[index].is_some() {
                continue;
            }
            let mut deepest = Some(Reach::Bounded(1));
            for production in &rule.productions {
                let settled: Option<Vec<Reach>> =
                    production.rule_refs().map(|id| depths[id.0]).collect();
                deepest = match (deepest, settled) {
                    (Some(current), Some(children)) => {
                        let child = children.into_iter().max().unwrap_or(Reach::Bounded(0));
                        Some(current.max(add_level(child)))
                    }
                    _ => None,
                };
            }
            if deepest.is_some() {
                depths[index] = deepest;
                changed = true;
            }
        }
    }

    depths
        .into_iter()
        .map(|d| d.unwrap_or(Reach::Unbounded))
        .collect()
}

fn production_max_depth(refs: impl Iterator<Item = RuleId>, depths: &[Reach]) -> Reach {
    let child = refs.map(|id| depths[id.0]).max().unwrap_or(Reach::Bounded(0));
    add_level(child)
}

fn add_level(reach: Reach) -> Reach {
    match reach {
        Reach::Bounded(depth) => Reach::Bounded(depth + 1),
        Reach::Unbounded => Reach::Unbounded,
    }
}
