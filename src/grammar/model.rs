use crate::error::Result;
use crate::grammar::parser;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Index of a rule inside its grammar's rule arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an interned literal inside its grammar's literal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LiteralId(pub(crate) usize);

impl LiteralId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One position in a production: either a rule to expand or a fixed terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Rule(RuleId),
    Literal(LiteralId),
}

/// How deep a derivation can get at most.
///
/// Variant order matters: every `Bounded` depth sorts below `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Reach {
    Bounded(usize),
    Unbounded,
}

impl Reach {
    /// True when a derivation can get at least `depth` levels deep.
    pub fn reaches(self, depth: usize) -> bool {
        match self {
            Reach::Bounded(max) => max >= depth,
            Reach::Unbounded => true,
        }
    }
}

impl fmt::Display for Reach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reach::Bounded(depth) => write!(f, "{}", depth),
            Reach::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// A single alternative of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) min_depth: Option<usize>,
    pub(crate) max_depth: Reach,
}

impl Production {
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Key/value pairs from the `<?key=value?>` annotation, if any.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Smallest subtree depth this alternative needs, `None` if it never terminates.
    pub fn min_depth(&self) -> Option<usize> {
        self.min_depth
    }

    pub fn max_depth(&self) -> Reach {
        self.max_depth
    }

    /// True when expanding this alternative fits in `budget` remaining levels.
    pub fn fits(&self, budget: usize) -> bool {
        self.min_depth.map_or(false, |min| min <= budget)
    }

    pub fn is_terminal_only(&self) -> bool {
        self.symbols.iter().all(|s| matches!(s, Symbol::Literal(_)))
    }

    pub fn rule_refs(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.symbols.iter().filter_map(|s| match s {
            Symbol::Rule(id) => Some(*id),
            Symbol::Literal(_) => None,
        })
    }
}

/// A named non-terminal with its ordered alternatives and depth analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub(crate) name: String,
    pub(crate) productions: Vec<Production>,
    pub(crate) recursive: bool,
    pub(crate) min_depth: Option<usize>,
    pub(crate) max_depth: Reach,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, index: usize) -> Option<&Production> {
        self.productions.get(index)
    }

    /// True when the rule can reach itself through one or more expansions.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Smallest depth at which a derivation rooted here fully terminates.
    ///
    /// `None` only for rules the start rule cannot reach; reachable rules
    /// without a finite depth make the grammar fail to parse.
    pub fn min_depth(&self) -> Option<usize> {
        self.min_depth
    }

    pub fn max_depth(&self) -> Reach {
        self.max_depth
    }

    /// Indices of the productions that fit in `budget` remaining levels, in grammar order.
    pub fn eligible_productions(&self, budget: usize) -> Vec<usize> {
        self.productions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.fits(budget))
            .map(|(i, _)| i)
            .collect()
    }
}

/// An immutable, analysed context-free grammar.
///
/// Rules live in an arena addressed by [`RuleId`], so mutually recursive
/// rules never hold references to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub(crate) rules: Vec<Rule>,
    pub(crate) names: HashMap<String, RuleId>,
    pub(crate) literals: Vec<String>,
    pub(crate) start: RuleId,
}

impl Grammar {
    /// Parse BNF text. The first rule defined is the start rule.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    pub fn start(&self) -> RuleId {
        self.start
    }

    pub fn start_rule(&self) -> &Rule {
        self.rule(self.start)
    }

    /// Look up a rule by id.
    ///
    /// Ids only come from this grammar, so an out-of-range id is a caller bug
    /// and panics like a slice index would.
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub fn get_rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name).copied()
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rule_id(name).map(|id| self.rule(id))
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn literal(&self, id: LiteralId) -> &str {
        &self.literals[id.0]
    }

    pub fn literal_id(&self, value: &str) -> Option<LiteralId> {
        self.literals.iter().position(|l| l == value).map(LiteralId)
    }

    /// Every distinct literal value, in order of first appearance.
    pub fn literals(&self) -> &[String] {
        &self.literals
    }
}

impl FromStr for Grammar {
    type Err = crate::error::GramevoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            write!(f, "<{}> ::=", rule.name)?;
            for (i, production) in rule.productions.iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }
                for symbol in &production.symbols {
                    match symbol {
                        Symbol::Rule(id) => write!(f, " <{}>", self.rule(*id).name)?,
                        Symbol::Literal(id) => write!(f, " {}", self.literal(*id))?,
                    }
                }
                if !production.attributes.is_empty() {
                    let pairs: Vec<String> = production
                        .attributes
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    write!(f, " <?{}?>", pairs.join(";"))?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
