use crate::grammar::{Grammar, LiteralId, RuleId, Symbol};
use crate::types::GenerationMethod;
use serde::{Deserialize, Serialize};

/// Path from the root to a node: the child index taken at each level.
pub type TreePath = Vec<usize>;

/// A derivation tree mirroring the grammar it was built from.
///
/// Structural equality (and hashing) compares rules, chosen productions and
/// literals, which is what population initialisation uses to reject duplicates.
///
/// Traversals are recursive, so stack use grows with [`DerivationTree::depth`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivationTree {
    NonTerminal {
        rule: RuleId,
        production: usize,
        children: Vec<DerivationTree>,
    },
    Terminal(LiteralId),
}

impl DerivationTree {
    /// 1 + deepest child for a non-terminal, 0 for a bare terminal.
    pub fn depth(&self) -> usize {
        match self {
            DerivationTree::Terminal(_) => 0,
            DerivationTree::NonTerminal { children, .. } => {
                1 + children.iter().map(DerivationTree::depth).max().unwrap_or(0)
            }
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            DerivationTree::Terminal(_) => 1,
            DerivationTree::NonTerminal { children, .. } => {
                1 + children.iter().map(DerivationTree::node_count).sum::<usize>()
            }
        }
    }

    pub fn rule(&self) -> Option<RuleId> {
        match self {
            DerivationTree::NonTerminal { rule, .. } => Some(*rule),
            DerivationTree::Terminal(_) => None,
        }
    }

    pub fn children(&self) -> &[DerivationTree] {
        match self {
            DerivationTree::NonTerminal { children, .. } => children,
            DerivationTree::Terminal(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [DerivationTree] {
        match self {
            DerivationTree::NonTerminal { children, .. } => children,
            DerivationTree::Terminal(_) => &mut [],
        }
    }

    /// Literals at the leaves, left to right.
    pub fn leaves(&self) -> Vec<LiteralId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<LiteralId>) {
        match self {
            DerivationTree::Terminal(literal) => out.push(*literal),
            DerivationTree::NonTerminal { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Leaf literals joined with `separator`.
    pub fn to_source(&self, grammar: &Grammar, separator: &str) -> String {
        self.leaves()
            .into_iter()
            .map(|id| grammar.literal(id))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Paths of every non-terminal node, in depth-first pre-order.
    pub fn non_terminal_paths(&self) -> Vec<TreePath> {
        let mut paths = Vec::new();
        let mut path = Vec::new();
        self.collect_paths(&mut path, &mut paths);
        paths
    }

    fn collect_paths(&self, path: &mut TreePath, out: &mut Vec<TreePath>) {
        if let DerivationTree::NonTerminal { children, .. } = self {
            out.push(path.clone());
            for (i, child) in children.iter().enumerate() {
                path.push(i);
                child.collect_paths(path, out);
                path.pop();
            }
        }
    }

    pub fn subtree(&self, path: &[usize]) -> Option<&DerivationTree> {
        path.iter()
            .try_fold(self, |node, &index| node.children().get(index))
    }

    pub fn subtree_mut(&mut self, path: &[usize]) -> Option<&mut DerivationTree> {
        let mut node = self;
        for &index in path {
            node = node.children_mut().get_mut(index)?;
        }
        Some(node)
    }

    /// Swap in `replacement` at `path`, returning the subtree it replaced.
    pub fn replace_subtree(
        &mut self,
        path: &[usize],
        replacement: DerivationTree,
    ) -> Option<DerivationTree> {
        self.subtree_mut(path)
            .map(|slot| std::mem::replace(slot, replacement))
    }

    /// True when this tree is a complete derivation of `grammar`: every
    /// non-terminal uses one of its rule's productions and every leaf is a literal.
    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        match self {
            DerivationTree::Terminal(_) => true,
            DerivationTree::NonTerminal {
                rule,
                production,
                children,
            } => {
                let Some(production) = grammar
                    .get_rule(*rule)
                    .and_then(|r| r.production(*production))
                else {
                    return false;
                };
                production.symbols().len() == children.len()
                    && production
                        .symbols()
                        .iter()
                        .zip(children)
                        .all(|(symbol, child)| match (symbol, child) {
                            (Symbol::Literal(expected), DerivationTree::Terminal(found)) => {
                                expected == found
                            }
                            (Symbol::Rule(expected), DerivationTree::NonTerminal { rule, .. }) => {
                                expected == rule && child.is_complete(grammar)
                            }
                            _ => false,
                        })
            }
        }
    }
}

/// A directly represented individual produced by population initialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeIndividual {
    pub tree: DerivationTree,
    pub method: GenerationMethod,
    pub max_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Grammar, DerivationTree) {
        let grammar = Grammar::parse("<e> ::= <e> + <v> | <v>\n<v> ::= x | y").unwrap();
        let e = grammar.rule_id("e").unwrap();
        let v = grammar.rule_id("v").unwrap();
        let lit = |s: &str| DerivationTree::Terminal(grammar.literal_id(s).unwrap());
        let tree = DerivationTree::NonTerminal {
            rule: e,
            production: 0,
            children: vec![
                DerivationTree::NonTerminal {
                    rule: e,
                    production: 1,
                    children: vec![DerivationTree::NonTerminal {
                        rule: v,
                        production: 0,
                        children: vec![lit("x")],
                    }],
                },
                lit("+"),
                DerivationTree::NonTerminal {
                    rule: v,
                    production: 1,
                    children: vec![lit("y")],
                },
            ],
        };
        (grammar, tree)
    }

    #[test]
    fn test_depth_and_counts() {
        let (grammar, tree) = sample();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.node_count(), 7);
        assert_eq!(DerivationTree::Terminal(LiteralId(0)).depth(), 0);
        assert_eq!(tree.to_source(&grammar, " "), "x + y");
        assert_eq!(tree.to_source(&grammar, ""), "x+y");
        assert!(tree.is_complete(&grammar));
    }

    #[test]
    fn test_paths_and_subtrees() {
        let (grammar, mut tree) = sample();
        let paths = tree.non_terminal_paths();
        assert_eq!(paths, vec![vec![], vec![0], vec![0, 0], vec![2]]);
        assert_eq!(tree.subtree(&[0, 0]).and_then(DerivationTree::rule), grammar.rule_id("v"));
        assert!(tree.subtree(&[5]).is_none());

        let replacement = tree.subtree(&[2]).cloned().unwrap();
        let old = tree.replace_subtree(&[0, 0], replacement).unwrap();
        assert_eq!(old.leaves(), vec![grammar.literal_id("x").unwrap()]);
        assert_eq!(tree.to_source(&grammar, " "), "y + y");
        assert!(tree.is_complete(&grammar));
    }

    #[test]
    fn test_incomplete_tree_detected() {
        let (grammar, mut tree) = sample();
        if let Some(DerivationTree::NonTerminal { production, .. }) = tree.subtree_mut(&[2]) {
            *production = 7;
        }
        assert!(!tree.is_complete(&grammar));
    }
}
