//! Contingent facts: `(unknown P)`, `(oneof P1 … Pn)` and `(or P Q)`.
//!
//! A one-of with a single disjunct is no longer uncertain and is stored as a
//! plain predicate. Resolving an unknown fact removes it as a candidate from
//! every one-of that listed it.

use super::validate::conditional_shape;
use super::{KnowledgeBase, rejected};
use crate::error::{KbResult, KnowledgeError};
use crate::tree::{NodeType, Predicate, Tree};

/// The single disjunct of a one-child ONE_OF, if `tree` is one.
fn singleton_disjunct(tree: &Tree) -> Option<Predicate> {
    let root = tree.root()?;
    if root.node_type() != NodeType::OneOf || root.children.len() != 1 {
        return None;
    }
    tree.node(root.children[0])?.as_predicate().cloned()
}

/// `one_of` without any disjunct matching `removed`, or `None` if nothing matched.
fn without_disjunct(one_of: &Tree, removed: &Predicate) -> Option<Vec<Predicate>> {
    let disjuncts = one_of.predicates();
    if !disjuncts.iter().any(|p| p.same_fact(removed)) {
        return None;
    }
    Some(
        disjuncts
            .into_iter()
            .filter(|p| !p.same_fact(removed))
            .cloned()
            .collect(),
    )
}

impl KnowledgeBase {
    /// Store a contingent fact.
    ///
    /// Rejects malformed heads, trees that fail type checking, and facts that
    /// are already stored. A single-disjunct one-of becomes a predicate.
    pub fn add_conditional(&mut self, conditional: Tree) -> KbResult<()> {
        if let Err(reason) = conditional_shape(&conditional) {
            return rejected(
                "add_conditional",
                KnowledgeError::MalformedConditional {
                    expr: conditional.to_string(),
                    reason,
                },
            );
        }
        if !self.check_tree_types(&conditional) {
            return rejected(
                "add_conditional",
                KnowledgeError::InvalidTree {
                    expr: conditional.to_string(),
                },
            );
        }
        let conditional = self.canonical_tree(conditional);
        if self.exist_conditional(&conditional) {
            return rejected(
                "add_conditional",
                KnowledgeError::DuplicateConditional {
                    expr: conditional.to_string(),
                },
            );
        }
        self.store_conditional(conditional)
    }

    /// Store an already validated conditional, folding singleton one-ofs.
    fn store_conditional(&mut self, conditional: Tree) -> KbResult<()> {
        match singleton_disjunct(&conditional) {
            Some(fact) => self.add_predicate(fact),
            None => {
                self.conditionals.push(conditional);
                Ok(())
            }
        }
    }

    /// Remove the first stored conditional equal to `conditional`.
    ///
    /// Removing `(unknown P)` also drops `P` from every stored one-of that
    /// lists it. A one-of left with one disjunct becomes a predicate; one left
    /// with none disappears. Absent conditionals succeed without change.
    pub fn remove_conditional(&mut self, conditional: &Tree) -> KbResult<()> {
        if !self.check_tree_types(conditional) {
            return rejected(
                "remove_conditional",
                KnowledgeError::InvalidTree {
                    expr: conditional.to_string(),
                },
            );
        }
        let conditional = self.canonical_tree(conditional.clone());
        let Some(pos) = self.conditionals.iter().position(|c| c.matches(&conditional)) else {
            return Ok(());
        };
        self.conditionals.remove(pos);

        if conditional.root_type() == Some(NodeType::Unknown) {
            if let Some(resolved) = conditional.predicates().first() {
                let resolved = (*resolved).clone();
                self.resolve_unknown(&resolved)?;
            }
        }
        Ok(())
    }

    /// Rewrite every one-of that lists `resolved` without it.
    fn resolve_unknown(&mut self, resolved: &Predicate) -> KbResult<()> {
        let mut rewritten = Vec::new();
        self.conditionals.retain(|c| {
            if c.root_type() != Some(NodeType::OneOf) {
                return true;
            }
            match without_disjunct(c, resolved) {
                Some(rest) => {
                    rewritten.push(rest);
                    false
                }
                None => true,
            }
        });
        for rest in rewritten {
            tracing::debug!(
                resolved = %resolved,
                remaining = rest.len(),
                "rewriting one-of after unknown fact was removed"
            );
            if !rest.is_empty() {
                self.store_conditional(Tree::one_of(rest))?;
            }
        }
        Ok(())
    }
}
