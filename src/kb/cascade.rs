//! Retraction cascade for instance removal.
//!
//! When an object leaves the world, everything that names it goes too: facts,
//! fluents, goal subgoals and contingent facts. Each container is filtered to
//! the retained subset in one pass.

use super::KnowledgeBase;
use crate::tree::{NodeType, Predicate, Tree};

/// Summary of one removal cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub predicates: usize,
    pub functions: usize,
    pub conditionals: usize,
    /// Top-level subgoals dropped from the goal.
    pub subgoals: usize,
}

/// Rebuild `goal` without the maximal subgoals that mention `instance`.
///
/// The top-level AND/OR combinator is preserved. Returns the new goal and the
/// number of dropped subgoals.
fn prune_goal(goal: &Tree, instance: &str) -> (Tree, usize) {
    let subgoals = goal.top_level_subtrees();
    let total = subgoals.len();
    let survivors: Vec<Tree> = subgoals
        .into_iter()
        .filter(|sub| !sub.mentions(instance))
        .collect();
    let dropped = total - survivors.len();
    let rebuilt = match goal.root_type() {
        Some(root @ (NodeType::And | NodeType::Or)) => {
            Tree::from_subtrees(root, &survivors).unwrap_or_default()
        }
        _ => survivors.into_iter().next().unwrap_or_default(),
    };
    (rebuilt, dropped)
}

impl KnowledgeBase {
    /// Remove the named instance and everything that references it.
    ///
    /// Returns `false` if no such instance exists.
    pub fn remove_instance(&mut self, name: &str) -> bool {
        self.remove_instance_with_report(name).is_some()
    }

    /// Like [`remove_instance`](Self::remove_instance), reporting what the cascade removed.
    pub fn remove_instance_with_report(&mut self, name: &str) -> Option<CascadeReport> {
        let pos = self.instances.iter().position(|i| i.name == name)?;
        self.instances.remove(pos);

        let mut report = CascadeReport::default();

        let before = self.predicates.len();
        self.predicates.retain(|p| !p.mentions(name));
        report.predicates = before - self.predicates.len();

        let before = self.functions.len();
        self.functions.retain(|f| !f.mentions(name));
        report.functions = before - self.functions.len();

        if self.goal.mentions(name) {
            let (goal, dropped) = prune_goal(&self.goal, name);
            self.goal = goal;
            report.subgoals = dropped;
        }

        report.conditionals = self.prune_conditionals(name);

        tracing::debug!(
            instance = name,
            predicates = report.predicates,
            functions = report.functions,
            conditionals = report.conditionals,
            subgoals = report.subgoals,
            "instance removed"
        );
        Some(report)
    }

    /// Drop unknown/or facts naming `instance` and strip it from one-ofs.
    ///
    /// Returns how many stored conditionals were dropped or rewritten.
    fn prune_conditionals(&mut self, instance: &str) -> usize {
        let mut touched = 0;
        let mut folded: Vec<Predicate> = Vec::new();
        let kept: Vec<Tree> = std::mem::take(&mut self.conditionals)
            .into_iter()
            .filter_map(|c| {
                if !c.mentions(instance) {
                    return Some(c);
                }
                touched += 1;
                if c.root_type() != Some(NodeType::OneOf) {
                    return None;
                }
                let mut rest: Vec<Predicate> = c
                    .predicates()
                    .into_iter()
                    .filter(|p| !p.mentions(instance))
                    .cloned()
                    .collect();
                match rest.len() {
                    0 => None,
                    1 => {
                        folded.extend(rest.pop());
                        None
                    }
                    _ => Some(Tree::one_of(rest)),
                }
            })
            .collect();
        self.conditionals = kept;

        for fact in folded {
            if let Err(e) = self.add_predicate(fact) {
                tracing::warn!(error = %e, "could not fold one-of left with a single disjunct");
            }
        }
        touched
    }
}
