//! Problem emission: the knowledge base rendered as a PDDL problem.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::CaseFolding;
use crate::kb::KnowledgeBase;

/// Layout and naming options for [`KnowledgeBase::get_problem_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Name written in `(problem …)`.
    pub problem_name: String,
    /// Casing of predicate, function and type identifiers.
    pub case_folding: CaseFolding,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            problem_name: "problem_1".into(),
            case_folding: CaseFolding::LowerIdentifiers,
            indent: 2,
        }
    }
}

impl KnowledgeBase {
    /// Render the current state with default options.
    pub fn get_problem(&self) -> String {
        self.get_problem_with(&EmitOptions::default())
    }

    /// Render the current state as a problem file.
    ///
    /// Order is fixed: objects (domain constants skipped), predicates,
    /// conditionals, functions, then the goal. An empty goal is omitted.
    pub fn get_problem_with(&self, options: &EmitOptions) -> String {
        let fold = options.case_folding;
        let one = " ".repeat(options.indent);
        let two = one.repeat(2);
        let mut out = String::new();

        let _ = writeln!(out, "(define (problem {})", options.problem_name);
        let _ = writeln!(out, "{one}(:domain {})", self.domain().name());

        let _ = writeln!(out, "{one}(:objects");
        for instance in self.instances() {
            if self.domain().is_constant(instance) {
                tracing::debug!(instance = %instance, "skipping domain constant in :objects");
                continue;
            }
            let _ = writeln!(out, "{two}{} - {}", instance.name, fold.apply(&instance.type_name));
        }
        let _ = writeln!(out, "{one})");

        let _ = writeln!(out, "{one}(:init");
        for predicate in self.predicates() {
            let _ = writeln!(out, "{two}{}", predicate.render(fold));
        }
        for conditional in self.conditionals() {
            let _ = writeln!(out, "{two}{}", conditional.render(0, fold));
        }
        for function in self.functions() {
            let _ = writeln!(out, "{two}{}", function.render(fold));
        }
        let _ = writeln!(out, "{one})");

        if !self.goal().is_empty() {
            let _ = writeln!(out, "{one}(:goal {})", self.goal().render(0, fold));
        }
        out.push_str(")\n");
        out
    }
}
