//! Problem ingestion: problem text merged into the knowledge base.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::sexpr::remove_comments;
use super::{CodecError, PddlReader, ProblemParser};
use crate::domain::StaticDomain;
use crate::error::{KbResult, PlanKbError, PlanKbResult};
use crate::kb::KnowledgeBase;
use crate::tree::{NodeKind, NodeType, Tree};

/// What an import added, and which items it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub problem: String,
    pub instances: usize,
    pub predicates: usize,
    pub functions: usize,
    pub conditionals: usize,
    pub goal_set: bool,
    /// One line per rejected item: the item and the reason.
    pub skipped: Vec<String>,
}

impl ImportReport {
    /// Record the outcome of one item. Failures are logged and skipped.
    fn accept(&mut self, item: &str, outcome: KbResult<()>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(item, error = %e, "skipping problem item");
                self.skipped.push(format!("{item}: {e}"));
                false
            }
        }
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "problem: {}", self.problem)?;
        writeln!(f, "  instances:    {}", self.instances)?;
        writeln!(f, "  predicates:   {}", self.predicates)?;
        writeln!(f, "  functions:    {}", self.functions)?;
        writeln!(f, "  conditionals: {}", self.conditionals)?;
        writeln!(f, "  goal:         {}", if self.goal_set { "set" } else { "unset" })?;
        if !self.skipped.is_empty() {
            writeln!(f, "  skipped ({}):", self.skipped.len())?;
            for line in &self.skipped {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}

impl KnowledgeBase {
    /// Build a knowledge base from a TOML domain file and a problem file.
    pub fn from_files(
        domain: impl AsRef<Path>,
        problem: impl AsRef<Path>,
    ) -> PlanKbResult<(Self, ImportReport)> {
        let domain = StaticDomain::load(domain)?;
        let problem = problem.as_ref();
        let text = std::fs::read_to_string(problem).map_err(|source| PlanKbError::Io {
            path: problem.display().to_string(),
            source,
        })?;
        let mut kb = KnowledgeBase::new(Arc::new(domain));
        let report = kb.add_problem(&text)?;
        Ok((kb, report))
    }

    /// Merge a problem into the knowledge base using [`PddlReader`].
    pub fn add_problem(&mut self, text: &str) -> Result<ImportReport, CodecError> {
        self.add_problem_with(text, &PddlReader)
    }

    /// Merge a problem into the knowledge base.
    ///
    /// Blank input, a missing or unknown domain name, and parse faults reject
    /// the whole call before anything is stored. Past that point every item is
    /// imported on its own: a rejected object, fact or goal is logged, listed
    /// in the report, and skipped.
    pub fn add_problem_with(
        &mut self,
        text: &str,
        parser: &dyn ProblemParser,
    ) -> Result<ImportReport, CodecError> {
        if text.trim().is_empty() {
            tracing::warn!("empty problem");
            return Err(CodecError::EmptyProblem);
        }
        let text = remove_comments(&text.to_lowercase());

        let domain_name = match parser.domain_name(&text) {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                tracing::warn!("problem does not name its domain");
                return Err(CodecError::MissingDomain);
            }
        };
        if !self.domain().exists_domain(&domain_name) {
            tracing::warn!(domain = %domain_name, "problem refers to unknown domain");
            return Err(CodecError::UnknownDomain { name: domain_name });
        }

        let parsed = parser.parse(&text, self.domain()).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse problem");
            e
        })?;

        let mut report = ImportReport {
            problem: parsed.name.clone(),
            ..Default::default()
        };

        for instance in self.domain().constants().into_iter().chain(parsed.objects) {
            let item = instance.to_string();
            let outcome = self.add_instance(instance);
            if report.accept(&item, outcome) {
                report.instances += 1;
            }
        }

        for fact in parsed.init {
            let item = fact.to_string();
            let is_function = fact.root_type() == Some(NodeType::Function);
            let outcome = self.add_init_fact(fact);
            if report.accept(&item, outcome) {
                if is_function {
                    report.functions += 1;
                } else {
                    report.predicates += 1;
                }
            }
        }

        for conditional in parsed.init_cond {
            let item = conditional.to_string();
            let outcome = self.add_conditional(conditional);
            if report.accept(&item, outcome) {
                report.conditionals += 1;
            }
        }

        if let Some(goal) = parsed.goal {
            let item = goal.to_string();
            match self.set_goal(goal) {
                Ok(()) => report.goal_set = true,
                Err(e) => {
                    tracing::warn!(goal = %item, error = %e, "goal not imported");
                    report.skipped.push(format!("goal {item}: {e}"));
                }
            }
        }

        tracing::info!(
            problem = %report.problem,
            instances = report.instances,
            predicates = report.predicates,
            functions = report.functions,
            conditionals = report.conditionals,
            goal_set = report.goal_set,
            skipped = report.skipped.len(),
            "problem imported"
        );
        Ok(report)
    }

    /// Store one certain init fact by its root kind.
    fn add_init_fact(&mut self, fact: Tree) -> KbResult<()> {
        match fact.root().map(|root| root.kind.clone()) {
            Some(NodeKind::Predicate(p)) => self.add_predicate(p),
            Some(NodeKind::Function(f)) => self.add_function(f),
            Some(_) => self.add_conditional(fact),
            None => Ok(()),
        }
    }
}
