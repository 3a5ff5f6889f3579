//! Problem text codec: PDDL problem files in and out of the knowledge base.
//!
//! Tokenizing and structuring problem text is delegated to a
//! [`ProblemParser`]. [`PddlReader`] is the bundled implementation; embedders
//! with their own grammar plug it in through
//! [`KnowledgeBase::add_problem_with`](crate::kb::KnowledgeBase::add_problem_with).

mod emit;
mod error;
mod ingest;
mod reader;
pub mod sexpr;

use crate::domain::DomainContract;
use crate::instance::Instance;
use crate::tree::Tree;

pub use crate::tree::CaseFolding;
pub use emit::EmitOptions;
pub use error::CodecError;
pub use ingest::ImportReport;
pub use reader::PddlReader;

/// A problem as structured by a [`ProblemParser`], not yet validated.
#[derive(Debug, Clone, Default)]
pub struct ParsedProblem {
    /// Problem name from `(problem …)`.
    pub name: String,
    /// Declared `:objects`, in order.
    pub objects: Vec<Instance>,
    /// Certain init facts: single PREDICATE or FUNCTION trees.
    pub init: Vec<Tree>,
    /// Uncertain init facts headed by UNKNOWN, ONE_OF or OR.
    pub init_cond: Vec<Tree>,
    /// The goal, if the problem declares one.
    pub goal: Option<Tree>,
}

/// Turns problem text into a [`ParsedProblem`].
///
/// Input handed to a parser is already lower-cased and stripped of comments.
pub trait ProblemParser {
    /// The name in the `(:domain …)` clause, if one can be found.
    fn domain_name(&self, text: &str) -> Option<String>;

    /// Structure the whole problem. Faults abort the import.
    fn parse(&self, text: &str, domain: &dyn DomainContract) -> Result<ParsedProblem, CodecError>;
}
