//! Errors raised while reading problem text.

use miette::Diagnostic;
use thiserror::Error;

/// Structural failures of problem ingestion. Any of these aborts the whole
/// import before the knowledge base is touched.
#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    #[error("problem text is empty")]
    #[diagnostic(
        code(plankb::codec::empty_problem),
        help("Provide a `(define (problem …) …)` form.")
    )]
    EmptyProblem,

    #[error("problem does not name its domain")]
    #[diagnostic(
        code(plankb::codec::missing_domain),
        help("Add a `(:domain <name>)` clause to the problem definition.")
    )]
    MissingDomain,

    #[error("problem refers to unknown domain \"{name}\"")]
    #[diagnostic(
        code(plankb::codec::unknown_domain),
        help("The `(:domain …)` clause must name the domain the knowledge base was built on.")
    )]
    UnknownDomain { name: String },

    #[error("syntax error at byte {offset}: {message}")]
    #[diagnostic(
        code(plankb::codec::syntax),
        help("Check that every parenthesis is balanced.")
    )]
    Syntax { offset: usize, message: String },

    #[error("malformed problem: {message}")]
    #[diagnostic(
        code(plankb::codec::structure),
        help(
            "A problem is `(define (problem <name>) (:domain <name>) (:objects …) \
             (:init …) (:goal …))`."
        )
    )]
    Structure { message: String },

    #[error("unsupported construct \"{construct}\"")]
    #[diagnostic(
        code(plankb::codec::unsupported),
        help(
            "Goals support and, or, not, comparisons and arithmetic over ground \
             functions. Quantifiers and implications are not supported."
        )
    )]
    Unsupported { construct: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_namespaced() {
        let err = CodecError::UnknownDomain {
            name: "blocks".into(),
        };
        assert!(err.to_string().contains("blocks"));
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("plankb::codec::unknown_domain")
        );
    }
}
