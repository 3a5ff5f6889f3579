//! Rich diagnostic error types for the plan-kb knowledge base.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know exactly why a mutation
//! was rejected. A rejected knowledge-base operation never changes state.

use miette::Diagnostic;
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;

/// Top-level error type for plan-kb.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum PlanKbError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}")]
    #[diagnostic(
        code(plankb::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Tree errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TreeError {
    #[error("node at index {index} declares node_id {node_id}")]
    #[diagnostic(
        code(plankb::tree::id_mismatch),
        help(
            "In the exchange shape a node's id is its position in the array. \
             Renumber the nodes so that node_id == index."
        )
    )]
    IdMismatch { index: usize, node_id: usize },

    #[error("node {node} references missing child {child}")]
    #[diagnostic(
        code(plankb::tree::dangling_child),
        help("Every child id must index a node of the same array.")
    )]
    DanglingChild { node: usize, child: usize },

    #[error("node {node} has more than one parent")]
    #[diagnostic(
        code(plankb::tree::shared_node),
        help(
            "Expression trees are trees, not graphs: every non-root node must be \
             referenced by exactly one parent. Duplicate the shared subtree instead."
        )
    )]
    SharedNode { node: usize },

    #[error("node {node} is not reachable from the root")]
    #[diagnostic(
        code(plankb::tree::unreachable),
        help("Remove the orphaned node or attach it to a parent.")
    )]
    Unreachable { node: usize },

    #[error("node {node} of type {node_type} is missing its {field}")]
    #[diagnostic(
        code(plankb::tree::missing_payload),
        help(
            "Predicate and function nodes need a name, expression nodes an operator, \
             function-modifier nodes a modifier."
        )
    )]
    MissingPayload {
        node: usize,
        node_type: String,
        field: &'static str,
    },

    #[error("cannot read \"{input}\" as a ground atom: {message}")]
    #[diagnostic(
        code(plankb::tree::bad_atom),
        help(
            "Ground atoms are written as `(name arg1 arg2 ...)`; functions with a value \
             as `(= (name arg1 ...) 4.5)`."
        )
    )]
    BadAtom { input: String, message: String },
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DomainError {
    #[error("failed to read domain file: {path}")]
    #[diagnostic(
        code(plankb::domain::read),
        help("Check that the domain file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse domain description: {message}")]
    #[diagnostic(
        code(plankb::domain::parse),
        help(
            "The domain description must be valid TOML with a top-level `name` and \
             optional [types], [predicates], [functions] and [constants] tables."
        )
    )]
    Parse { message: String },

    #[error("type \"{type_name}\" declares unknown parent \"{parent}\"")]
    #[diagnostic(
        code(plankb::domain::unknown_parent),
        help("Declare the parent type in [types] as well (use \"object\" for a root type).")
    )]
    UnknownParent { type_name: String, parent: String },

    #[error("type hierarchy contains a cycle through \"{type_name}\"")]
    #[diagnostic(
        code(plankb::domain::type_cycle),
        help("A type cannot be its own (transitive) subtype.")
    )]
    TypeCycle { type_name: String },

    #[error("{symbol} uses undeclared type \"{type_name}\"")]
    #[diagnostic(
        code(plankb::domain::unknown_type),
        help("Every parameter and constant type must appear in [types].")
    )]
    UnknownType { symbol: String, type_name: String },
}

// ---------------------------------------------------------------------------
// Knowledge-base errors
// ---------------------------------------------------------------------------

/// Why a knowledge-base mutation was rejected.
#[derive(Debug, Error, Diagnostic)]
pub enum KnowledgeError {
    #[error("unknown type \"{type_name}\"")]
    #[diagnostic(
        code(plankb::kb::unknown_type),
        help("Instances can only have types declared by the domain.")
    )]
    UnknownType { type_name: String },

    #[error("instance \"{name}\" already exists with type \"{existing}\", not \"{requested}\"")]
    #[diagnostic(
        code(plankb::kb::instance_conflict),
        help("Instance names are global keys. Remove the existing instance first to retype it.")
    )]
    InstanceConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("predicate {expr} does not match the domain signature")]
    #[diagnostic(
        code(plankb::kb::invalid_predicate),
        help(
            "The predicate must be declared by the domain, have the declared arity, and \
             every argument must be an existing instance of the declared type or a subtype."
        )
    )]
    InvalidPredicate { expr: String },

    #[error("function {expr} does not match the domain signature")]
    #[diagnostic(
        code(plankb::kb::invalid_function),
        help(
            "The function must be declared by the domain, have the declared arity, and \
             every argument must be an existing instance of the declared type or a subtype."
        )
    )]
    InvalidFunction { expr: String },

    #[error("function {expr} is not in the knowledge base")]
    #[diagnostic(
        code(plankb::kb::function_not_found),
        help("Use add_function to insert a new function value.")
    )]
    FunctionNotFound { expr: String },

    #[error("expression {expr} failed type validation")]
    #[diagnostic(
        code(plankb::kb::invalid_tree),
        help(
            "Every predicate and function in the tree must be valid against the domain, \
             and NOT/UNKNOWN nodes must have exactly one child."
        )
    )]
    InvalidTree { expr: String },

    #[error("malformed conditional {expr}: {reason}")]
    #[diagnostic(
        code(plankb::kb::malformed_conditional),
        help(
            "Conditionals are (unknown P), (oneof P1 ... Pn) or (or P Q) where every \
             child is a ground predicate."
        )
    )]
    MalformedConditional { expr: String, reason: String },

    #[error("conditional {expr} is already stored")]
    #[diagnostic(
        code(plankb::kb::duplicate_conditional),
        help("Each contingent fact is stored once; remove it before re-adding.")
    )]
    DuplicateConditional { expr: String },
}

/// Result type alias for plan-kb operations.
pub type PlanKbResult<T> = std::result::Result<T, PlanKbError>;

/// Result type for knowledge-base mutations.
pub type KbResult<T> = std::result::Result<T, KnowledgeError>;

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Result type for domain loading.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_error_mentions_instance() {
        let err = KnowledgeError::InstanceConflict {
            name: "r2d2".into(),
            existing: "robot".into(),
            requested: "room".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("r2d2"));
        assert!(msg.contains("robot"));
        assert!(msg.contains("room"));
    }

    #[test]
    fn top_level_wraps_transparently() {
        let err: PlanKbError = KnowledgeError::UnknownType {
            type_name: "spaceship".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown type \"spaceship\"");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("plankb::kb::unknown_type")
        );
    }

    #[test]
    fn tree_error_codes() {
        let err = TreeError::DanglingChild { node: 0, child: 7 };
        assert!(err.to_string().contains('7'));
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("plankb::tree::dangling_child")
        );
    }
}
