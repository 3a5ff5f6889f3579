//! Type and arity checking against the domain contract.
//!
//! Enforcement is fail-closed: an unknown symbol, an unresolved instance or a
//! single mismatched position invalidates the whole atom.

use super::KnowledgeBase;
use crate::domain::Signature;
use crate::tree::{Function, NodeId, NodeKind, NodeType, Param, Predicate, Tree};

impl KnowledgeBase {
    /// Whether the domain declares `type_name`.
    pub fn is_valid_type(&self, type_name: &str) -> bool {
        self.domain.types().contains(type_name)
    }

    /// Arity and per-position type check of a ground predicate.
    pub fn is_valid_predicate(&self, predicate: &Predicate) -> bool {
        match self.domain.predicate(&predicate.name) {
            Some(sig) => self.params_fit(&sig, &predicate.params),
            None => false,
        }
    }

    /// Arity and per-position type check of a ground function.
    pub fn is_valid_function(&self, function: &Function) -> bool {
        match self.domain.function(&function.name) {
            Some(sig) => self.params_fit(&sig, &function.params),
            None => false,
        }
    }

    fn params_fit(&self, sig: &Signature, params: &[Param]) -> bool {
        sig.arity() == params.len()
            && sig.params.iter().zip(params).all(|(spec, param)| {
                self.get_instance(&param.name)
                    .is_some_and(|inst| spec.accepts(&inst.type_name))
            })
    }

    // -----------------------------------------------------------------------
    // Canonical names
    // -----------------------------------------------------------------------

    /// `predicate` with its name spelled as the domain declares it.
    ///
    /// Signature lookup may be case-insensitive, while stored facts compare
    /// names exactly; every fact is renamed before it is compared or stored.
    pub(crate) fn canonical_predicate(&self, mut predicate: Predicate) -> Predicate {
        if let Some(sig) = self.domain.predicate(&predicate.name) {
            predicate.name = sig.name;
        }
        predicate
    }

    pub(crate) fn canonical_function(&self, mut function: Function) -> Function {
        if let Some(sig) = self.domain.function(&function.name) {
            function.name = sig.name;
        }
        function
    }

    /// `tree` with every predicate and function leaf renamed canonically.
    pub(crate) fn canonical_tree(&self, mut tree: Tree) -> Tree {
        tree.rename_atoms(|node_type, name| {
            let sig = match node_type {
                NodeType::Function => self.domain.function(name),
                _ => self.domain.predicate(name),
            };
            sig.map(|sig| sig.name).filter(|canonical| canonical != name)
        });
        tree
    }

    /// Recursive validity of a whole tree. The empty tree is valid.
    pub fn check_tree_types(&self, tree: &Tree) -> bool {
        tree.is_empty() || self.check_node_types(tree, 0)
    }

    /// Recursive validity of the subtree rooted at `id`.
    pub fn check_node_types(&self, tree: &Tree, id: NodeId) -> bool {
        let Some(node) = tree.node(id) else {
            tracing::warn!(node = id, len = tree.len(), "node id out of range during type check");
            return false;
        };
        let all_children = || node.children.iter().all(|&c| self.check_node_types(tree, c));
        match &node.kind {
            NodeKind::And
            | NodeKind::Or
            | NodeKind::OneOf
            | NodeKind::Expression(_)
            | NodeKind::FunctionModifier(_) => all_children(),
            NodeKind::Not | NodeKind::Unknown => {
                if node.children.len() != 1 {
                    tracing::warn!(
                        node = id,
                        node_type = %node.node_type(),
                        children = node.children.len(),
                        "node must have exactly one child"
                    );
                    return false;
                }
                all_children()
            }
            NodeKind::Predicate(p) => self.is_valid_predicate(p),
            NodeKind::Function(f) => self.is_valid_function(f),
            NodeKind::Number(_) => true,
        }
    }
}

/// Head-shape check for contingent facts.
///
/// UNKNOWN wraps exactly one predicate, ONE_OF wraps one or more predicates,
/// OR wraps exactly two predicates. Returns the reason on failure.
pub(crate) fn conditional_shape(tree: &Tree) -> Result<(), String> {
    let Some(root) = tree.root() else {
        return Err("empty tree".into());
    };
    let predicate_children = root
        .children
        .iter()
        .all(|&c| tree.node(c).is_some_and(|n| n.node_type() == NodeType::Predicate));
    let arity_ok = match root.node_type() {
        NodeType::Unknown => root.children.len() == 1,
        NodeType::OneOf => !root.children.is_empty(),
        NodeType::Or => root.children.len() == 2,
        other => return Err(format!("{other} cannot head a conditional")),
    };
    if !arity_ok {
        return Err(format!(
            "{} with {} children",
            root.node_type(),
            root.children.len()
        ));
    }
    if !predicate_children {
        return Err(format!("{} children must be predicates", root.node_type()));
    }
    Ok(())
}
