//! Export types for serializing knowledge-base state.
//!
//! Trees are exported twice: as rendered PDDL text for people and in the flat
//! node-record shape for programs.

use serde::{Deserialize, Serialize};

use crate::instance::Instance;
use crate::kb::KnowledgeBase;
use crate::tree::{Function, NodeRecord, NodeType, Predicate, Tree};

/// Exported expression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeExport {
    /// Root node type, absent for the empty tree.
    pub head: Option<NodeType>,
    /// Compact PDDL rendering.
    pub text: String,
    /// Flat node records, root at index 0.
    pub nodes: Vec<NodeRecord>,
}

impl From<&Tree> for TreeExport {
    fn from(tree: &Tree) -> Self {
        Self {
            head: tree.root_type(),
            text: tree.to_string(),
            nodes: tree.to_records(),
        }
    }
}

/// Snapshot of a whole knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbExport {
    pub domain: String,
    pub instances: Vec<Instance>,
    pub predicates: Vec<Predicate>,
    pub functions: Vec<Function>,
    pub conditionals: Vec<TreeExport>,
    pub goal: TreeExport,
}

impl KnowledgeBase {
    /// Snapshot the current state.
    pub fn export(&self) -> KbExport {
        KbExport {
            domain: self.domain().name().to_string(),
            instances: self.instances().to_vec(),
            predicates: self.predicates().to_vec(),
            functions: self.functions().to_vec(),
            conditionals: self.conditionals().iter().map(TreeExport::from).collect(),
            goal: TreeExport::from(self.goal()),
        }
    }
}
