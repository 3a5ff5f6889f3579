//! Flat exchange shape for expression trees.
//!
//! Collaborators outside the process exchange trees as an ordered array of
//! [`NodeRecord`]s in which `node_id` equals the array index and the root is
//! index 0. Every record carries all payload fields; only the ones relevant to
//! its `node_type` are read back.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{ExprOp, Function, ModifierOp, Node, NodeKind, NodeType, Param, Predicate, Tree};
use crate::error::{TreeError, TreeResult};

/// One node in the flat exchange shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_type: NodeType,
    pub node_id: usize,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Param>,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExprOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ModifierOp>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let mut record = NodeRecord {
            node_type: node.node_type(),
            node_id: node.id,
            children: node.children.clone(),
            name: String::new(),
            parameters: Vec::new(),
            negate: false,
            value: 0.0,
            expression: None,
            modifier: None,
        };
        match &node.kind {
            NodeKind::Predicate(p) => {
                record.name = p.name.clone();
                record.parameters = p.params.clone();
                record.negate = p.negate;
            }
            NodeKind::Function(f) => {
                record.name = f.name.clone();
                record.parameters = f.params.clone();
                record.value = f.value;
            }
            NodeKind::Expression(op) => record.expression = Some(*op),
            NodeKind::FunctionModifier(op) => record.modifier = Some(*op),
            NodeKind::Number(v) => record.value = *v,
            NodeKind::And | NodeKind::Or | NodeKind::Not | NodeKind::Unknown | NodeKind::OneOf => {}
        }
        record
    }
}

impl NodeRecord {
    fn into_kind(self, index: usize) -> TreeResult<NodeKind> {
        let missing = |field| TreeError::MissingPayload {
            node: index,
            node_type: self.node_type.to_string(),
            field,
        };
        Ok(match self.node_type {
            NodeType::And => NodeKind::And,
            NodeType::Or => NodeKind::Or,
            NodeType::Not => NodeKind::Not,
            NodeType::Unknown => NodeKind::Unknown,
            NodeType::OneOf => NodeKind::OneOf,
            NodeType::Predicate => {
                if self.name.is_empty() {
                    return Err(missing("name"));
                }
                NodeKind::Predicate(Predicate {
                    name: self.name,
                    params: self.parameters,
                    negate: self.negate,
                })
            }
            NodeType::Function => {
                if self.name.is_empty() {
                    return Err(missing("name"));
                }
                NodeKind::Function(Function {
                    name: self.name,
                    params: self.parameters,
                    value: self.value,
                })
            }
            NodeType::Expression => {
                NodeKind::Expression(self.expression.ok_or_else(|| missing("expression"))?)
            }
            NodeType::FunctionModifier => {
                NodeKind::FunctionModifier(self.modifier.ok_or_else(|| missing("modifier"))?)
            }
            NodeType::Number => NodeKind::Number(self.value),
        })
    }
}

impl Tree {
    /// Flatten into the exchange shape.
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.nodes().iter().map(NodeRecord::from).collect()
    }

    /// Rebuild a tree from the exchange shape.
    ///
    /// Rejects records whose `node_id` differs from their index, dangling child
    /// ids, nodes with more than one parent (or a parented root), nodes not
    /// reachable from the root, and records missing their kind's payload.
    pub fn from_records(records: Vec<NodeRecord>) -> TreeResult<Tree> {
        let len = records.len();
        let mut parents = vec![0usize; len];

        for (index, record) in records.iter().enumerate() {
            if record.node_id != index {
                return Err(TreeError::IdMismatch {
                    index,
                    node_id: record.node_id,
                });
            }
            for &child in &record.children {
                if child >= len {
                    return Err(TreeError::DanglingChild { node: index, child });
                }
                parents[child] += 1;
            }
        }

        if let Some(node) = parents
            .iter()
            .enumerate()
            .position(|(i, &count)| count > 1 || (i == 0 && count > 0))
        {
            return Err(TreeError::SharedNode { node });
        }

        let mut reached = vec![false; len];
        let mut queue: VecDeque<usize> = VecDeque::new();
        if len > 0 {
            reached[0] = true;
            queue.push_back(0);
        }
        while let Some(current) = queue.pop_front() {
            for &child in &records[current].children {
                if !reached[child] {
                    reached[child] = true;
                    queue.push_back(child);
                }
            }
        }
        if let Some(node) = reached.iter().position(|r| !r) {
            return Err(TreeError::Unreachable { node });
        }

        let mut nodes = Vec::with_capacity(len);
        for (index, record) in records.into_iter().enumerate() {
            let children = record.children.clone();
            nodes.push(Node {
                id: index,
                kind: record.into_kind(index)?,
                children,
            });
        }
        Ok(Tree { nodes })
    }
}

impl From<Tree> for Vec<NodeRecord> {
    fn from(tree: Tree) -> Self {
        tree.to_records()
    }
}

impl TryFrom<Vec<NodeRecord>> for Tree {
    type Error = TreeError;

    fn try_from(records: Vec<NodeRecord>) -> TreeResult<Tree> {
        Tree::from_records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        Tree::and(vec![
            Tree::from_predicate(Predicate::new("at", ["r", "k"]).negated()),
            Tree::expression(
                ExprOp::Less,
                Tree::from_function(Function::new("battery", ["r"], 4.0)),
                Tree::number(10.0),
            ),
        ])
    }

    #[test]
    fn json_shape_uses_flat_records() {
        let json = serde_json::to_value(sample()).unwrap();
        let nodes = json.as_array().unwrap();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0]["node_type"], "AND");
        assert_eq!(nodes[0]["children"], serde_json::json!([1, 2]));
        assert_eq!(nodes[1]["name"], "at");
        assert_eq!(nodes[1]["negate"], true);
        assert_eq!(nodes[2]["expression"], "less");
    }

    #[test]
    fn json_reload_preserves_structure() {
        let tree = sample();
        let text = serde_json::to_string(&tree).unwrap();
        let back: Tree = serde_json::from_str(&text).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn rejects_unrecognized_node_type() {
        let json = r#"[{"node_type": "BOGUS", "node_id": 0}]"#;
        let err = serde_json::from_str::<Tree>(json).unwrap_err();
        assert!(err.to_string().contains("unknown variant `BOGUS`"), "{err}");

        let records = serde_json::from_str::<Vec<NodeRecord>>(json);
        assert!(records.is_err());
    }

    #[test]
    fn rejects_id_mismatch() {
        let mut records = sample().to_records();
        records[1].node_id = 7;
        assert!(matches!(
            Tree::from_records(records),
            Err(TreeError::IdMismatch { index: 1, node_id: 7 })
        ));
    }

    #[test]
    fn rejects_dangling_and_shared_children() {
        let mut dangling = sample().to_records();
        dangling[0].children.push(99);
        assert!(matches!(
            Tree::from_records(dangling),
            Err(TreeError::DanglingChild { node: 0, child: 99 })
        ));

        let mut shared = sample().to_records();
        shared[2].children.push(1);
        assert!(matches!(
            Tree::from_records(shared),
            Err(TreeError::SharedNode { node: 1 })
        ));
    }

    #[test]
    fn rejects_orphans_and_missing_payload() {
        let mut orphan = sample().to_records();
        orphan[0].children.pop();
        assert!(matches!(
            Tree::from_records(orphan),
            Err(TreeError::Unreachable { node: 2 })
        ));

        let mut nameless = sample().to_records();
        nameless[1].name.clear();
        assert!(matches!(
            Tree::from_records(nameless),
            Err(TreeError::MissingPayload { node: 1, field: "name", .. })
        ));
    }

    #[test]
    fn empty_array_is_empty_tree() {
        assert!(Tree::from_records(Vec::new()).unwrap().is_empty());
    }
}
