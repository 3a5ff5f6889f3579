//! Structural algorithms over expression trees: equality, subtree extraction,
//! leaf collection, and reconstruction from subtrees.

use super::{Function, Node, NodeId, NodeKind, NodeType, Predicate, Tree};

impl Node {
    /// Local structural equality: same kind and same payload key.
    ///
    /// Predicates compare name, parameter names and negation; functions compare
    /// name and parameter names. Children are not compared.
    pub fn matches(&self, other: &Node) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Predicate(a), NodeKind::Predicate(b)) => a.same_fact(b),
            (NodeKind::Function(a), NodeKind::Function(b)) => a.same_key(b),
            (NodeKind::Expression(a), NodeKind::Expression(b)) => a == b,
            (NodeKind::FunctionModifier(a), NodeKind::FunctionModifier(b)) => a == b,
            (NodeKind::Number(a), NodeKind::Number(b)) => a == b,
            (a, b) => a.node_type() == b.node_type(),
        }
    }
}

impl Tree {
    /// Structural tree equality, order-sensitive on children.
    ///
    /// Node ids may differ; only shape and payload keys matter.
    pub fn matches(&self, other: &Tree) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => self.subtree_matches(0, other, 0),
            _ => false,
        }
    }

    /// Structural equality of the subtree at `id` against `other`'s subtree at `other_id`.
    pub fn subtree_matches(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let (Some(a), Some(b)) = (self.node(id), other.node(other_id)) else {
            return false;
        };
        a.matches(b)
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .zip(&b.children)
                .all(|(&x, &y)| self.subtree_matches(x, other, y))
    }

    /// The subtree rooted at `id` as a standalone, renumbered tree.
    ///
    /// Returns an empty tree when `id` is out of range.
    pub fn extract(&self, id: NodeId) -> Tree {
        let mut out = Tree::new();
        if id < self.len() {
            out.graft(None, self, id);
        }
        out
    }

    /// Every subtree rooted at a node of type `node_type`, in node-id order.
    pub fn subtrees_of_type(&self, node_type: NodeType) -> Vec<Tree> {
        self.nodes()
            .iter()
            .filter(|n| n.node_type() == node_type)
            .map(|n| self.extract(n.id))
            .collect()
    }

    /// The maximal subgoals of this tree.
    ///
    /// For an AND/OR root these are its children; any other non-empty tree is
    /// its own single subgoal.
    pub fn top_level_subtrees(&self) -> Vec<Tree> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        match root.kind {
            NodeKind::And | NodeKind::Or => {
                root.children.iter().map(|&c| self.extract(c)).collect()
            }
            NodeKind::Not
            | NodeKind::Unknown
            | NodeKind::OneOf
            | NodeKind::Predicate(_)
            | NodeKind::Function(_)
            | NodeKind::Expression(_)
            | NodeKind::FunctionModifier(_)
            | NodeKind::Number(_) => vec![self.clone()],
        }
    }

    /// Rebuild a tree from a combinator type and a list of subtrees.
    ///
    /// AND/OR/ONE_OF wrap all subtrees; NOT wraps exactly one. For any other
    /// type a single subtree is returned unchanged. `None` when there is
    /// nothing to rebuild from.
    pub fn from_subtrees(node_type: NodeType, subtrees: &[Tree]) -> Option<Tree> {
        let subtrees: Vec<&Tree> = subtrees.iter().filter(|t| !t.is_empty()).collect();
        if subtrees.is_empty() {
            return None;
        }
        let kind = match node_type {
            NodeType::And => NodeKind::And,
            NodeType::Or => NodeKind::Or,
            NodeType::OneOf => NodeKind::OneOf,
            NodeType::Not if subtrees.len() == 1 => NodeKind::Not,
            _ if subtrees.len() == 1 => return Some(subtrees[0].clone()),
            _ => return None,
        };
        let mut tree = Tree::new();
        let root = tree.push(kind);
        for sub in subtrees {
            tree.graft(Some(root), sub, 0);
        }
        Some(tree)
    }

    /// All predicate leaves under `id` (inclusive), in pre-order.
    pub fn predicates_under(&self, id: NodeId) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.walk(id, &mut |node| {
            if let NodeKind::Predicate(p) = &node.kind {
                out.push(p);
            }
        });
        out
    }

    /// All function leaves under `id` (inclusive), in pre-order.
    pub fn functions_under(&self, id: NodeId) -> Vec<&Function> {
        let mut out = Vec::new();
        self.walk(id, &mut |node| {
            if let NodeKind::Function(f) = &node.kind {
                out.push(f);
            }
        });
        out
    }

    /// All predicate leaves of the whole tree.
    pub fn predicates(&self) -> Vec<&Predicate> {
        if self.is_empty() {
            Vec::new()
        } else {
            self.predicates_under(0)
        }
    }

    /// All function leaves of the whole tree.
    pub fn functions(&self) -> Vec<&Function> {
        if self.is_empty() {
            Vec::new()
        } else {
            self.functions_under(0)
        }
    }

    /// Whether any predicate or function leaf names `instance`.
    pub fn mentions(&self, instance: &str) -> bool {
        self.predicates().iter().any(|p| p.mentions(instance))
            || self.functions().iter().any(|f| f.mentions(instance))
    }

    /// Rename every PREDICATE and FUNCTION leaf in place.
    ///
    /// `rename` sees the leaf's node type and current name and returns the
    /// replacement, or `None` to keep it.
    pub fn rename_atoms(&mut self, mut rename: impl FnMut(NodeType, &str) -> Option<String>) {
        for node in &mut self.nodes {
            match &mut node.kind {
                NodeKind::Predicate(p) => {
                    if let Some(name) = rename(NodeType::Predicate, &p.name) {
                        p.name = name;
                    }
                }
                NodeKind::Function(f) => {
                    if let Some(name) = rename(NodeType::Function, &f.name) {
                        f.name = name;
                    }
                }
                _ => {}
            }
        }
    }

    fn walk<'a>(&'a self, id: NodeId, visit: &mut impl FnMut(&'a Node)) {
        let Some(node) = self.node(id) else {
            return;
        };
        visit(node);
        for &child in &node.children {
            self.walk(child, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ExprOp;

    fn p(name: &str, args: &[&str]) -> Predicate {
        Predicate::new(name, args.iter().copied())
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = Tree::and(vec![
            Tree::from_predicate(p("at", &["r", "k"])),
            Tree::from_predicate(p("open", &["d"])),
        ]);
        let b = Tree::and(vec![
            Tree::from_predicate(p("open", &["d"])),
            Tree::from_predicate(p("at", &["r", "k"])),
        ]);
        assert!(a.matches(&a.clone()));
        assert!(!a.matches(&b));
    }

    #[test]
    fn equality_distinguishes_negation_and_kind() {
        let pos = Tree::from_predicate(p("open", &["d"]));
        let neg = Tree::from_predicate(p("open", &["d"]).negated());
        let wrapped = Tree::not(pos.clone());
        assert!(!pos.matches(&neg));
        assert!(!pos.matches(&wrapped));
        assert!(Tree::new().matches(&Tree::new()));
        assert!(!Tree::new().matches(&pos));
    }

    #[test]
    fn equality_ignores_function_values_but_not_numbers() {
        let a = Tree::expression(
            ExprOp::Greater,
            Tree::from_function(Function::new("battery", ["r"], 1.0)),
            Tree::number(10.0),
        );
        let b = Tree::expression(
            ExprOp::Greater,
            Tree::from_function(Function::new("battery", ["r"], 99.0)),
            Tree::number(10.0),
        );
        let c = Tree::expression(
            ExprOp::Greater,
            Tree::from_function(Function::new("battery", ["r"], 1.0)),
            Tree::number(20.0),
        );
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn extract_renumbers_from_zero() {
        let tree = Tree::and(vec![
            Tree::from_predicate(p("at", &["r", "k"])),
            Tree::not(Tree::from_predicate(p("open", &["d"]))),
        ]);
        let sub = tree.extract(2);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.root_type(), Some(NodeType::Not));
        assert_eq!(sub.nodes()[0].children, vec![1]);
        assert!(tree.extract(42).is_empty());
    }

    #[test]
    fn subtrees_of_type_finds_nested_nodes() {
        let tree = Tree::or(vec![
            Tree::not(Tree::from_predicate(p("a", &["x"]))),
            Tree::and(vec![Tree::not(Tree::from_predicate(p("b", &["y"])))]),
        ]);
        let nots = tree.subtrees_of_type(NodeType::Not);
        assert_eq!(nots.len(), 2);
        assert_eq!(nots[1].predicates()[0].name, "b");
    }

    #[test]
    fn top_level_subtrees_of_and_and_leaf() {
        let goal = Tree::and(vec![
            Tree::from_predicate(p("at", &["r", "k"])),
            Tree::from_predicate(p("at", &["s", "b"])),
        ]);
        assert_eq!(goal.top_level_subtrees().len(), 2);

        let leaf = Tree::from_predicate(p("at", &["r", "k"]));
        let subs = leaf.top_level_subtrees();
        assert_eq!(subs.len(), 1);
        assert!(subs[0].matches(&leaf));

        assert!(Tree::new().top_level_subtrees().is_empty());
    }

    #[test]
    fn from_subtrees_preserves_combinator() {
        let subs = vec![
            Tree::from_predicate(p("a", &["x"])),
            Tree::from_predicate(p("b", &["y"])),
        ];
        let rebuilt = Tree::from_subtrees(NodeType::Or, &subs).unwrap();
        assert_eq!(rebuilt.to_string(), "(or (a x) (b y))");

        let single = Tree::from_subtrees(NodeType::Predicate, &subs[..1]).unwrap();
        assert!(single.matches(&subs[0]));

        assert!(Tree::from_subtrees(NodeType::And, &[]).is_none());
        assert!(Tree::from_subtrees(NodeType::Predicate, &subs).is_none());
    }

    #[test]
    fn leaves_are_collected_in_preorder() {
        let tree = Tree::and(vec![
            Tree::from_predicate(p("a", &["x"])),
            Tree::expression(
                ExprOp::Less,
                Tree::from_function(Function::new("f", ["x"], 0.0)),
                Tree::from_function(Function::new("g", ["y"], 0.0)),
            ),
            Tree::not(Tree::from_predicate(p("b", &["y"]))),
        ]);
        let preds: Vec<_> = tree.predicates().iter().map(|p| p.name.as_str()).collect();
        let funcs: Vec<_> = tree.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(preds, ["a", "b"]);
        assert_eq!(funcs, ["f", "g"]);
        assert!(tree.mentions("y"));
        assert!(!tree.mentions("z"));
    }

    #[test]
    fn rename_atoms_touches_leaves_only() {
        let mut tree = Tree::or(vec![
            Tree::from_predicate(p("Charged", &["R2D2"])),
            Tree::expression(
                ExprOp::Greater,
                Tree::from_function(Function::new("Battery", ["R2D2"], 0.0)),
                Tree::number(5.0),
            ),
        ]);
        tree.rename_atoms(|_, name| Some(name.to_lowercase()));
        assert_eq!(tree.to_string(), "(or (charged R2D2) (> (battery R2D2) 5))");
        assert_eq!(tree.root_type(), Some(NodeType::Or));
    }
}
