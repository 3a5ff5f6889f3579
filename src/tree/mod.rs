//! Expression trees: arena-backed logical and arithmetic formulas.
//!
//! A [`Tree`] is a flat, ordered array of [`Node`]s. A node's position in the
//! array is its identity ([`NodeId`]) and node `0` is always the root. Children
//! are referenced by id, so the structure has no ownership cycles and append
//! order stays deterministic.
//!
//! Node kinds form the closed sum type [`NodeKind`]; every consumer (equality,
//! rendering, validation, evaluation, emission) matches on it exhaustively.
//!
//! ```
//! use plan_kb::tree::{Predicate, Tree};
//!
//! let goal = Tree::and(vec![
//!     Tree::from_predicate(Predicate::new("robot_at", ["r2d2", "kitchen"])),
//!     Tree::not(Tree::from_predicate(Predicate::new("door_open", ["d1"]))),
//! ]);
//! assert_eq!(goal.to_string(), "(and (robot_at r2d2 kitchen) (not (door_open d1)))");
//! ```

pub mod exchange;
mod ops;
mod render;

use serde::{Deserialize, Serialize};

pub use exchange::NodeRecord;
pub use render::CaseFolding;

/// Index of a node inside its [`Tree`].
pub type NodeId = usize;

// ---------------------------------------------------------------------------
// Node types and payloads
// ---------------------------------------------------------------------------

/// Payload-free discriminant of a [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    And,
    Or,
    Not,
    Unknown,
    OneOf,
    Predicate,
    Function,
    Expression,
    FunctionModifier,
    Number,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NodeType::And => "AND",
            NodeType::Or => "OR",
            NodeType::Not => "NOT",
            NodeType::Unknown => "UNKNOWN",
            NodeType::OneOf => "ONE_OF",
            NodeType::Predicate => "PREDICATE",
            NodeType::Function => "FUNCTION",
            NodeType::Expression => "EXPRESSION",
            NodeType::FunctionModifier => "FUNCTION_MODIFIER",
            NodeType::Number => "NUMBER",
        };
        f.write_str(label)
    }
}

/// A typed parameter naming an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Param {
    /// Instance name.
    pub name: String,
    /// Declared type, empty when unknown at construction time.
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Subtypes accepted in this position.
    #[serde(default)]
    pub sub_types: Vec<String>,
}

impl Param {
    /// An untyped parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A parameter with a known type.
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            sub_types: Vec::new(),
        }
    }
}

/// A ground logical atom, optionally negated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub params: Vec<Param>,
    #[serde(default)]
    pub negate: bool,
}

impl Predicate {
    /// Build a positive predicate over untyped instance names.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: args.into_iter().map(Param::new).collect(),
            negate: false,
        }
    }

    /// Flip the negation flag.
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Same name and same ordered parameter names, ignoring negation.
    pub fn same_atom(&self, other: &Predicate) -> bool {
        self.name == other.name && same_param_names(&self.params, &other.params)
    }

    /// Structural equality: same atom and same negation flag.
    pub fn same_fact(&self, other: &Predicate) -> bool {
        self.negate == other.negate && self.same_atom(other)
    }

    /// Whether any parameter names `instance`.
    pub fn mentions(&self, instance: &str) -> bool {
        self.params.iter().any(|p| p.name == instance)
    }
}

/// A ground numeric fluent with its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    #[serde(default)]
    pub value: f64,
}

impl Function {
    /// Build a function over untyped instance names.
    pub fn new<I, S>(name: impl Into<String>, args: I, value: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: args.into_iter().map(Param::new).collect(),
            value,
        }
    }

    /// Same name and same ordered parameter names. The value is not part of the key.
    pub fn same_key(&self, other: &Function) -> bool {
        self.name == other.name && same_param_names(&self.params, &other.params)
    }

    /// Whether any parameter names `instance`.
    pub fn mentions(&self, instance: &str) -> bool {
        self.params.iter().any(|p| p.name == instance)
    }
}

fn same_param_names(a: &[Param], b: &[Param]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.name == y.name)
}

/// Operator of an EXPRESSION node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprOp {
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Equal,
    Add,
    Sub,
    Mul,
    Div,
}

impl ExprOp {
    /// PDDL surface symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            ExprOp::Greater => ">",
            ExprOp::GreaterEq => ">=",
            ExprOp::Less => "<",
            ExprOp::LessEq => "<=",
            ExprOp::Equal => "=",
            ExprOp::Add => "+",
            ExprOp::Sub => "-",
            ExprOp::Mul => "*",
            ExprOp::Div => "/",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            ">" => ExprOp::Greater,
            ">=" => ExprOp::GreaterEq,
            "<" => ExprOp::Less,
            "<=" => ExprOp::LessEq,
            "=" => ExprOp::Equal,
            "+" => ExprOp::Add,
            "-" => ExprOp::Sub,
            "*" => ExprOp::Mul,
            "/" => ExprOp::Div,
            _ => return None,
        })
    }

    /// True for the comparison operators, false for arithmetic.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            ExprOp::Greater | ExprOp::GreaterEq | ExprOp::Less | ExprOp::LessEq | ExprOp::Equal
        )
    }
}

/// Operator of a FUNCTION_MODIFIER node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierOp {
    Assign,
    Increase,
    Decrease,
    ScaleUp,
    ScaleDown,
}

impl ModifierOp {
    /// PDDL surface keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            ModifierOp::Assign => "assign",
            ModifierOp::Increase => "increase",
            ModifierOp::Decrease => "decrease",
            ModifierOp::ScaleUp => "scale-up",
            ModifierOp::ScaleDown => "scale-down",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "assign" => ModifierOp::Assign,
            "increase" => ModifierOp::Increase,
            "decrease" => ModifierOp::Decrease,
            "scale-up" => ModifierOp::ScaleUp,
            "scale-down" => ModifierOp::ScaleDown,
            _ => return None,
        })
    }
}

/// What a node is, together with its kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    And,
    Or,
    Not,
    /// "This fact may be true": exactly one predicate child.
    Unknown,
    /// "Exactly one of these is true": predicate children.
    OneOf,
    Predicate(Predicate),
    Function(Function),
    Expression(ExprOp),
    FunctionModifier(ModifierOp),
    Number(f64),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::And => NodeType::And,
            NodeKind::Or => NodeType::Or,
            NodeKind::Not => NodeType::Not,
            NodeKind::Unknown => NodeType::Unknown,
            NodeKind::OneOf => NodeType::OneOf,
            NodeKind::Predicate(_) => NodeType::Predicate,
            NodeKind::Function(_) => NodeType::Function,
            NodeKind::Expression(_) => NodeType::Expression,
            NodeKind::FunctionModifier(_) => NodeType::FunctionModifier,
            NodeKind::Number(_) => NodeType::Number,
        }
    }
}

/// One node of a [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Position of this node in its tree.
    pub id: NodeId,
    pub kind: NodeKind,
    /// Ordered child ids.
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn as_predicate(&self) -> Option<&Predicate> {
        match &self.kind {
            NodeKind::Predicate(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            NodeKind::Function(f) => Some(f),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// An expression tree stored as a node arena. The default tree is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<NodeRecord>", try_from = "Vec<NodeRecord>")]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node with no children and return its id.
    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            kind,
            children: Vec::new(),
        });
        id
    }

    /// Append a node and attach it as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.push(kind);
        self.nodes[parent].children.push(id);
        id
    }

    /// Copy the subtree of `source` rooted at `root` into this tree.
    ///
    /// The copy is appended in pre-order and attached under `parent` when given.
    /// Returns the id of the copied root.
    pub fn graft(&mut self, parent: Option<NodeId>, source: &Tree, root: NodeId) -> NodeId {
        let kind = source.nodes[root].kind.clone();
        let id = match parent {
            Some(p) => self.push_child(p, kind),
            None => self.push(kind),
        };
        for &child in &source.nodes[root].children {
            self.graft(Some(id), source, child);
        }
        id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Type of the root node, `None` for an empty tree.
    pub fn root_type(&self) -> Option<NodeType> {
        self.root().map(Node::node_type)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    // -- leaf constructors ---------------------------------------------------

    /// A single-node tree holding one predicate.
    pub fn from_predicate(predicate: Predicate) -> Self {
        Self::leaf(NodeKind::Predicate(predicate))
    }

    /// A single-node tree holding one function.
    pub fn from_function(function: Function) -> Self {
        Self::leaf(NodeKind::Function(function))
    }

    /// A single-node tree holding a numeric literal.
    pub fn number(value: f64) -> Self {
        Self::leaf(NodeKind::Number(value))
    }

    fn leaf(kind: NodeKind) -> Self {
        let mut tree = Self::new();
        tree.push(kind);
        tree
    }

    // -- combinators ---------------------------------------------------------

    /// Conjunction of the given subtrees.
    pub fn and(children: Vec<Tree>) -> Self {
        Self::compose(NodeKind::And, &children)
    }

    /// Disjunction of the given subtrees.
    pub fn or(children: Vec<Tree>) -> Self {
        Self::compose(NodeKind::Or, &children)
    }

    /// Negation of a subtree.
    pub fn not(child: Tree) -> Self {
        Self::compose(NodeKind::Not, &[child])
    }

    /// Numeric expression `(op lhs rhs)`.
    pub fn expression(op: ExprOp, lhs: Tree, rhs: Tree) -> Self {
        Self::compose(NodeKind::Expression(op), &[lhs, rhs])
    }

    /// `(unknown P)` contingent fact.
    pub fn unknown(predicate: Predicate) -> Self {
        Self::compose(NodeKind::Unknown, &[Self::from_predicate(predicate)])
    }

    /// `(oneof P1 ... Pn)` contingent fact.
    pub fn one_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let children: Vec<Tree> = predicates.into_iter().map(Self::from_predicate).collect();
        Self::compose(NodeKind::OneOf, &children)
    }

    /// `(or P Q)` disjunctive contingent fact.
    pub fn either(first: Predicate, second: Predicate) -> Self {
        Self::or(vec![Self::from_predicate(first), Self::from_predicate(second)])
    }

    /// New tree whose root is `kind` with the given subtrees as ordered children.
    /// Empty subtrees are skipped.
    pub fn compose(kind: NodeKind, children: &[Tree]) -> Self {
        let mut tree = Self::new();
        let root = tree.push(kind);
        for child in children.iter().filter(|c| !c.is_empty()) {
            tree.graft(Some(root), child, 0);
        }
        tree
    }
}
