//! Goal evaluation against the current facts and fluents.

use super::KnowledgeBase;
use crate::tree::{ExprOp, NodeId, NodeKind, Tree};

const EQ_TOLERANCE: f64 = 1e-9;

impl KnowledgeBase {
    /// Whether `goal` holds in the current state. Never mutates.
    ///
    /// The empty goal holds trivially. Contingent heads and function
    /// modifiers are never satisfied, and neither is any comparison over a
    /// missing fluent or a division by zero.
    pub fn is_goal_satisfied(&self, goal: &Tree) -> bool {
        if goal.is_empty() {
            return true;
        }
        let goal = self.canonical_tree(goal.clone());
        self.holds(&goal, 0)
    }

    fn holds(&self, tree: &Tree, id: NodeId) -> bool {
        let Some(node) = tree.node(id) else {
            return false;
        };
        match &node.kind {
            NodeKind::And => node.children.iter().all(|&c| self.holds(tree, c)),
            NodeKind::Or => node.children.iter().any(|&c| self.holds(tree, c)),
            NodeKind::Not => match node.children.as_slice() {
                [child] => !self.holds(tree, *child),
                _ => false,
            },
            NodeKind::Predicate(p) => {
                let stored = self
                    .predicates
                    .iter()
                    .any(|s| !s.negate && s.same_atom(p));
                stored != p.negate
            }
            NodeKind::Expression(op) if op.is_comparison() => {
                let [lhs, rhs] = node.children.as_slice() else {
                    return false;
                };
                match (self.value(tree, *lhs), self.value(tree, *rhs)) {
                    (Some(a), Some(b)) => compare(*op, a, b),
                    _ => false,
                }
            }
            NodeKind::Expression(_)
            | NodeKind::Function(_)
            | NodeKind::Number(_)
            | NodeKind::Unknown
            | NodeKind::OneOf
            | NodeKind::FunctionModifier(_) => false,
        }
    }

    /// Numeric value of the subtree at `id`, `None` when undefined.
    fn value(&self, tree: &Tree, id: NodeId) -> Option<f64> {
        let node = tree.node(id)?;
        match &node.kind {
            NodeKind::Number(v) => Some(*v),
            NodeKind::Function(f) => self
                .functions
                .iter()
                .find(|s| s.same_key(f))
                .map(|s| s.value),
            NodeKind::Expression(op) if !op.is_comparison() => {
                match node.children.as_slice() {
                    [only] if *op == ExprOp::Sub => Some(-self.value(tree, *only)?),
                    [lhs, rhs] => {
                        arithmetic(*op, self.value(tree, *lhs)?, self.value(tree, *rhs)?)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn compare(op: ExprOp, a: f64, b: f64) -> bool {
    match op {
        ExprOp::Greater => a > b,
        ExprOp::GreaterEq => a >= b,
        ExprOp::Less => a < b,
        ExprOp::LessEq => a <= b,
        ExprOp::Equal => (a - b).abs() <= EQ_TOLERANCE,
        ExprOp::Add | ExprOp::Sub | ExprOp::Mul | ExprOp::Div => false,
    }
}

fn arithmetic(op: ExprOp, a: f64, b: f64) -> Option<f64> {
    match op {
        ExprOp::Add => Some(a + b),
        ExprOp::Sub => Some(a - b),
        ExprOp::Mul => Some(a * b),
        ExprOp::Div if b == 0.0 => None,
        ExprOp::Div => Some(a / b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::kb::tests::populated;
    use crate::kb::KnowledgeBase;
    use crate::tree::{ExprOp, Function, Predicate, Tree};

    fn at(room: &str) -> Predicate {
        Predicate::new("robot_at", ["r2d2", room])
    }

    fn battery_above(threshold: f64) -> Tree {
        Tree::expression(
            ExprOp::Greater,
            Tree::from_function(Function::new("battery", ["r2d2"], 0.0)),
            Tree::number(threshold),
        )
    }

    fn kb() -> KnowledgeBase {
        let mut kb = populated();
        kb.add_predicate(at("kitchen")).unwrap();
        kb.add_function(Function::new("battery", ["r2d2"], 40.0)).unwrap();
        kb
    }

    #[test]
    fn and_with_negation() {
        let kb = kb();
        let goal = Tree::and(vec![
            Tree::from_predicate(at("kitchen")),
            Tree::not(Tree::from_predicate(at("bedroom"))),
        ]);
        assert!(kb.is_goal_satisfied(&goal));

        let goal = Tree::and(vec![
            Tree::from_predicate(at("kitchen")),
            Tree::not(Tree::from_predicate(at("kitchen"))),
        ]);
        assert!(!kb.is_goal_satisfied(&goal));
    }

    #[test]
    fn negated_predicate_leaf_inverts_membership() {
        let kb = kb();
        assert!(kb.is_goal_satisfied(&Tree::from_predicate(at("bedroom").negated())));
        assert!(!kb.is_goal_satisfied(&Tree::from_predicate(at("kitchen").negated())));
    }

    #[test]
    fn or_and_empty_combinators() {
        let kb = kb();
        let goal = Tree::or(vec![
            Tree::from_predicate(at("bedroom")),
            Tree::from_predicate(at("kitchen")),
        ]);
        assert!(kb.is_goal_satisfied(&goal));
        assert!(!kb.is_goal_satisfied(&Tree::or(vec![])));
        assert!(kb.is_goal_satisfied(&Tree::and(vec![])));
        assert!(kb.is_goal_satisfied(&Tree::new()));
    }

    #[test]
    fn numeric_comparisons_use_stored_values() {
        let kb = kb();
        assert!(kb.is_goal_satisfied(&battery_above(20.0)));
        assert!(!kb.is_goal_satisfied(&battery_above(60.0)));

        let missing = Tree::expression(
            ExprOp::Less,
            Tree::from_function(Function::new("distance", ["kitchen", "hall"], 0.0)),
            Tree::number(100.0),
        );
        assert!(!kb.is_goal_satisfied(&missing));
    }

    #[test]
    fn arithmetic_is_computed() {
        let kb = kb();
        let doubled = Tree::expression(
            ExprOp::Equal,
            Tree::expression(
                ExprOp::Mul,
                Tree::from_function(Function::new("battery", ["r2d2"], 0.0)),
                Tree::number(2.0),
            ),
            Tree::number(80.0),
        );
        assert!(kb.is_goal_satisfied(&doubled));

        let by_zero = Tree::expression(
            ExprOp::Less,
            Tree::expression(ExprOp::Div, Tree::number(1.0), Tree::number(0.0)),
            Tree::number(5.0),
        );
        assert!(!kb.is_goal_satisfied(&by_zero));
    }

    #[test]
    fn contingent_heads_are_never_satisfied() {
        let kb = kb();
        assert!(!kb.is_goal_satisfied(&Tree::unknown(at("kitchen"))));
        assert!(!kb.is_goal_satisfied(&Tree::one_of([at("kitchen"), at("hall")])));
    }
}
