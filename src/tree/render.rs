//! Canonical text rendering of expression trees.
//!
//! Two forms are produced: a compact one-line PDDL form (the `Display` impl,
//! also used for problem emission) and an indented multi-line form for humans.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use super::{Function, NodeId, NodeKind, Param, Predicate, Tree};

/// How identifiers are cased when rendering.
///
/// Predicate, function and type names are affected; instance names never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseFolding {
    /// Lower-case predicate, function and type identifiers.
    #[default]
    LowerIdentifiers,
    /// Render identifiers exactly as stored.
    Preserve,
}

impl CaseFolding {
    /// Apply this policy to an identifier.
    pub fn apply(self, ident: &str) -> String {
        match self {
            CaseFolding::LowerIdentifiers => ident.to_lowercase(),
            CaseFolding::Preserve => ident.to_string(),
        }
    }
}

/// Format a numeric literal the way PDDL expects (`80`, `2.5`).
pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

fn write_atom(out: &mut String, name: &str, params: &[Param], folding: CaseFolding) {
    out.push('(');
    out.push_str(&folding.apply(name));
    for param in params {
        out.push(' ');
        out.push_str(&param.name);
    }
    out.push(')');
}

impl Predicate {
    /// Render as `(name args)`, or `(not (name args))` when negated.
    pub fn render(&self, folding: CaseFolding) -> String {
        let mut out = String::new();
        if self.negate {
            out.push_str("(not ");
        }
        write_atom(&mut out, &self.name, &self.params, folding);
        if self.negate {
            out.push(')');
        }
        out
    }
}

impl Function {
    /// Render the bare term `(name args)`, without its value.
    pub fn render_term(&self, folding: CaseFolding) -> String {
        let mut out = String::new();
        write_atom(&mut out, &self.name, &self.params, folding);
        out
    }

    /// Render as an assignment `(= (name args) value)`.
    pub fn render(&self, folding: CaseFolding) -> String {
        format!(
            "(= {} {})",
            self.render_term(folding),
            format_number(self.value)
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(CaseFolding::Preserve))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(CaseFolding::Preserve))
    }
}

fn keyword(kind: &NodeKind) -> Option<&'static str> {
    match kind {
        NodeKind::And => Some("and"),
        NodeKind::Or => Some("or"),
        NodeKind::Not => Some("not"),
        NodeKind::Unknown => Some("unknown"),
        NodeKind::OneOf => Some("oneof"),
        NodeKind::Expression(op) => Some(op.symbol()),
        NodeKind::FunctionModifier(op) => Some(op.keyword()),
        NodeKind::Predicate(_) | NodeKind::Function(_) | NodeKind::Number(_) => None,
    }
}

impl Tree {
    /// Compact one-line rendering of the subtree at `id`.
    pub fn render(&self, id: NodeId, folding: CaseFolding) -> String {
        let mut out = String::new();
        self.render_into(&mut out, id, folding);
        out
    }

    fn render_into(&self, out: &mut String, id: NodeId, folding: CaseFolding) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Predicate(p) => out.push_str(&p.render(folding)),
            NodeKind::Function(f) => out.push_str(&f.render_term(folding)),
            NodeKind::Number(v) => out.push_str(&format_number(*v)),
            kind => {
                out.push('(');
                out.push_str(keyword(kind).unwrap_or_default());
                for &child in &node.children {
                    out.push(' ');
                    self.render_into(out, child, folding);
                }
                out.push(')');
            }
        }
    }

    /// Indented multi-line rendering, one node per line.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        if !self.is_empty() {
            self.pretty_into(&mut out, 0, 0);
        }
        out
    }

    fn pretty_into(&self, out: &mut String, id: NodeId, depth: usize) {
        let Some(node) = self.node(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match keyword(&node.kind) {
            None => {
                let _ = writeln!(out, "{indent}{}", self.render(id, CaseFolding::Preserve));
            }
            Some(word) if node.children.is_empty() => {
                let _ = writeln!(out, "{indent}({word})");
            }
            Some(word) => {
                let _ = writeln!(out, "{indent}({word}");
                for &child in &node.children {
                    self.pretty_into(out, child, depth + 1);
                }
                let _ = writeln!(out, "{indent})");
            }
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        f.write_str(&self.render(0, CaseFolding::Preserve))
    }
}
