//! Default problem reader for the parenthesized PDDL problem format.
//!
//! Expressions are read by context: inside a logical form `(name args)` is a
//! predicate, inside a numeric form it is a function term. Init facts of the
//! form `(not P)` become negated predicates, as do the disjuncts of `(or …)`
//! and `(oneof …)` clauses.

use std::collections::BTreeMap;
use std::str::FromStr;

use super::sexpr::{self, SExpr};
use super::{CodecError, ParsedProblem, ProblemParser};
use crate::domain::DomainContract;
use crate::error::TreeError;
use crate::instance::Instance;
use crate::tree::{ExprOp, Function, ModifierOp, NodeKind, Param, Predicate, Tree};

/// Reads problem text with the bundled s-expression reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct PddlReader;

fn structure(message: impl Into<String>) -> CodecError {
    CodecError::Structure {
        message: message.into(),
    }
}

/// Structural error located at `sx`.
fn malformed(sx: &SExpr, message: impl std::fmt::Display) -> CodecError {
    structure(format!("{message} (at byte {})", sx.span().start))
}

/// Builds trees from s-expressions, typing parameters from known objects.
struct Builder<'a> {
    object_types: Option<&'a BTreeMap<String, String>>,
}

/// Builder for atoms read outside of a problem, with untyped parameters.
const UNTYPED: Builder<'static> = Builder { object_types: None };

impl Builder<'_> {
    fn param(&self, sx: &SExpr) -> Result<Param, CodecError> {
        let name = sx
            .as_atom()
            .ok_or_else(|| malformed(sx, format!("expected an object name, found {sx}")))?;
        if name.starts_with('?') {
            return Err(CodecError::Unsupported {
                construct: format!("variable {name}"),
            });
        }
        Ok(
            match self.object_types.and_then(|types| types.get(name)) {
                Some(ty) => Param::typed(name, ty.clone()),
                None => Param::new(name),
            },
        )
    }

    fn head_and_args<'s>(&self, sx: &'s SExpr) -> Result<(&'s str, &'s [SExpr]), CodecError> {
        let items = sx
            .as_list()
            .ok_or_else(|| malformed(sx, format!("expected a parenthesized form, found {sx}")))?;
        let (first, rest) = items
            .split_first()
            .ok_or_else(|| malformed(sx, "empty form `()`"))?;
        let head = first
            .as_atom()
            .ok_or_else(|| malformed(sx, format!("form {sx} must start with a name")))?;
        Ok((head, rest))
    }

    /// `(name args)` or `(not (name args))`.
    fn predicate(&self, sx: &SExpr) -> Result<Predicate, CodecError> {
        let (head, args) = self.head_and_args(sx)?;
        if head == "not" {
            let [inner] = args else {
                return Err(malformed(sx, format!("{sx} must negate exactly one atom")));
            };
            return Ok(self.predicate(inner)?.negated());
        }
        Ok(Predicate {
            name: head.to_string(),
            params: args.iter().map(|a| self.param(a)).collect::<Result<_, _>>()?,
            negate: false,
        })
    }

    /// `(name args)` as a function term with value 0.
    fn function_term(&self, sx: &SExpr) -> Result<Function, CodecError> {
        let (head, args) = self.head_and_args(sx)?;
        Ok(Function {
            name: head.to_string(),
            params: args.iter().map(|a| self.param(a)).collect::<Result<_, _>>()?,
            value: 0.0,
        })
    }

    /// `(= (name args) value)`.
    fn function_assignment(&self, sx: &SExpr) -> Result<Function, CodecError> {
        let (head, args) = self.head_and_args(sx)?;
        let ("=", [term, value]) = (head, args) else {
            return Err(malformed(sx, format!("expected (= (function …) value), found {sx}")));
        };
        let mut function = self.function_term(term)?;
        function.value = number(value)?;
        Ok(function)
    }

    fn logical(&self, sx: &SExpr) -> Result<Tree, CodecError> {
        let (head, args) = self.head_and_args(sx)?;
        let subtrees = |args: &[SExpr]| -> Result<Vec<Tree>, CodecError> {
            args.iter().map(|a| self.logical(a)).collect()
        };
        match head {
            "and" => Ok(Tree::and(subtrees(args)?)),
            "or" => Ok(Tree::or(subtrees(args)?)),
            "not" => match args {
                [inner] => Ok(Tree::not(self.logical(inner)?)),
                _ => Err(malformed(sx, format!("{sx} must negate exactly one expression"))),
            },
            "unknown" => match args {
                [inner] => Ok(Tree::unknown(self.predicate(inner)?)),
                _ => Err(malformed(sx, format!("{sx} must wrap exactly one atom"))),
            },
            "oneof" => {
                let disjuncts = args
                    .iter()
                    .map(|a| self.predicate(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Tree::one_of(disjuncts))
            }
            "imply" | "exists" | "forall" | "when" | "preference" | "either" => {
                Err(CodecError::Unsupported {
                    construct: head.to_string(),
                })
            }
            _ => {
                if let Some(op) = ExprOp::from_symbol(head).filter(|op| op.is_comparison()) {
                    let [lhs, rhs] = args else {
                        return Err(malformed(sx, format!("{sx} must compare exactly two values")));
                    };
                    return Ok(Tree::expression(op, self.numeric(lhs)?, self.numeric(rhs)?));
                }
                if let Some(op) = ModifierOp::from_keyword(head) {
                    let [target, amount] = args else {
                        return Err(malformed(sx, format!("{sx} takes a function and a value")));
                    };
                    let target = Tree::from_function(self.function_term(target)?);
                    return Ok(Tree::compose(
                        NodeKind::FunctionModifier(op),
                        &[target, self.numeric(amount)?],
                    ));
                }
                Ok(Tree::from_predicate(self.predicate(sx)?))
            }
        }
    }

    fn numeric(&self, sx: &SExpr) -> Result<Tree, CodecError> {
        if sx.as_atom().is_some() {
            return Ok(Tree::number(number(sx)?));
        }
        let (head, args) = self.head_and_args(sx)?;
        match ExprOp::from_symbol(head).filter(|op| !op.is_comparison()) {
            Some(op) => match args {
                [only] if op == ExprOp::Sub => {
                    Ok(Tree::compose(NodeKind::Expression(op), &[self.numeric(only)?]))
                }
                [lhs, rhs] => Ok(Tree::expression(op, self.numeric(lhs)?, self.numeric(rhs)?)),
                _ => Err(malformed(sx, format!("{sx} must combine exactly two values"))),
            },
            None => Ok(Tree::from_function(self.function_term(sx)?)),
        }
    }

    /// One `:init` item: certain facts go to the first list, uncertain ones to the second.
    fn init_item(&self, sx: &SExpr) -> Result<(Option<Tree>, Option<Tree>), CodecError> {
        let (head, args) = self.head_and_args(sx)?;
        match head {
            "=" => Ok((Some(Tree::from_function(self.function_assignment(sx)?)), None)),
            "unknown" | "oneof" => Ok((None, Some(self.logical(sx)?))),
            "or" => {
                let disjuncts = args
                    .iter()
                    .map(|a| self.predicate(a).map(Tree::from_predicate))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((None, Some(Tree::or(disjuncts))))
            }
            _ => Ok((Some(Tree::from_predicate(self.predicate(sx)?)), None)),
        }
    }
}

fn number(sx: &SExpr) -> Result<f64, CodecError> {
    sx.as_atom()
        .and_then(|a| a.parse::<f64>().ok())
        .ok_or_else(|| malformed(sx, format!("expected a number, found {sx}")))
}

/// Parse a typed list `a b - t c - u d` into `(name, type)` pairs.
/// Names without a type are `object`s.
fn typed_list(items: &[SExpr]) -> Result<Vec<(String, String)>, CodecError> {
    let mut out = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let word = item
            .as_atom()
            .ok_or_else(|| malformed(item, format!("unexpected form {item} in object list")))?;
        if word == "-" {
            let ty = iter
                .next()
                .and_then(SExpr::as_atom)
                .ok_or_else(|| structure("`-` must be followed by a type name"))?;
            out.extend(pending.drain(..).map(|name| (name, ty.to_string())));
        } else {
            pending.push(word.to_string());
        }
    }
    out.extend(pending.into_iter().map(|name| (name, "object".to_string())));
    Ok(out)
}

/// The `(define …)` form and its sections.
fn define_sections(forms: &[SExpr]) -> Result<&[SExpr], CodecError> {
    let define = forms
        .iter()
        .find(|f| f.head() == Some("define"))
        .ok_or_else(|| structure("no (define …) form"))?;
    define
        .as_list()
        .map(|items| &items[1..])
        .ok_or_else(|| structure("no (define …) form"))
}

fn section<'a>(sections: &'a [SExpr], name: &str) -> Option<&'a [SExpr]> {
    sections
        .iter()
        .find(|s| s.head() == Some(name))
        .and_then(SExpr::as_list)
        .map(|items| &items[1..])
}

impl ProblemParser for PddlReader {
    fn domain_name(&self, text: &str) -> Option<String> {
        let forms = sexpr::parse(text).ok()?;
        let sections = define_sections(&forms).ok()?;
        match section(sections, ":domain")? {
            [name] => name.as_atom().map(str::to_string),
            _ => None,
        }
    }

    fn parse(&self, text: &str, domain: &dyn DomainContract) -> Result<ParsedProblem, CodecError> {
        let forms = sexpr::parse(text)?;
        let sections = define_sections(&forms)?;

        let name = match section(sections, "problem") {
            Some([name]) => name.as_atom().unwrap_or_default().to_string(),
            _ => return Err(structure("missing (problem <name>) header")),
        };
        if !matches!(section(sections, ":domain"), Some([name]) if name.as_atom().is_some()) {
            return Err(CodecError::MissingDomain);
        }

        for s in sections {
            match s.head() {
                Some("problem" | ":domain" | ":objects" | ":init" | ":goal") => {}
                Some(":requirements" | ":metric") => {
                    tracing::debug!(section = %s, "ignoring section");
                }
                _ => return Err(structure(format!("unknown section {s}"))),
            }
        }

        let objects: Vec<Instance> = typed_list(section(sections, ":objects").unwrap_or_default())?
            .into_iter()
            .map(|(name, ty)| Instance::new(name, ty))
            .collect();

        let mut object_types: BTreeMap<String, String> = domain
            .constants()
            .into_iter()
            .map(|c| (c.name, c.type_name))
            .collect();
        object_types.extend(objects.iter().map(|o| (o.name.clone(), o.type_name.clone())));
        let builder = Builder {
            object_types: Some(&object_types),
        };

        let mut init = Vec::new();
        let mut init_cond = Vec::new();
        for item in section(sections, ":init").unwrap_or_default() {
            let (fact, conditional) = builder.init_item(item)?;
            init.extend(fact);
            init_cond.extend(conditional);
        }

        let goal = match section(sections, ":goal") {
            None => None,
            Some([expr]) => Some(builder.logical(expr)?),
            Some(_) => return Err(structure("(:goal …) takes exactly one expression")),
        };

        Ok(ParsedProblem {
            name,
            objects,
            init,
            init_cond,
            goal,
        })
    }
}

// ---------------------------------------------------------------------------
// Textual atoms
// ---------------------------------------------------------------------------

fn bad_atom(input: &str, err: CodecError) -> TreeError {
    TreeError::BadAtom {
        input: input.to_string(),
        message: err.to_string(),
    }
}

impl FromStr for Predicate {
    type Err = TreeError;

    /// `(name args)` or `(not (name args))`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sexpr::parse_one(s)
            .and_then(|sx| UNTYPED.predicate(&sx))
            .map_err(|e| bad_atom(s, e))
    }
}

impl FromStr for Function {
    type Err = TreeError;

    /// `(= (name args) value)`, or a bare term `(name args)` with value 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sexpr::parse_one(s)
            .and_then(|sx| match sx.head() {
                Some("=") => UNTYPED.function_assignment(&sx),
                _ => UNTYPED.function_term(&sx),
            })
            .map_err(|e| bad_atom(s, e))
    }
}

impl FromStr for Tree {
    type Err = CodecError;

    /// A logical expression such as a goal: `(and (at r k) (> (battery r) 5))`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UNTYPED.logical(&sexpr::parse_one(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainSpec;
    use crate::tree::NodeType;

    fn domain() -> crate::domain::StaticDomain {
        DomainSpec::new("simple")
            .with_type("robot", "object")
            .with_type("room", "object")
            .with_predicate("robot_at", ["robot", "room"])
            .with_function("battery", ["robot"])
            .with_constant("base", "room")
            .build()
            .unwrap()
    }

    const PROBLEM: &str = "(define (problem p1)
      (:domain simple)
      (:objects r2d2 c3po - robot kitchen - room thing)
      (:init
        (robot_at r2d2 kitchen)
        (not (robot_at c3po kitchen))
        (= (battery r2d2) 75.5)
        (unknown (robot_at c3po base))
        (oneof (robot_at c3po kitchen) (robot_at c3po base))
        (or (robot_at r2d2 base) (not (robot_at c3po base))))
      (:goal (and (robot_at r2d2 base) (> (battery r2d2) 10))))";

    #[test]
    fn reads_domain_name() {
        assert_eq!(PddlReader.domain_name(PROBLEM).as_deref(), Some("simple"));
        assert_eq!(PddlReader.domain_name("(define (problem p))"), None);
        assert_eq!(PddlReader.domain_name("(define"), None);
    }

    #[test]
    fn parses_objects_with_types() {
        let parsed = PddlReader.parse(PROBLEM, &domain()).unwrap();
        assert_eq!(parsed.name, "p1");
        assert_eq!(
            parsed.objects,
            vec![
                Instance::new("r2d2", "robot"),
                Instance::new("c3po", "robot"),
                Instance::new("kitchen", "room"),
                Instance::new("thing", "object"),
            ]
        );
    }

    #[test]
    fn splits_certain_and_uncertain_init() {
        let parsed = PddlReader.parse(PROBLEM, &domain()).unwrap();
        assert_eq!(parsed.init.len(), 3);
        let negated = parsed.init[1].root().unwrap().as_predicate().unwrap();
        assert!(negated.negate);
        assert_eq!(negated.params[0].type_name, "robot");
        let battery = parsed.init[2].root().unwrap().as_function().unwrap();
        assert_eq!(battery.value, 75.5);

        let heads: Vec<_> = parsed.init_cond.iter().map(|t| t.root_type().unwrap()).collect();
        assert_eq!(heads, [NodeType::Unknown, NodeType::OneOf, NodeType::Or]);
        // constants are typed from the domain
        let base = &parsed.init_cond[0].predicates()[0].params[1];
        assert_eq!(base.type_name, "room");
        let or = &parsed.init_cond[2];
        assert!(or.predicates()[1].negate);
    }

    #[test]
    fn parses_goal_with_numeric_comparison() {
        let parsed = PddlReader.parse(PROBLEM, &domain()).unwrap();
        let goal = parsed.goal.unwrap();
        assert_eq!(
            goal.to_string(),
            "(and (robot_at r2d2 base) (> (battery r2d2) 10))"
        );
        assert_eq!(goal.functions()[0].name, "battery");
    }

    #[test]
    fn rejects_bad_structure() {
        let no_domain = "(define (problem p) (:objects a))";
        assert!(matches!(
            PddlReader.parse(no_domain, &domain()),
            Err(CodecError::MissingDomain)
        ));
        let bad_section = "(define (problem p) (:domain simple) (:bogus))";
        assert!(matches!(
            PddlReader.parse(bad_section, &domain()),
            Err(CodecError::Structure { .. })
        ));
        let bad_value = "(define (problem p) (:domain simple) (:init (= (battery a) x)))";
        match PddlReader.parse(bad_value, &domain()) {
            Err(CodecError::Structure { message }) => {
                assert!(message.contains("found x"), "{message}");
                assert!(message.ends_with("(at byte 59)"), "{message}");
            }
            other => panic!("expected a structure error, got {other:?}"),
        }
        let quantified = "(define (problem p) (:domain simple) (:goal (forall (?r - robot) (x ?r))))";
        assert!(matches!(
            PddlReader.parse(quantified, &domain()),
            Err(CodecError::Unsupported { .. })
        ));
    }

    #[test]
    fn atoms_from_text() {
        let p: Predicate = "(robot_at r2d2 kitchen)".parse().unwrap();
        assert_eq!(p.name, "robot_at");
        assert_eq!(p.params.len(), 2);
        let n: Predicate = "(not (open d1))".parse().unwrap();
        assert!(n.negate);

        let f: Function = "(= (battery r2d2) 80)".parse().unwrap();
        assert_eq!(f.value, 80.0);
        let term: Function = "(battery r2d2)".parse().unwrap();
        assert_eq!(term.value, 0.0);

        assert!(matches!(
            "robot_at".parse::<Predicate>(),
            Err(TreeError::BadAtom { .. })
        ));
        assert!("(= (battery r2d2) lots)".parse::<Function>().is_err());
    }

    #[test]
    fn tree_from_text() {
        let tree: Tree = "(or (not (a x)) (<= (+ (f x) 2) (g y)))".parse().unwrap();
        assert_eq!(tree.to_string(), "(or (not (a x)) (<= (+ (f x) 2) (g y)))");
        let modifier: Tree = "(increase (f x) 3)".parse().unwrap();
        assert_eq!(modifier.root_type(), Some(NodeType::FunctionModifier));
    }
}
