//! A domain contract backed by an in-memory description.
//!
//! Domain descriptions are written in TOML:
//!
//! ```toml
//! name = "simple"
//!
//! [types]
//! robot = "object"
//! room = "object"
//! corridor = "room"
//!
//! [predicates]
//! robot_at = ["robot", "room"]
//!
//! [functions]
//! battery_level = ["robot"]
//!
//! [constants]
//! room = ["charging_zone"]
//! ```
//!
//! `object` is the implicit root type. Every identifier is normalized to
//! lower case, matching the case-insensitive problem format.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DomainContract, ParamSpec, Signature};
use crate::error::{DomainError, DomainResult};
use crate::instance::Instance;

/// The implicit root of every type hierarchy.
pub const ROOT_TYPE: &str = "object";

/// Serializable description of a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Type → parent type.
    #[serde(default)]
    pub types: BTreeMap<String, String>,
    /// Predicate → ordered parameter types.
    #[serde(default)]
    pub predicates: BTreeMap<String, Vec<String>>,
    /// Function → ordered parameter types.
    #[serde(default)]
    pub functions: BTreeMap<String, Vec<String>>,
    /// Type → constant names.
    #[serde(default)]
    pub constants: BTreeMap<String, Vec<String>>,
}

impl DomainSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.types.insert(name.into(), parent.into());
        self
    }

    pub fn with_predicate<I, S>(mut self, name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predicates
            .insert(name.into(), params.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_function<I, S>(mut self, name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions
            .insert(name.into(), params.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.constants
            .entry(type_name.into())
            .or_default()
            .push(name.into());
        self
    }

    /// Validate and freeze into a [`StaticDomain`].
    pub fn build(self) -> DomainResult<StaticDomain> {
        StaticDomain::from_spec(self)
    }
}

/// Validated, lower-cased domain with precomputed subtype closures.
#[derive(Debug, Clone)]
pub struct StaticDomain {
    name: String,
    requirements: Vec<String>,
    /// Type → parent; the root maps to `None`.
    parents: BTreeMap<String, Option<String>>,
    predicates: BTreeMap<String, Vec<String>>,
    functions: BTreeMap<String, Vec<String>>,
    constants: Vec<Instance>,
}

fn lower(s: &str) -> String {
    s.trim().to_lowercase()
}

impl StaticDomain {
    /// Validate a description: parents and parameter types must be declared and
    /// the hierarchy must be acyclic.
    pub fn from_spec(spec: DomainSpec) -> DomainResult<Self> {
        let mut parents: BTreeMap<String, Option<String>> = BTreeMap::new();
        parents.insert(ROOT_TYPE.to_string(), None);
        for (ty, parent) in &spec.types {
            let ty = lower(ty);
            if ty == ROOT_TYPE {
                continue;
            }
            parents.insert(ty, Some(lower(parent)));
        }

        for (ty, parent) in &parents {
            if let Some(parent) = parent {
                if !parents.contains_key(parent) {
                    return Err(DomainError::UnknownParent {
                        type_name: ty.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for ty in parents.keys() {
            let mut seen = HashSet::new();
            let mut current = Some(ty.clone());
            while let Some(t) = current {
                if !seen.insert(t.clone()) {
                    return Err(DomainError::TypeCycle { type_name: ty.clone() });
                }
                current = parents.get(&t).cloned().flatten();
            }
        }

        let check_params = |kind: &str,
                            table: &BTreeMap<String, Vec<String>>|
         -> DomainResult<BTreeMap<String, Vec<String>>> {
            let mut out = BTreeMap::new();
            for (name, params) in table {
                let params: Vec<String> = params.iter().map(|p| lower(p)).collect();
                if let Some(bad) = params.iter().find(|p| !parents.contains_key(*p)) {
                    return Err(DomainError::UnknownType {
                        symbol: format!("{kind} {name}"),
                        type_name: bad.clone(),
                    });
                }
                out.insert(lower(name), params);
            }
            Ok(out)
        };
        let predicates = check_params("predicate", &spec.predicates)?;
        let functions = check_params("function", &spec.functions)?;

        let mut constants = Vec::new();
        for (ty, names) in &spec.constants {
            let ty = lower(ty);
            if !parents.contains_key(&ty) {
                return Err(DomainError::UnknownType {
                    symbol: format!("constants {}", names.join(" ")),
                    type_name: ty,
                });
            }
            constants.extend(names.iter().map(|n| Instance::new(lower(n), ty.clone())));
        }

        Ok(Self {
            name: lower(&spec.name),
            requirements: spec.requirements.iter().map(|r| lower(r)).collect(),
            parents,
            predicates,
            functions,
            constants,
        })
    }

    /// Parse a TOML domain description.
    pub fn from_toml_str(text: &str) -> DomainResult<Self> {
        let spec: DomainSpec = toml::from_str(text).map_err(|e| DomainError::Parse {
            message: e.to_string(),
        })?;
        Self::from_spec(spec)
    }

    /// Load a TOML domain description from disk.
    pub fn load(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DomainError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// All types strictly below `ty`, in name order.
    pub fn subtypes(&self, ty: &str) -> Vec<String> {
        self.parents
            .keys()
            .filter(|candidate| candidate.as_str() != ty && self.is_subtype_of(candidate, ty))
            .cloned()
            .collect()
    }

    fn is_subtype_of(&self, candidate: &str, ancestor: &str) -> bool {
        let mut current = self.parents.get(candidate).cloned().flatten();
        while let Some(t) = current {
            if t == ancestor {
                return true;
            }
            current = self.parents.get(&t).cloned().flatten();
        }
        false
    }

    fn signature(&self, name: &str, params: &[String]) -> Signature {
        Signature {
            name: name.to_string(),
            params: params
                .iter()
                .map(|ty| ParamSpec {
                    type_name: ty.clone(),
                    sub_types: self.subtypes(ty),
                })
                .collect(),
        }
    }
}

fn write_typed_params(out: &mut String, params: &[String]) {
    for (i, ty) in params.iter().enumerate() {
        let _ = write!(out, " ?p{i} - {ty}");
    }
}

impl DomainContract for StaticDomain {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> BTreeSet<String> {
        self.parents.keys().cloned().collect()
    }

    fn predicate(&self, name: &str) -> Option<Signature> {
        let key = lower(name);
        self.predicates
            .get(&key)
            .map(|params| self.signature(&key, params))
    }

    fn function(&self, name: &str) -> Option<Signature> {
        let key = lower(name);
        self.functions
            .get(&key)
            .map(|params| self.signature(&key, params))
    }

    fn exists_domain(&self, name: &str) -> bool {
        lower(name) == self.name
    }

    fn domain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "(define (domain {})", self.name);
        if !self.requirements.is_empty() {
            let reqs: Vec<String> = self.requirements.iter().map(|r| format!(":{r}")).collect();
            let _ = writeln!(out, "  (:requirements {})", reqs.join(" "));
        }
        out.push_str("  (:types\n");
        for (ty, parent) in &self.parents {
            if let Some(parent) = parent {
                let _ = writeln!(out, "    {ty} - {parent}");
            }
        }
        out.push_str("  )\n");
        if !self.constants.is_empty() {
            out.push_str("  (:constants\n");
            for c in &self.constants {
                let _ = writeln!(out, "    {c}");
            }
            out.push_str("  )\n");
        }
        out.push_str("  (:predicates\n");
        for (name, params) in &self.predicates {
            let _ = write!(out, "    ({name}");
            write_typed_params(&mut out, params);
            out.push_str(")\n");
        }
        out.push_str("  )\n");
        if !self.functions.is_empty() {
            out.push_str("  (:functions\n");
            for (name, params) in &self.functions {
                let _ = write!(out, "    ({name}");
                write_typed_params(&mut out, params);
                out.push_str(")\n");
            }
            out.push_str("  )\n");
        }
        out.push_str(")\n");
        out
    }

    fn constants(&self) -> Vec<Instance> {
        self.constants.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
name = "Simple"
requirements = ["strips", "typing"]

[types]
robot = "object"
room = "object"
corridor = "room"
hallway = "corridor"

[predicates]
Robot_At = ["robot", "room"]

[functions]
battery_level = ["robot"]

[constants]
room = ["Charging_Zone"]
"#;

    #[test]
    fn loads_and_normalizes_toml() {
        let domain = StaticDomain::from_toml_str(SIMPLE).unwrap();
        assert_eq!(domain.name(), "simple");
        assert!(domain.exists_domain("SIMPLE"));
        assert!(!domain.exists_domain("other"));
        assert!(domain.types().contains("object"));
        assert!(domain.types().contains("hallway"));

        let sig = domain.predicate("robot_at").unwrap();
        assert_eq!(sig.arity(), 2);
        assert_eq!(sig.params[0].type_name, "robot");
        assert_eq!(domain.predicate("ROBOT_AT").unwrap(), sig);
        assert!(domain.predicate("battery_level").is_none());
        assert!(domain.function("battery_level").is_some());

        assert_eq!(
            domain.constants(),
            vec![Instance::new("charging_zone", "room")]
        );
        assert!(domain.is_constant(&Instance::new("charging_zone", "room")));
    }

    #[test]
    fn subtypes_are_transitive() {
        let domain = StaticDomain::from_toml_str(SIMPLE).unwrap();
        assert_eq!(domain.subtypes("room"), vec!["corridor", "hallway"]);
        assert!(domain.subtypes("robot").is_empty());

        let sig = domain.predicate("robot_at").unwrap();
        assert!(sig.params[1].accepts("room"));
        assert!(sig.params[1].accepts("hallway"));
        assert!(!sig.params[1].accepts("robot"));
    }

    #[test]
    fn rejects_unknown_parent_and_cycles() {
        let err = DomainSpec::new("d").with_type("a", "ghost").build().unwrap_err();
        assert!(matches!(err, DomainError::UnknownParent { .. }));

        let err = DomainSpec::new("d")
            .with_type("a", "b")
            .with_type("b", "a")
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::TypeCycle { .. }));
    }

    #[test]
    fn rejects_undeclared_parameter_types() {
        let err = DomainSpec::new("d")
            .with_predicate("p", ["spaceship"])
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownType { type_name, .. } if type_name == "spaceship"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("domain.toml");
        std::fs::write(&path, SIMPLE).unwrap();
        assert_eq!(StaticDomain::load(&path).unwrap().name(), "simple");

        let missing = StaticDomain::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, DomainError::Read { .. }));
    }

    #[test]
    fn renders_domain_skeleton() {
        let domain = StaticDomain::from_toml_str(SIMPLE).unwrap();
        let text = domain.domain();
        assert!(text.starts_with("(define (domain simple)"));
        assert!(text.contains("(:requirements :strips :typing)"));
        assert!(text.contains("corridor - room"));
        assert!(text.contains("charging_zone - room"));
        assert!(text.contains("(robot_at ?p0 - robot ?p1 - room)"));
        assert!(text.contains("(battery_level ?p0 - robot)"));
    }
}
