//! Domain contract: the static, read-only planning domain.
//!
//! The knowledge base never owns or mutates the domain. It only asks which
//! types exist, what signature a predicate or function has, and which objects
//! are domain constants. Any domain model can be plugged in by implementing
//! [`DomainContract`]; [`StaticDomain`] is the bundled implementation, built
//! in code or loaded from TOML.

mod static_domain;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::instance::Instance;

pub use static_domain::{DomainSpec, StaticDomain};

/// Type constraint for one signature position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Declared type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Types declared (transitively) as subtypes of `type_name`.
    #[serde(default)]
    pub sub_types: Vec<String>,
}

impl ParamSpec {
    /// Whether an instance of `type_name` may fill this position.
    pub fn accepts(&self, type_name: &str) -> bool {
        self.type_name == type_name || self.sub_types.iter().any(|t| t == type_name)
    }
}

/// Signature of a domain predicate or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Read-only view of a planning domain.
pub trait DomainContract: Send + Sync {
    /// Domain name, as written in a problem's `(:domain …)` clause.
    fn name(&self) -> &str;

    /// All declared types.
    fn types(&self) -> BTreeSet<String>;

    /// Signature of predicate `name`, if declared.
    fn predicate(&self, name: &str) -> Option<Signature>;

    /// Signature of function `name`, if declared.
    fn function(&self, name: &str) -> Option<Signature>;

    /// Whether this contract answers for a domain called `name`.
    fn exists_domain(&self, name: &str) -> bool;

    /// The domain definition as text. Opaque to the knowledge base.
    fn domain(&self) -> String;

    /// Objects declared by the domain itself.
    fn constants(&self) -> Vec<Instance>;

    /// Whether `instance` is one of the domain constants.
    fn is_constant(&self, instance: &Instance) -> bool {
        self.constants()
            .iter()
            .any(|c| c.name == instance.name && c.type_name == instance.type_name)
    }
}
