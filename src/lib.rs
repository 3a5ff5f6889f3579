// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # plan-kb
//!
//! The knowledge-base component of a task-planning stack: the current model of
//! a world (objects, true facts, numeric fluents, uncertain facts and a goal)
//! held as validated expression trees, with PDDL problem import and export.
//!
//! ## Architecture
//!
//! - **Expression trees** (`tree`): arena-backed formulas with structural
//!   equality, subtree extraction and a flat exchange shape
//! - **Domain contract** (`domain`): read-only types and signatures, with a
//!   TOML-backed implementation
//! - **Knowledge base** (`kb`): validation, cascading deletion, contingent
//!   facts and goal evaluation
//! - **Problem codec** (`codec`): PDDL problem text in and out
//!
//! ## Library usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use plan_kb::domain::DomainSpec;
//! use plan_kb::instance::Instance;
//! use plan_kb::kb::KnowledgeBase;
//! use plan_kb::tree::{Predicate, Tree};
//!
//! let domain = DomainSpec::new("simple")
//!     .with_type("robot", "object")
//!     .with_type("room", "object")
//!     .with_predicate("robot_at", ["robot", "room"])
//!     .build()
//!     .unwrap();
//!
//! let mut kb = KnowledgeBase::new(Arc::new(domain));
//! kb.add_instance(Instance::new("r2d2", "robot")).unwrap();
//! kb.add_instance(Instance::new("kitchen", "room")).unwrap();
//! kb.add_predicate(Predicate::new("robot_at", ["r2d2", "kitchen"])).unwrap();
//!
//! let goal = Tree::from_predicate(Predicate::new("robot_at", ["r2d2", "kitchen"]));
//! assert!(kb.is_goal_satisfied(&goal));
//! assert!(kb.get_problem().contains("(robot_at r2d2 kitchen)"));
//! ```

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod instance;
pub mod kb;
pub mod tree;
