//! The knowledge base: the validated, mutable model of the planning world.
//!
//! A [`KnowledgeBase`] owns instances, ground predicates, ground functions,
//! contingent facts ("conditionals") and one goal tree. Every mutation either
//! commits a fully valid new state or returns a [`KnowledgeError`] and leaves
//! the prior state untouched.
//!
//! The domain is consulted read-only through [`DomainContract`]; it decides
//! which types exist and what each predicate and function signature looks like.
//!
//! Access is single-threaded: mutators take `&mut self`, so an embedder that
//! shares a knowledge base across threads has to serialize access itself
//! (single owner, `Mutex`, or an actor).

mod cascade;
mod contingent;
mod satisfy;
mod validate;

use std::sync::Arc;

use crate::domain::DomainContract;
use crate::error::{KbResult, KnowledgeError};
use crate::instance::Instance;
use crate::tree::{Function, Predicate, Tree};

pub use cascade::CascadeReport;

/// Log a rejected mutation and hand the error back to the caller.
pub(crate) fn rejected<T>(op: &'static str, err: KnowledgeError) -> KbResult<T> {
    tracing::debug!(op, error = %err, "mutation rejected");
    Err(err)
}

/// Validated world state for one planning problem.
pub struct KnowledgeBase {
    domain: Arc<dyn DomainContract>,
    instances: Vec<Instance>,
    predicates: Vec<Predicate>,
    functions: Vec<Function>,
    conditionals: Vec<Tree>,
    goal: Tree,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("domain", &self.domain.name())
            .field("instances", &self.instances.len())
            .field("predicates", &self.predicates.len())
            .field("functions", &self.functions.len())
            .field("conditionals", &self.conditionals.len())
            .field("goal_nodes", &self.goal.len())
            .finish()
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base over `domain`.
    pub fn new(domain: Arc<dyn DomainContract>) -> Self {
        Self {
            domain,
            instances: Vec::new(),
            predicates: Vec::new(),
            functions: Vec::new(),
            conditionals: Vec::new(),
            goal: Tree::new(),
        }
    }

    pub fn domain(&self) -> &dyn DomainContract {
        self.domain.as_ref()
    }

    /// Shared handle to the domain, for building sibling knowledge bases.
    pub fn domain_handle(&self) -> Arc<dyn DomainContract> {
        Arc::clone(&self.domain)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn conditionals(&self) -> &[Tree] {
        &self.conditionals
    }

    pub fn goal(&self) -> &Tree {
        &self.goal
    }

    pub fn get_instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }

    /// Look up a stored predicate by its textual form, e.g. `"(robot_at r2d2 kitchen)"`.
    pub fn get_predicate(&self, expr: &str) -> Option<&Predicate> {
        let probe = self.canonical_predicate(expr.parse().ok()?);
        self.predicates.iter().find(|p| p.same_fact(&probe))
    }

    /// Look up a stored function by its textual form, e.g. `"(battery r2d2)"`.
    ///
    /// Any value in the text is ignored; the stored value is returned.
    pub fn get_function(&self, expr: &str) -> Option<&Function> {
        let probe = self.canonical_function(expr.parse().ok()?);
        self.functions.iter().find(|f| f.same_key(&probe))
    }

    pub fn exist_predicate(&self, predicate: &Predicate) -> bool {
        let predicate = self.canonical_predicate(predicate.clone());
        self.predicates.iter().any(|p| p.same_fact(&predicate))
    }

    pub fn exist_function(&self, function: &Function) -> bool {
        let function = self.canonical_function(function.clone());
        self.functions.iter().any(|f| f.same_key(&function))
    }

    pub fn exist_conditional(&self, conditional: &Tree) -> bool {
        let conditional = self.canonical_tree(conditional.clone());
        self.conditionals.iter().any(|c| c.matches(&conditional))
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// Add an object.
    ///
    /// Re-adding an existing name with the same type succeeds without change;
    /// a different type for an existing name is rejected.
    pub fn add_instance(&mut self, instance: Instance) -> KbResult<()> {
        if !self.is_valid_type(&instance.type_name) {
            return rejected(
                "add_instance",
                KnowledgeError::UnknownType {
                    type_name: instance.type_name,
                },
            );
        }
        match self.get_instance(&instance.name) {
            Some(existing) if existing.type_name == instance.type_name => Ok(()),
            Some(existing) => rejected(
                "add_instance",
                KnowledgeError::InstanceConflict {
                    name: instance.name.clone(),
                    existing: existing.type_name.clone(),
                    requested: instance.type_name,
                },
            ),
            None => {
                self.instances.push(instance);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Predicates
    // -----------------------------------------------------------------------

    /// Add a ground fact. Already-stored facts succeed without change.
    pub fn add_predicate(&mut self, predicate: Predicate) -> KbResult<()> {
        let predicate = self.canonical_predicate(predicate);
        if self.exist_predicate(&predicate) {
            return Ok(());
        }
        if !self.is_valid_predicate(&predicate) {
            return rejected(
                "add_predicate",
                KnowledgeError::InvalidPredicate {
                    expr: predicate.to_string(),
                },
            );
        }
        self.predicates.push(predicate);
        Ok(())
    }

    /// Remove the first stored fact equal to `predicate`.
    ///
    /// Invalid predicates are rejected; a valid but absent one succeeds.
    pub fn remove_predicate(&mut self, predicate: &Predicate) -> KbResult<()> {
        if !self.is_valid_predicate(predicate) {
            return rejected(
                "remove_predicate",
                KnowledgeError::InvalidPredicate {
                    expr: predicate.to_string(),
                },
            );
        }
        let predicate = self.canonical_predicate(predicate.clone());
        if let Some(pos) = self.predicates.iter().position(|p| p.same_fact(&predicate)) {
            self.predicates.remove(pos);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    /// Add a function value, or replace the value of an existing key.
    pub fn add_function(&mut self, function: Function) -> KbResult<()> {
        let function = self.canonical_function(function);
        if self.exist_function(&function) {
            return self.update_function(function);
        }
        if !self.is_valid_function(&function) {
            return rejected(
                "add_function",
                KnowledgeError::InvalidFunction {
                    expr: function.to_string(),
                },
            );
        }
        self.functions.push(function);
        Ok(())
    }

    /// Replace the value of an existing function. Unknown keys are rejected.
    pub fn update_function(&mut self, function: Function) -> KbResult<()> {
        let function = self.canonical_function(function);
        if !self.is_valid_function(&function) {
            return rejected(
                "update_function",
                KnowledgeError::InvalidFunction {
                    expr: function.to_string(),
                },
            );
        }
        match self.functions.iter_mut().find(|f| f.same_key(&function)) {
            Some(stored) => {
                stored.value = function.value;
                Ok(())
            }
            None => rejected(
                "update_function",
                KnowledgeError::FunctionNotFound {
                    expr: function.render_term(crate::tree::CaseFolding::Preserve),
                },
            ),
        }
    }

    /// Remove the stored function with the same key.
    ///
    /// Invalid functions are rejected; a valid but absent one succeeds.
    pub fn remove_function(&mut self, function: &Function) -> KbResult<()> {
        if !self.is_valid_function(function) {
            return rejected(
                "remove_function",
                KnowledgeError::InvalidFunction {
                    expr: function.to_string(),
                },
            );
        }
        let function = self.canonical_function(function.clone());
        if let Some(pos) = self.functions.iter().position(|f| f.same_key(&function)) {
            self.functions.remove(pos);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Goal
    // -----------------------------------------------------------------------

    /// Replace the goal after validating every node of `goal`.
    pub fn set_goal(&mut self, goal: Tree) -> KbResult<()> {
        if !self.check_tree_types(&goal) {
            return rejected(
                "set_goal",
                KnowledgeError::InvalidTree {
                    expr: goal.to_string(),
                },
            );
        }
        self.goal = self.canonical_tree(goal);
        Ok(())
    }

    pub fn clear_goal(&mut self) {
        self.goal.clear();
    }

    /// Reset the whole model to empty. The domain is kept.
    pub fn clear_knowledge(&mut self) {
        self.instances.clear();
        self.predicates.clear();
        self.functions.clear();
        self.conditionals.clear();
        self.goal.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{DomainSpec, StaticDomain};

    /// A small robots-and-rooms domain shared by the kb tests.
    pub(crate) fn robots_domain() -> Arc<dyn DomainContract> {
        let domain: StaticDomain = DomainSpec::new("simple")
            .with_type("robot", "object")
            .with_type("room", "object")
            .with_type("corridor", "room")
            .with_type("person", "object")
            .with_predicate("robot_at", ["robot", "room"])
            .with_predicate("person_at", ["person", "room"])
            .with_predicate("connected", ["room", "room"])
            .with_predicate("charged", ["robot"])
            .with_function("battery", ["robot"])
            .with_function("distance", ["room", "room"])
            .with_constant("base", "room")
            .build()
            .unwrap();
        Arc::new(domain)
    }

    pub(crate) fn populated() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new(robots_domain());
        kb.add_instance(Instance::new("r2d2", "robot")).unwrap();
        kb.add_instance(Instance::new("kitchen", "room")).unwrap();
        kb.add_instance(Instance::new("bedroom", "room")).unwrap();
        kb.add_instance(Instance::new("hall", "corridor")).unwrap();
        kb
    }

    #[test]
    fn add_instance_is_idempotent_for_same_type() {
        let mut kb = populated();
        kb.add_instance(Instance::new("r2d2", "robot")).unwrap();
        assert_eq!(kb.instances().len(), 4);
    }

    #[test]
    fn add_instance_rejects_conflicts_and_unknown_types() {
        let mut kb = populated();
        let err = kb.add_instance(Instance::new("r2d2", "room")).unwrap_err();
        assert!(matches!(err, KnowledgeError::InstanceConflict { .. }));
        assert_eq!(kb.get_instance("r2d2").unwrap().type_name, "robot");

        let err = kb.add_instance(Instance::new("x", "spaceship")).unwrap_err();
        assert!(matches!(err, KnowledgeError::UnknownType { .. }));
        assert!(kb.get_instance("x").is_none());
    }

    #[test]
    fn add_predicate_validates_and_deduplicates() {
        let mut kb = populated();
        let fact = Predicate::new("robot_at", ["r2d2", "kitchen"]);
        kb.add_predicate(fact.clone()).unwrap();
        kb.add_predicate(fact.clone()).unwrap();
        assert_eq!(kb.predicates().len(), 1);

        let bad = Predicate::new("robot_at", ["kitchen", "r2d2"]);
        assert!(kb.add_predicate(bad).is_err());
        assert_eq!(kb.predicates().len(), 1);

        assert!(kb.get_predicate("(robot_at r2d2 kitchen)").is_some());
        assert!(kb.get_predicate("(robot_at r2d2 bedroom)").is_none());
    }

    #[test]
    fn remove_predicate_rejects_invalid_and_tolerates_absent() {
        let mut kb = populated();
        let fact = Predicate::new("robot_at", ["r2d2", "kitchen"]);
        kb.add_predicate(fact.clone()).unwrap();

        assert!(kb.remove_predicate(&Predicate::new("flying", ["r2d2"])).is_err());
        kb.remove_predicate(&Predicate::new("robot_at", ["r2d2", "bedroom"]))
            .unwrap();
        assert_eq!(kb.predicates().len(), 1);

        kb.remove_predicate(&fact).unwrap();
        assert!(kb.predicates().is_empty());
    }

    #[test]
    fn add_function_replaces_existing_value() {
        let mut kb = populated();
        kb.add_function(Function::new("battery", ["r2d2"], 80.0)).unwrap();
        kb.add_function(Function::new("battery", ["r2d2"], 35.0)).unwrap();
        assert_eq!(kb.functions().len(), 1);
        assert_eq!(kb.get_function("(battery r2d2)").unwrap().value, 35.0);
    }

    #[test]
    fn update_function_requires_existing_entry() {
        let mut kb = populated();
        let err = kb
            .update_function(Function::new("battery", ["r2d2"], 10.0))
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::FunctionNotFound { .. }));

        kb.add_function(Function::new("battery", ["r2d2"], 80.0)).unwrap();
        kb.update_function(Function::new("battery", ["r2d2"], 10.0)).unwrap();
        assert_eq!(kb.functions()[0].value, 10.0);

        kb.remove_function(&Function::new("battery", ["r2d2"], 0.0)).unwrap();
        assert!(kb.functions().is_empty());
    }

    #[test]
    fn set_goal_validates_before_commit() {
        let mut kb = populated();
        let good = Tree::from_predicate(Predicate::new("robot_at", ["r2d2", "bedroom"]));
        kb.set_goal(good.clone()).unwrap();

        let bad = Tree::from_predicate(Predicate::new("robot_at", ["r2d2", "mars"]));
        assert!(kb.set_goal(bad).is_err());
        assert!(kb.goal().matches(&good));

        kb.clear_goal();
        assert!(kb.goal().is_empty());
    }

    #[test]
    fn empty_goal_is_accepted_and_clears() {
        let mut kb = populated();
        kb.set_goal(Tree::from_predicate(Predicate::new("charged", ["r2d2"])))
            .unwrap();
        kb.set_goal(Tree::new()).unwrap();
        assert!(kb.goal().is_empty());
        assert!(kb.is_goal_satisfied(kb.goal()));
    }

    #[test]
    fn mixed_case_names_are_stored_as_declared() {
        let mut kb = populated();
        kb.add_predicate(Predicate::new("Charged", ["r2d2"])).unwrap();
        kb.add_predicate(Predicate::new("charged", ["r2d2"])).unwrap();
        assert_eq!(kb.predicates().len(), 1);
        assert_eq!(kb.predicates()[0].name, "charged");
        assert_eq!(kb.get_problem().matches("(charged r2d2)").count(), 1);

        let goal = Tree::from_predicate(Predicate::new("CHARGED", ["r2d2"]));
        assert!(kb.is_goal_satisfied(&goal));
        kb.set_goal(goal).unwrap();
        assert_eq!(kb.goal().predicates()[0].name, "charged");

        kb.add_function(Function::new("Battery", ["r2d2"], 80.0)).unwrap();
        kb.add_function(Function::new("battery", ["r2d2"], 20.0)).unwrap();
        assert_eq!(kb.functions().len(), 1);
        assert_eq!(kb.get_function("(BATTERY r2d2)").unwrap().value, 20.0);

        kb.remove_predicate(&Predicate::new("charged", ["r2d2"])).unwrap();
        kb.remove_function(&Function::new("BATTERY", ["r2d2"], 0.0)).unwrap();
        assert!(kb.predicates().is_empty());
        assert!(kb.functions().is_empty());
    }

    #[test]
    fn mixed_case_conditionals_are_deduplicated() {
        let mut kb = populated();
        kb.add_conditional(Tree::unknown(Predicate::new("Charged", ["r2d2"])))
            .unwrap();
        let err = kb
            .add_conditional(Tree::unknown(Predicate::new("charged", ["r2d2"])))
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::DuplicateConditional { .. }));
        kb.remove_conditional(&Tree::unknown(Predicate::new("CHARGED", ["r2d2"])))
            .unwrap();
        assert!(kb.conditionals().is_empty());
    }

    #[test]
    fn clear_knowledge_empties_everything() {
        let mut kb = populated();
        kb.add_predicate(Predicate::new("charged", ["r2d2"])).unwrap();
        kb.set_goal(Tree::from_predicate(Predicate::new("charged", ["r2d2"])))
            .unwrap();
        kb.clear_knowledge();
        assert!(kb.instances().is_empty());
        assert!(kb.predicates().is_empty());
        assert!(kb.goal().is_empty());
        assert_eq!(kb.domain().name(), "simple");
    }
}
