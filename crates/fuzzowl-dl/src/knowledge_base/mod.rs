//! Fuzzy knowledge base: terminology, individuals and the MILP model they compile to

pub mod classification;

mod blocking;
mod completion;
mod encoding;
mod tbox;

use crate::axiom::Axiom;
use crate::concept::{Concept, ConceptFactory, ConceptKind, LogicFamily};
use crate::config::{DynamicBlocking, ReasonerConfig, Semantics};
use crate::FuzzyDlError;
use classification::ClassificationGraph;
use fuzzowl_core::{Degree, Expression, MilpModel, SimplexSolver, Solution, Variable, VariableKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tbox::TBox;
use tracing::{debug, trace};

/// Value type of a concrete feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Integer,
    Real,
}

/// Functional concrete feature with values in `[k1, k2]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteFeature {
    pub name: String,
    pub kind: FeatureKind,
    pub k1: f64,
    pub k2: f64,
}

/// Whether an individual was declared or generated during completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndividualKind {
    /// Declared by the user, or a query witness
    Named,
    /// Witness of an existential restriction
    Created {
        parent: String,
        role: String,
        depth: usize,
    },
}

/// A node of the completion graph
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    name: String,
    kind: IndividualKind,
    labels: HashSet<Concept>,
    successors: BTreeMap<String, BTreeSet<String>>,
    predecessors: BTreeMap<String, BTreeSet<String>>,
}

impl Individual {
    fn new(name: String, kind: IndividualKind) -> Self {
        Self {
            name,
            kind,
            labels: HashSet::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &IndividualKind {
        &self.kind
    }

    pub fn is_named(&self) -> bool {
        matches!(self.kind, IndividualKind::Named)
    }

    pub fn is_created(&self) -> bool {
        !self.is_named()
    }

    pub fn parent(&self) -> Option<&str> {
        match &self.kind {
            IndividualKind::Created { parent, .. } => Some(parent),
            IndividualKind::Named => None,
        }
    }

    /// Concepts asserted on the individual
    pub fn labels(&self) -> &HashSet<Concept> {
        &self.labels
    }

    pub fn successors(&self, role: &str) -> impl Iterator<Item = &String> {
        self.successors.get(role).into_iter().flatten()
    }

    pub fn predecessors(&self, role: &str) -> impl Iterator<Item = &String> {
        self.predecessors.get(role).into_iter().flatten()
    }

    /// Every outgoing edge as `(role, object)`
    pub fn edges(&self) -> impl Iterator<Item = (&String, &String)> {
        self.successors
            .iter()
            .flat_map(|(role, targets)| targets.iter().map(move |t| (role, t)))
    }
}

/// User assertion `⟨a : C ≥ n⟩`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub individual: String,
    pub concept: Concept,
    #[serde(default = "one")]
    pub degree: f64,
}

/// User assertion `⟨(a, b) : r ≥ n⟩`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationAssertion {
    pub subject: String,
    pub role: String,
    pub object: String,
    #[serde(default = "one")]
    pub degree: f64,
}

fn one() -> f64 {
    1.0
}

/// Completion bookkeeping; cloned together with the model
#[derive(Debug, Clone, Default)]
struct Completion {
    processed: HashSet<(String, Concept)>,
    pending: VecDeque<(String, Concept)>,
    generating: VecDeque<(String, Concept)>,
    blocked_pending: Vec<(String, Concept)>,
    universals: HashMap<String, Vec<Concept>>,
    applied: HashSet<(String, Concept, String)>,
    exact: HashMap<(String, Concept), Expression>,
    /// static blocking: blocked node and its blocker
    blocked: BTreeMap<String, String>,
    reused: HashSet<(String, String)>,
    created: usize,
    witnesses: usize,
    dynamic: bool,
}

/// Fuzzy knowledge base.
///
/// Assertions are compiled eagerly into constraints of a [`MilpModel`];
/// completion rules run lazily before a query is optimised. Queries work on
/// clones, so nothing a query adds leaks back.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    config: ReasonerConfig,
    factory: ConceptFactory,
    tbox: TBox,
    individuals: BTreeMap<String, Individual>,
    aliases: BTreeMap<String, String>,
    assertions: Vec<Assertion>,
    relations: Vec<RelationAssertion>,
    model: MilpModel,
    state: Completion,
    classification: Option<ClassificationGraph>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(ReasonerConfig::default())
    }
}

impl KnowledgeBase {
    pub fn new(config: ReasonerConfig) -> Self {
        let state = Completion {
            dynamic: matches!(config.dynamic_blocking, DynamicBlocking::Always),
            ..Default::default()
        };
        Self {
            factory: ConceptFactory::new(config.optimizations),
            model: MilpModel::with_tolerance(config.solver.tolerance),
            config,
            tbox: TBox::default(),
            individuals: BTreeMap::new(),
            aliases: BTreeMap::new(),
            assertions: Vec::new(),
            relations: Vec::new(),
            state,
            classification: None,
        }
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    pub fn semantics(&self) -> Semantics {
        self.config.semantics
    }

    /// Concept constructors honouring the optimisations flag
    pub fn factory(&self) -> ConceptFactory {
        self.factory
    }

    pub fn individuals(&self) -> &BTreeMap<String, Individual> {
        &self.individuals
    }

    pub fn individual(&self, name: &str) -> Option<&Individual> {
        self.individuals.get(self.resolve(name))
    }

    /// Named individuals that were not merged into another one
    pub fn named_individuals(&self) -> Vec<String> {
        self.individuals
            .values()
            .filter(|i| i.is_named() && !self.aliases.contains_key(&i.name) && !i.name.starts_with('_'))
            .map(|i| i.name.clone())
            .collect()
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn relations(&self) -> &[RelationAssertion] {
        &self.relations
    }

    pub fn model(&self) -> &MilpModel {
        &self.model
    }

    pub fn classification(&self) -> Option<&ClassificationGraph> {
        self.classification.as_ref()
    }

    /// Whether the completion re-evaluates blocking as labels grow
    pub fn is_dynamic_blocking(&self) -> bool {
        self.state.dynamic
    }

    /// Canonical name after merges
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        while let Some(next) = self.aliases.get(current) {
            current = next;
        }
        current
    }

    pub fn add_axiom(&mut self, axiom: Axiom) -> Result<(), FuzzyDlError> {
        let factory = self.factory;
        let axiom = axiom.map_concepts(|c| factory.simplify(c));
        for concept in axiom_concepts(&axiom) {
            self.note_concept(concept);
        }
        let semantics = self.config.semantics;
        let known_general = self.tbox.general.len();
        let known_reflexive = self.tbox.roles.reflexive.clone();
        self.tbox.add_axiom(axiom, semantics)?;

        // individuals declared earlier still receive the new global axioms
        let inclusions: Vec<_> = self.tbox.general[known_general..].to_vec();
        let reflexive: Vec<String> = self
            .tbox
            .roles
            .reflexive
            .difference(&known_reflexive)
            .cloned()
            .collect();
        if inclusions.is_empty() && reflexive.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = self.individuals.keys().cloned().collect();
        for name in names {
            for inclusion in &inclusions {
                self.apply_inclusion(&name, inclusion)?;
            }
            for role in &reflexive {
                self.relate(&name, role, &name, Degree::one())?;
            }
        }
        Ok(())
    }

    pub fn add_individual(&mut self, name: &str) -> Result<(), FuzzyDlError> {
        self.ensure_individual(name, IndividualKind::Named)?;
        Ok(())
    }

    /// `⟨individual : concept ≥ degree⟩`
    pub fn add_assertion(
        &mut self,
        individual: &str,
        concept: Concept,
        degree: f64,
    ) -> Result<(), FuzzyDlError> {
        check_degree(degree)?;
        self.tbox.roles.check_concept(&concept)?;
        let concept = self.factory.simplify(&concept);
        self.note_concept(&concept);
        self.assertions.push(Assertion {
            individual: individual.to_string(),
            concept: concept.clone(),
            degree,
        });
        self.ensure_individual(individual, IndividualKind::Named)?;
        let name = self.resolve(individual).to_string();
        self.assert_degree(&name, &concept, Degree::Numeric(degree))
    }

    /// `⟨(subject, object) : role ≥ degree⟩`
    pub fn add_relation(
        &mut self,
        subject: &str,
        role: &str,
        object: &str,
        degree: f64,
    ) -> Result<(), FuzzyDlError> {
        check_degree(degree)?;
        self.tbox.roles.declare_abstract(role)?;
        self.relations.push(RelationAssertion {
            subject: subject.to_string(),
            role: role.to_string(),
            object: object.to_string(),
            degree,
        });
        self.ensure_individual(subject, IndividualKind::Named)?;
        self.ensure_individual(object, IndividualKind::Named)?;
        let (a, b) = (self.resolve(subject).to_string(), self.resolve(object).to_string());
        self.relate(&a, role, &b, Degree::Numeric(degree))
    }

    /// Fix the value of a concrete feature: `individual.feature = value`
    pub fn set_feature_value(
        &mut self,
        individual: &str,
        feature: &str,
        value: f64,
    ) -> Result<(), FuzzyDlError> {
        let range = self
            .tbox
            .roles
            .feature(feature)
            .cloned()
            .ok_or_else(|| FuzzyDlError::Undefined {
                kind: "concrete feature",
                name: feature.to_string(),
            })?;
        if value < range.k1 || value > range.k2 {
            return Err(FuzzyDlError::InvalidConcept(format!(
                "value {} outside the range [{}, {}] of {}",
                value, range.k1, range.k2, feature
            )));
        }
        self.ensure_individual(individual, IndividualKind::Named)?;
        let name = self.resolve(individual).to_string();
        let variable = self.feature_variable(&name, feature)?;
        self.model.restrict_bounds(variable, value, value);
        Ok(())
    }

    /// Copy sharing the terminology and configuration but no individuals
    pub fn clone_without_abox(&self) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new(self.config.clone());
        kb.tbox = self.tbox.clone();
        kb.state.dynamic = self.state.dynamic;
        kb
    }

    /// Eager terminology work: acyclic definitions are unfolded, then the
    /// ABox is completed once so that queries start from the expanded state.
    pub fn solve_kb(&mut self) -> Result<(), FuzzyDlError> {
        self.tbox.unfold(self.factory);
        self.complete()?;
        debug!(
            "knowledge base expanded: {} individuals, {} variables, {} constraints",
            self.individuals.len(),
            self.model.num_variables(),
            self.model.num_constraints()
        );
        Ok(())
    }

    /// Whether the knowledge base has a model
    pub fn is_consistent(&self) -> Result<bool, FuzzyDlError> {
        let mut kb = self.clone();
        Ok(kb.optimize(None)?.is_consistent_kb())
    }

    /// Compute and store the concept hierarchy of the terminology
    pub fn classify(&mut self) -> Result<&ClassificationGraph, FuzzyDlError> {
        let graph = ClassificationGraph::compute(self)?;
        Ok(self.classification.insert(graph))
    }

    /// Record syntactic triggers of dynamic blocking
    pub(crate) fn note_concept(&mut self, concept: &Concept) {
        if self.state.dynamic || !matches!(self.config.dynamic_blocking, DynamicBlocking::Auto) {
            return;
        }
        if concept.needs_dynamic_blocking() || concept.negate().needs_dynamic_blocking() {
            debug!("{} requires dynamic blocking", concept);
            self.state.dynamic = true;
        }
    }

    /// Fresh named individual for queries about an arbitrary element
    pub(crate) fn new_witness(&mut self) -> Result<String, FuzzyDlError> {
        self.state.witnesses += 1;
        let name = format!("_w{}", self.state.witnesses);
        self.ensure_individual(&name, IndividualKind::Named)?;
        Ok(name)
    }

    pub(crate) fn require_individual(&self, name: &str) -> Result<String, FuzzyDlError> {
        let resolved = self.resolve(name);
        if self.individuals.contains_key(resolved) {
            Ok(resolved.to_string())
        } else {
            Err(FuzzyDlError::Undefined {
                kind: "individual",
                name: name.to_string(),
            })
        }
    }

    pub(crate) fn model_mut(&mut self) -> &mut MilpModel {
        &mut self.model
    }

    /// Complete the knowledge base and optimise `objective` (feasibility
    /// only when absent). The value is the raw objective, unrounded.
    pub(crate) fn optimize(&mut self, objective: Option<Expression>) -> Result<Solution, FuzzyDlError> {
        self.complete()?;
        self.add_reuse_constraints();
        if self.model.is_trivially_infeasible() {
            debug!("inconsistent before optimisation");
            return Ok(Solution::inconsistent());
        }
        self.model.set_objective(objective);
        let solver = SimplexSolver::new(self.config.solver.clone());
        Ok(self.model.solve(&solver)?)
    }

    fn ensure_individual(&mut self, name: &str, kind: IndividualKind) -> Result<bool, FuzzyDlError> {
        if self.individuals.contains_key(self.resolve(name)) {
            return Ok(false);
        }
        self.individuals
            .insert(name.to_string(), Individual::new(name.to_string(), kind));
        self.initialise_individual(name)?;
        Ok(true)
    }

    /// General inclusions and reflexive roles hold on every individual
    fn initialise_individual(&mut self, name: &str) -> Result<(), FuzzyDlError> {
        let inclusions = self.tbox.general.clone();
        for inclusion in &inclusions {
            self.apply_inclusion(name, inclusion)?;
        }
        let reflexive: Vec<String> = self.tbox.roles.reflexive.iter().cloned().collect();
        for role in reflexive {
            self.relate(name, &role, name, Degree::one())?;
        }
        Ok(())
    }

    fn apply_inclusion(&mut self, name: &str, inclusion: &tbox::Inclusion) -> Result<(), FuzzyDlError> {
        // ⊤ → D is D for every residuated implication
        let concept = if inclusion.sub.is_top() && !matches!(inclusion.family, LogicFamily::Zadeh) {
            inclusion.sup.clone()
        } else {
            Concept::implies(inclusion.family, inclusion.sub.clone(), inclusion.sup.clone())?
        };
        self.assert_degree(name, &concept, Degree::Numeric(inclusion.degree))
    }

    fn variable(&mut self, name: &str) -> Variable {
        match self.config.semantics {
            Semantics::Classical => self.model.get_binary_variable(name),
            _ => self.model.get_variable(name),
        }
    }

    /// Lower-bound expression of the degree of `individual : concept`
    pub(crate) fn membership(&mut self, individual: &str, concept: &Concept) -> Expression {
        match concept.kind() {
            ConceptKind::Top => Expression::new(1.0),
            ConceptKind::Bottom => Expression::zero(),
            ConceptKind::Not(inner) if inner.is_atomic() => {
                let x = self.variable(&format!("{}:{}", individual, inner));
                Expression::new(1.0) - x
            }
            _ => Expression::from(self.variable(&format!("{}:{}", individual, concept))),
        }
    }

    /// Degree variable of the edge `role(subject, object)`
    pub(crate) fn relation_variable(&mut self, subject: &str, role: &str, object: &str) -> Variable {
        self.variable(&format!("{}({},{})", role, subject, object))
    }

    pub(crate) fn feature_variable(&mut self, individual: &str, feature: &str) -> Result<Variable, FuzzyDlError> {
        let range = self
            .tbox
            .roles
            .feature(feature)
            .cloned()
            .ok_or_else(|| FuzzyDlError::Undefined {
                kind: "concrete feature",
                name: feature.to_string(),
            })?;
        let kind = match range.kind {
            FeatureKind::Integer => VariableKind::Integer,
            FeatureKind::Real => VariableKind::Continuous,
        };
        Ok(self
            .model
            .get_typed_variable(&format!("{}.{}", individual, feature), kind, range.k1, range.k2))
    }

    /// `expression ≥ degree`
    pub(crate) fn add_lower_bound(&mut self, expression: Expression, degree: &Degree) {
        if degree.is_zero() {
            return;
        }
        let mut lhs = expression;
        degree.subtract_from_expression(&mut lhs);
        if self.config.debug {
            trace!("constraint {} >= 0", lhs);
        }
        self.model.add_ge(lhs, 0.0);
    }

    /// Assert `individual : concept ≥ degree` and schedule its completion rule
    pub(crate) fn assert_degree(
        &mut self,
        individual: &str,
        concept: &Concept,
        degree: Degree,
    ) -> Result<(), FuzzyDlError> {
        if concept.is_concrete() {
            return Err(FuzzyDlError::ConcreteMisuse(format!(
                "concrete concept {} asserted on {}",
                concept, individual
            )));
        }
        let name = self.resolve(individual).to_string();
        if !self.individuals.contains_key(&name) {
            self.ensure_individual(&name, IndividualKind::Named)?;
        }
        let membership = self.membership(&name, concept);
        self.add_lower_bound(membership, &degree);
        self.touch(&name, concept);
        Ok(())
    }

    /// Schedule the completion rule of `individual : concept` once
    pub(crate) fn touch(&mut self, individual: &str, concept: &Concept) {
        let key = (individual.to_string(), concept.clone());
        if self.state.processed.contains(&key) {
            return;
        }
        if let Some(node) = self.individuals.get_mut(individual) {
            node.labels.insert(concept.clone());
        }
        self.state.processed.insert(key.clone());
        self.state.pending.push_back(key);
    }

    /// Create a successor of `parent`
    pub(crate) fn create_individual(&mut self, parent: &str, role: &str) -> Result<String, FuzzyDlError> {
        if self.state.created >= self.config.max_created_individuals {
            return Err(FuzzyDlError::ExpansionLimit(self.config.max_created_individuals));
        }
        self.state.created += 1;
        let depth = match self.individuals.get(parent).map(|p| &p.kind) {
            Some(IndividualKind::Created { depth, .. }) => depth + 1,
            _ => 1,
        };
        let name = format!("_i{}", self.state.created);
        trace!("created {} as {}-successor of {}", name, role, parent);
        self.ensure_individual(
            &name,
            IndividualKind::Created {
                parent: parent.to_string(),
                role: role.to_string(),
                depth,
            },
        )?;
        Ok(name)
    }

    /// Merge `dropped` into `kept`: labels are re-asserted with the degrees
    /// reached on `dropped` and edges are moved.
    pub(crate) fn merge(&mut self, kept: &str, dropped: &str) -> Result<(), FuzzyDlError> {
        let (kept, dropped) = (self.resolve(kept).to_string(), self.resolve(dropped).to_string());
        if kept == dropped {
            return Ok(());
        }
        debug!("merging {} into {}", dropped, kept);
        let node = match self.individuals.get(&dropped) {
            Some(node) => node.clone(),
            None => return Ok(()),
        };
        self.aliases.insert(dropped.clone(), kept.clone());
        for label in &node.labels {
            let degree = Degree::Expression(self.membership(&dropped, label));
            self.assert_degree(&kept, label, degree)?;
        }
        for (role, targets) in &node.successors {
            for target in targets {
                let x = self.relation_variable(&dropped, role, target);
                let target = self.resolve(target).to_string();
                self.relate(&kept, role, &target, Degree::Variable(x))?;
            }
        }
        for (role, sources) in &node.predecessors {
            for source in sources {
                let x = self.relation_variable(source, role, &dropped);
                let source = self.resolve(source).to_string();
                self.relate(&source, role, &kept, Degree::Variable(x))?;
            }
        }
        Ok(())
    }
}

fn check_degree(degree: f64) -> Result<(), FuzzyDlError> {
    if (0.0..=1.0).contains(&degree) {
        Ok(())
    } else {
        Err(FuzzyDlError::InvalidWeights(format!(
            "degree {} outside [0, 1]",
            degree
        )))
    }
}

fn axiom_concepts(axiom: &Axiom) -> Vec<&Concept> {
    match axiom {
        Axiom::ConceptDefinition { concept, .. }
        | Axiom::PrimitiveDefinition { concept, .. }
        | Axiom::Domain { concept, .. }
        | Axiom::Range { concept, .. } => vec![concept],
        Axiom::Gci { sub, sup, .. } => vec![sub, sup],
        Axiom::EquivalentConcepts(c, d) => vec![c, d],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_creates_individual() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("A"), 0.6).unwrap();
        assert!(kb.individual("a").unwrap().is_named());
        assert!(kb.model().has_variable("a:A"));
        assert_eq!(kb.assertions().len(), 1);
    }

    #[test]
    fn test_concrete_assertion_rejected() {
        let mut kb = KnowledgeBase::default();
        let young = Concept::concrete(
            "young",
            crate::membership::MembershipFunction::LeftShoulder { k1: 0.0, k2: 100.0, a: 20.0, b: 30.0 },
        )
        .unwrap();
        assert!(matches!(
            kb.add_assertion("a", young, 1.0),
            Err(FuzzyDlError::ConcreteMisuse(_))
        ));
    }

    #[test]
    fn test_undefined_feature() {
        let mut kb = KnowledgeBase::default();
        assert!(matches!(
            kb.set_feature_value("a", "age", 30.0),
            Err(FuzzyDlError::Undefined { .. })
        ));
    }

    #[test]
    fn test_clone_isolation() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("A"), 0.6).unwrap();
        let mut cloned = kb.clone();
        cloned.add_assertion("b", Concept::atomic("B"), 0.3).unwrap();
        assert_eq!(kb.individuals().len(), 1);
        assert_eq!(kb.assertions().len(), 1);
        assert_eq!(cloned.individuals().len(), 2);
    }

    #[test]
    fn test_clone_without_abox_keeps_terminology() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::gci(Concept::atomic("A"), Concept::atomic("B"), 1.0)).unwrap();
        kb.add_assertion("a", Concept::atomic("A"), 1.0).unwrap();
        let tbox_only = kb.clone_without_abox();
        assert!(tbox_only.individuals().is_empty());
        assert_eq!(tbox_only.tbox.absorbed.len(), 1);
    }

    #[test]
    fn test_dynamic_blocking_detection() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::some("r", Concept::atomic("A")), 1.0).unwrap();
        assert!(!kb.is_dynamic_blocking());
        let nested = Concept::all("r", Concept::all("r", Concept::atomic("A")));
        kb.add_axiom(Axiom::gci(Concept::atomic("B"), nested, 1.0)).unwrap();
        assert!(kb.is_dynamic_blocking());
    }

    #[test]
    fn test_lukasiewicz_contradiction_is_inconsistent() {
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
        let c = Concept::atomic("C");
        kb.add_assertion("a", c.clone(), 0.9).unwrap();
        kb.add_assertion("a", -c, 0.9).unwrap();
        assert!(!kb.is_consistent().unwrap());
    }

    #[test]
    fn test_gci_on_every_individual() {
        let mut kb = KnowledgeBase::default();
        let sub = Concept::and(LogicFamily::Zadeh, vec![Concept::atomic("A"), Concept::atomic("B")]).unwrap();
        kb.add_axiom(Axiom::gci(sub, Concept::bottom(), 1.0)).unwrap();
        kb.add_assertion("a", Concept::atomic("A"), 0.7).unwrap();
        assert!(kb.is_consistent().unwrap());
        kb.add_assertion("a", Concept::atomic("B"), 0.6).unwrap();
        assert!(!kb.is_consistent().unwrap());
    }

    #[test]
    fn test_optimisations_drop_empty_existentials() {
        let empty = Concept::some("r", Concept::bottom());

        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", empty.clone(), 0.5).unwrap();
        kb.solve_kb().unwrap();
        assert_eq!(kb.assertions()[0].concept, Concept::bottom());
        assert_eq!(kb.individuals().len(), 1);
        assert!(!kb.is_consistent().unwrap());

        let config = ReasonerConfig {
            optimizations: false,
            ..ReasonerConfig::default()
        };
        let mut kb = KnowledgeBase::new(config);
        kb.add_assertion("a", empty.clone(), 0.5).unwrap();
        kb.solve_kb().unwrap();
        assert_eq!(kb.assertions()[0].concept, empty);
        assert_eq!(kb.individuals().len(), 2);
        assert!(!kb.is_consistent().unwrap());
    }

    #[test]
    fn test_optimisations_apply_to_axioms() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::gci(
            Concept::atomic("A"),
            Concept::some("r", Concept::bottom()),
            1.0,
        ))
        .unwrap();
        kb.add_assertion("a", Concept::atomic("B"), 1.0).unwrap();
        kb.solve_kb().unwrap();
        assert_eq!(kb.individuals().len(), 1);
    }
}
