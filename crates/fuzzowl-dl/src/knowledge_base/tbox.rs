//! Terminology and role hierarchy

use super::ConcreteFeature;
use crate::axiom::Axiom;
use crate::concept::{Concept, ConceptFactory, ConceptKind, LogicFamily};
use crate::config::Semantics;
use crate::FuzzyDlError;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// General concept inclusion kept as an implication asserted on every individual
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Inclusion {
    pub sub: Concept,
    pub sup: Concept,
    pub degree: f64,
    pub family: LogicFamily,
}

/// Role characteristics and the abstract / concrete partition
#[derive(Debug, Clone, Default)]
pub(crate) struct RoleBox {
    pub abstract_roles: BTreeSet<String>,
    pub features: BTreeMap<String, ConcreteFeature>,
    pub functional: BTreeSet<String>,
    pub inverse_functional: BTreeSet<String>,
    pub transitive: BTreeSet<String>,
    pub symmetric: BTreeSet<String>,
    pub reflexive: BTreeSet<String>,
    pub inverses: BTreeMap<String, BTreeSet<String>>,
    /// `r ↦ [(s, n)]` for `⟨r ⊑ s, n⟩`
    pub parents: BTreeMap<String, Vec<(String, f64)>>,
    pub domains: BTreeMap<String, Vec<Concept>>,
    pub ranges: BTreeMap<String, Vec<Concept>>,
}

impl RoleBox {
    pub fn declare_abstract(&mut self, role: &str) -> Result<(), FuzzyDlError> {
        if self.features.contains_key(role) {
            return Err(FuzzyDlError::RoleKindConflict(format!(
                "{} is a concrete feature and cannot be used as an abstract role",
                role
            )));
        }
        self.abstract_roles.insert(role.to_string());
        Ok(())
    }

    pub fn declare_feature(&mut self, feature: ConcreteFeature) -> Result<(), FuzzyDlError> {
        if self.abstract_roles.contains(&feature.name) {
            return Err(FuzzyDlError::RoleKindConflict(format!(
                "{} is an abstract role and cannot be a concrete feature",
                feature.name
            )));
        }
        if !(feature.k1 < feature.k2) {
            return Err(FuzzyDlError::InvalidConcept(format!(
                "feature {} has an empty range [{}, {}]",
                feature.name, feature.k1, feature.k2
            )));
        }
        self.features.insert(feature.name.clone(), feature);
        Ok(())
    }

    pub fn feature(&self, name: &str) -> Option<&ConcreteFeature> {
        self.features.get(name)
    }

    pub fn is_functional(&self, role: &str) -> bool {
        self.functional.contains(role)
    }

    pub fn is_inverse_functional(&self, role: &str) -> bool {
        self.inverse_functional.contains(role)
    }

    pub fn is_transitive(&self, role: &str) -> bool {
        self.transitive.contains(role)
    }

    pub fn is_symmetric(&self, role: &str) -> bool {
        self.symmetric.contains(role)
    }

    pub fn inverses_of(&self, role: &str) -> Vec<String> {
        self.inverses
            .get(role)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn parents_of(&self, role: &str) -> Vec<(String, f64)> {
        self.parents.get(role).cloned().unwrap_or_default()
    }

    /// Inverse or symmetric roles make subset blocking unsound
    pub fn needs_pairwise_blocking(&self) -> bool {
        !self.inverses.is_empty() || !self.symmetric.is_empty()
    }

    /// Check that the roles of `concept` are used with the right kind
    pub fn check_concept(&mut self, concept: &Concept) -> Result<(), FuzzyDlError> {
        match concept.kind() {
            ConceptKind::Some { role, filler } | ConceptKind::All { role, filler } => {
                if filler.is_concrete() {
                    if self.feature(role).is_none() {
                        return Err(FuzzyDlError::Undefined {
                            kind: "concrete feature",
                            name: role.clone(),
                        });
                    }
                    return Ok(());
                }
                self.declare_abstract(role)?;
            }
            ConceptKind::HasValue { role, .. }
            | ConceptKind::SelfRestriction { role }
            | ConceptKind::Approximation { role, .. }
            | ConceptKind::SigmaCount { role, .. } => self.declare_abstract(role)?,
            _ => {}
        }
        for child in concept.children() {
            self.check_concept(child)?;
        }
        Ok(())
    }
}

/// Concept axioms after normalisation: definitions and primitive
/// definitions per name, inclusions with an atomic left side absorbed into
/// that name, the rest kept general.
#[derive(Debug, Clone, Default)]
pub(crate) struct TBox {
    pub definitions: BTreeMap<String, Concept>,
    pub primitives: BTreeMap<String, Vec<Concept>>,
    pub absorbed: BTreeMap<String, Vec<Inclusion>>,
    pub general: Vec<Inclusion>,
    pub disjoint: BTreeMap<String, BTreeSet<String>>,
    pub roles: RoleBox,
    pub unfolded: bool,
}

impl TBox {
    pub fn add_axiom(&mut self, axiom: Axiom, semantics: Semantics) -> Result<(), FuzzyDlError> {
        match axiom {
            Axiom::ConceptDefinition { name, concept } => {
                self.roles.check_concept(&concept)?;
                require_abstract(&concept)?;
                if concept.atomic_concepts().contains(&name) {
                    // cyclic definitions stay two inclusions
                    let atom = Concept::atomic(name);
                    let family = semantics.default_implication();
                    self.add_inclusion(atom.clone(), concept.clone(), 1.0, family)?;
                    self.add_inclusion(concept, atom, 1.0, family)?;
                } else {
                    self.definitions.insert(name, concept);
                }
            }
            Axiom::PrimitiveDefinition { name, concept } => {
                self.roles.check_concept(&concept)?;
                require_abstract(&concept)?;
                self.primitives.entry(name).or_default().push(concept);
            }
            Axiom::Gci {
                sub,
                sup,
                degree,
                family,
            } => {
                let family = family.unwrap_or_else(|| semantics.default_implication());
                self.add_inclusion(sub, sup, degree, family)?;
            }
            Axiom::EquivalentConcepts(c, d) => {
                let family = semantics.default_implication();
                self.add_inclusion(c.clone(), d.clone(), 1.0, family)?;
                self.add_inclusion(d, c, 1.0, family)?;
            }
            Axiom::Disjoint(names) => {
                for (a, b) in names.iter().tuple_combinations() {
                    self.disjoint.entry(a.clone()).or_default().insert(b.clone());
                    self.disjoint.entry(b.clone()).or_default().insert(a.clone());
                }
            }
            Axiom::Domain { role, concept } => {
                self.roles.declare_abstract(&role)?;
                self.roles.check_concept(&concept)?;
                require_abstract(&concept)?;
                self.roles.domains.entry(role).or_default().push(concept);
            }
            Axiom::Range { role, concept } => {
                self.roles.declare_abstract(&role)?;
                self.roles.check_concept(&concept)?;
                require_abstract(&concept)?;
                self.roles.ranges.entry(role).or_default().push(concept);
            }
            Axiom::Functional(role) => {
                // features are functional anyway
                if self.roles.feature(&role).is_none() {
                    self.roles.declare_abstract(&role)?;
                    self.roles.functional.insert(role);
                }
            }
            Axiom::InverseFunctional(role) => {
                self.roles.declare_abstract(&role)?;
                self.roles.inverse_functional.insert(role);
            }
            Axiom::Transitive(role) => {
                self.roles.declare_abstract(&role)?;
                self.roles.transitive.insert(role);
            }
            Axiom::Symmetric(role) => {
                self.roles.declare_abstract(&role)?;
                self.roles.symmetric.insert(role);
            }
            Axiom::Reflexive(role) => {
                self.roles.declare_abstract(&role)?;
                self.roles.reflexive.insert(role);
            }
            Axiom::RoleInclusion { sub, sup, degree } => {
                check_degree(degree)?;
                self.roles.declare_abstract(&sub)?;
                self.roles.declare_abstract(&sup)?;
                self.roles.parents.entry(sub).or_default().push((sup, degree));
            }
            Axiom::InverseRoles(r, s) => {
                self.roles.declare_abstract(&r)?;
                self.roles.declare_abstract(&s)?;
                self.roles.inverses.entry(r.clone()).or_default().insert(s.clone());
                self.roles.inverses.entry(s).or_default().insert(r);
            }
            Axiom::Similarity(role) => {
                self.roles.declare_abstract(&role)?;
                self.roles.reflexive.insert(role.clone());
                self.roles.symmetric.insert(role);
            }
            Axiom::Equivalence(role) => {
                self.roles.declare_abstract(&role)?;
                self.roles.reflexive.insert(role.clone());
                self.roles.symmetric.insert(role.clone());
                self.roles.transitive.insert(role);
            }
            Axiom::ConcreteFeature { name, kind, k1, k2 } => {
                self.roles.declare_feature(ConcreteFeature { name, kind, k1, k2 })?;
            }
        }
        Ok(())
    }

    fn add_inclusion(
        &mut self,
        sub: Concept,
        sup: Concept,
        degree: f64,
        family: LogicFamily,
    ) -> Result<(), FuzzyDlError> {
        check_degree(degree)?;
        self.roles.check_concept(&sub)?;
        self.roles.check_concept(&sup)?;
        require_abstract(&sub)?;
        require_abstract(&sup)?;
        if degree == 0.0 || sup.is_top() || sub.is_bottom() {
            return Ok(());
        }
        let inclusion = Inclusion {
            sub: sub.clone(),
            sup,
            degree,
            family,
        };
        match sub.kind() {
            ConceptKind::Atomic(name) => self.absorbed.entry(name.clone()).or_default().push(inclusion),
            _ => self.general.push(inclusion),
        }
        Ok(())
    }

    /// Names occurring in the terminology, the candidates for classification
    pub fn concept_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = BTreeSet::new();
        for (name, concept) in &self.definitions {
            names.insert(name.clone());
            names.extend(concept.atomic_concepts());
        }
        for (name, concepts) in &self.primitives {
            names.insert(name.clone());
            for c in concepts {
                names.extend(c.atomic_concepts());
            }
        }
        for (name, inclusions) in &self.absorbed {
            names.insert(name.clone());
            for inclusion in inclusions {
                names.extend(inclusion.sup.atomic_concepts());
            }
        }
        for inclusion in &self.general {
            names.extend(inclusion.sub.atomic_concepts());
            names.extend(inclusion.sup.atomic_concepts());
        }
        for (name, others) in &self.disjoint {
            names.insert(name.clone());
            names.extend(others.iter().cloned());
        }
        names
    }

    /// Substitute acyclic definitions into every other axiom.
    ///
    /// Definitions are unfolded into each other first, in dependency order,
    /// so a single pass over the remaining axioms suffices. Substituted
    /// concepts go through `factory` again.
    pub fn unfold(&mut self, factory: ConceptFactory) {
        if self.unfolded || self.definitions.is_empty() {
            self.unfolded = true;
            return;
        }
        let names: Vec<String> = self.definitions.keys().cloned().collect();
        let mut expanded: BTreeMap<String, Concept> = BTreeMap::new();
        for name in &names {
            let mut visiting = BTreeSet::new();
            self.expand_definition(name, &mut expanded, &mut visiting);
        }
        for definition in expanded.values_mut() {
            *definition = factory.simplify(definition);
        }
        let substitute = |concept: &Concept| -> Concept {
            let mut result = concept.clone();
            for atom in concept.atomic_concepts() {
                if let Some(definition) = expanded.get(&atom) {
                    result = result.replace(&Concept::atomic(atom.as_str()), definition);
                }
            }
            factory.simplify(&result)
        };
        for concepts in self.primitives.values_mut() {
            for c in concepts.iter_mut() {
                *c = substitute(c);
            }
        }
        for inclusions in self.absorbed.values_mut() {
            for inclusion in inclusions.iter_mut() {
                inclusion.sup = substitute(&inclusion.sup);
            }
        }
        for inclusion in self.general.iter_mut() {
            inclusion.sub = substitute(&inclusion.sub);
            inclusion.sup = substitute(&inclusion.sup);
        }
        for concepts in self.roles.domains.values_mut().chain(self.roles.ranges.values_mut()) {
            for c in concepts.iter_mut() {
                *c = substitute(c);
            }
        }
        debug!("unfolded {} concept definitions", expanded.len());
        self.definitions = expanded;
        self.unfolded = true;
    }

    fn expand_definition(
        &self,
        name: &str,
        expanded: &mut BTreeMap<String, Concept>,
        visiting: &mut BTreeSet<String>,
    ) -> Option<Concept> {
        if let Some(done) = expanded.get(name) {
            return Some(done.clone());
        }
        let definition = self.definitions.get(name)?;
        if !visiting.insert(name.to_string()) {
            return None;
        }
        let mut result = definition.clone();
        for atom in definition.atomic_concepts() {
            if let Some(inner) = self.expand_definition(&atom, expanded, visiting) {
                result = result.replace(&Concept::atomic(atom.as_str()), &inner);
            }
        }
        visiting.remove(name);
        expanded.insert(name.to_string(), result.clone());
        Some(result)
    }
}

fn check_degree(degree: f64) -> Result<(), FuzzyDlError> {
    if (0.0..=1.0).contains(&degree) {
        Ok(())
    } else {
        Err(FuzzyDlError::InvalidWeights(format!(
            "axiom degree {} outside [0, 1]",
            degree
        )))
    }
}

fn require_abstract(concept: &Concept) -> Result<(), FuzzyDlError> {
    if concept.is_concrete() {
        return Err(FuzzyDlError::ConcreteMisuse(format!(
            "concrete concept {} used as a terminological concept",
            concept
        )));
    }
    Ok(())
}
