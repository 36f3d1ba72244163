//! Instance and relation degrees

use super::{Bound, Query};
use crate::concept::Concept;
use crate::knowledge_base::KnowledgeBase;
use crate::FuzzyDlError;
use fuzzowl_core::{Expression, Solution};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Greatest lower bound of the degree of `individual : concept`
#[derive(Debug, Clone)]
pub struct MinInstanceQuery {
    individual: String,
    concept: Concept,
}

impl MinInstanceQuery {
    pub fn new(individual: impl Into<String>, concept: Concept) -> Self {
        Self {
            individual: individual.into(),
            concept,
        }
    }
}

impl fmt::Display for MinInstanceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(min-instance? {} {})", self.individual, self.concept)
    }
}

impl Query for MinInstanceQuery {
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        let name = kb.require_individual(&self.individual)?;
        Bound::Min.frame(kb, &name, &self.concept)
    }
}

/// Least upper bound of the degree of `individual : concept`
#[derive(Debug, Clone)]
pub struct MaxInstanceQuery {
    individual: String,
    concept: Concept,
}

impl MaxInstanceQuery {
    pub fn new(individual: impl Into<String>, concept: Concept) -> Self {
        Self {
            individual: individual.into(),
            concept,
        }
    }
}

impl fmt::Display for MaxInstanceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(max-instance? {} {})", self.individual, self.concept)
    }
}

impl Query for MaxInstanceQuery {
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        let name = kb.require_individual(&self.individual)?;
        Bound::Max.frame(kb, &name, &self.concept)
    }

    fn interpret(&self, solution: Solution) -> Solution {
        Bound::Max.interpret(solution)
    }
}

/// Role degree of a pair, asked as `subject : ∃role.{object}`
#[derive(Debug, Clone)]
struct Related {
    subject: String,
    role: String,
    object: String,
}

impl Related {
    fn preprocess(&self, kb: &mut KnowledgeBase, bound: Bound) -> Result<Option<Expression>, FuzzyDlError> {
        let subject = kb.require_individual(&self.subject)?;
        let object = kb.require_individual(&self.object)?;
        bound.frame(kb, &subject, &Concept::has_value(self.role.as_str(), object))
    }
}

/// Greatest lower bound of `role(subject, object)`
#[derive(Debug, Clone)]
pub struct MinRelatedQuery(Related);

impl MinRelatedQuery {
    pub fn new(subject: impl Into<String>, role: impl Into<String>, object: impl Into<String>) -> Self {
        Self(Related {
            subject: subject.into(),
            role: role.into(),
            object: object.into(),
        })
    }
}

impl fmt::Display for MinRelatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(min-related? {} {} {})", self.0.subject, self.0.object, self.0.role)
    }
}

impl Query for MinRelatedQuery {
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        self.0.preprocess(kb, Bound::Min)
    }
}

/// Least upper bound of `role(subject, object)`
#[derive(Debug, Clone)]
pub struct MaxRelatedQuery(Related);

impl MaxRelatedQuery {
    pub fn new(subject: impl Into<String>, role: impl Into<String>, object: impl Into<String>) -> Self {
        Self(Related {
            subject: subject.into(),
            role: role.into(),
            object: object.into(),
        })
    }
}

impl fmt::Display for MaxRelatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(max-related? {} {} {})", self.0.subject, self.0.object, self.0.role)
    }
}

impl Query for MaxRelatedQuery {
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        self.0.preprocess(kb, Bound::Max)
    }

    fn interpret(&self, solution: Solution) -> Solution {
        Bound::Max.interpret(solution)
    }
}

/// Infimum degree of every named individual in a concept.
///
/// The value is the number of individuals with a positive degree; the
/// degrees are the bindings of the solution, keyed by individual.
#[derive(Debug, Clone)]
pub struct AllInstancesQuery {
    concept: Concept,
    results: Vec<(String, f64)>,
}

impl AllInstancesQuery {
    pub fn new(concept: Concept) -> Self {
        Self {
            concept,
            results: Vec::new(),
        }
    }

    /// Degrees computed by the last run, in individual order
    pub fn results(&self) -> &[(String, f64)] {
        &self.results
    }
}

impl fmt::Display for AllInstancesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(all-instances? {})", self.concept)
    }
}

impl Query for AllInstancesQuery {
    fn preprocess(&mut self, _kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        Ok(None)
    }

    fn solve(&mut self, kb: &KnowledgeBase) -> Result<Solution, FuzzyDlError> {
        self.results.clear();
        for name in kb.named_individuals() {
            let solution = MinInstanceQuery::new(name.as_str(), self.concept.clone()).solve(kb)?;
            if !solution.is_consistent_kb() {
                self.results.clear();
                return Ok(solution);
            }
            debug!("{} is an instance of {} with degree {}", name, self.concept, solution.value());
            self.results.push((name, solution.value()));
        }
        let positive = self.results.iter().filter(|(_, d)| *d > 0.0).count();
        let bindings: BTreeMap<String, f64> = self.results.iter().cloned().collect();
        Ok(Solution::with_bindings(positive as f64, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axiom::Axiom;
    use crate::concept::LogicFamily;
    use crate::config::{ReasonerConfig, Semantics};

    fn approx(solution: &Solution, expected: f64) {
        assert!(
            (solution.value() - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            solution
        );
    }

    #[test]
    fn test_min_and_max_instance_of_asserted_concept() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("A"), 0.6).unwrap();
        approx(&MinInstanceQuery::new("a", Concept::atomic("A")).solve(&kb).unwrap(), 0.6);
        approx(&MaxInstanceQuery::new("a", Concept::atomic("A")).solve(&kb).unwrap(), 1.0);
        approx(&MinInstanceQuery::new("a", Concept::atomic("B")).solve(&kb).unwrap(), 0.0);
    }

    #[test]
    fn test_gci_propagates_with_goedel_implication() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::gci(Concept::atomic("A"), Concept::atomic("B"), 0.4)).unwrap();
        kb.add_assertion("a", Concept::atomic("A"), 0.7).unwrap();
        approx(&MinInstanceQuery::new("a", Concept::atomic("B")).solve(&kb).unwrap(), 0.4);
    }

    #[test]
    fn test_lukasiewicz_conjunction() {
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
        kb.add_assertion("a", Concept::atomic("A"), 0.7).unwrap();
        kb.add_assertion("a", Concept::atomic("B"), 0.6).unwrap();
        let both = Concept::and(LogicFamily::Lukasiewicz, vec![Concept::atomic("A"), Concept::atomic("B")]).unwrap();
        approx(&MinInstanceQuery::new("a", both).solve(&kb).unwrap(), 0.3);
    }

    #[test]
    fn test_related_degrees() {
        let mut kb = KnowledgeBase::default();
        kb.add_relation("a", "r", "b", 0.7).unwrap();
        approx(&MinRelatedQuery::new("a", "r", "b").solve(&kb).unwrap(), 0.7);
        approx(&MaxRelatedQuery::new("a", "r", "b").solve(&kb).unwrap(), 1.0);
    }

    #[test]
    fn test_existential_through_relation() {
        let mut kb = KnowledgeBase::default();
        kb.add_relation("a", "r", "b", 0.7).unwrap();
        kb.add_assertion("b", Concept::atomic("C"), 0.5).unwrap();
        let query = Concept::some("r", Concept::atomic("C"));
        approx(&MinInstanceQuery::new("a", query).solve(&kb).unwrap(), 0.5);
    }

    #[test]
    fn test_all_instances() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("A"), 0.6).unwrap();
        kb.add_assertion("b", Concept::atomic("A"), 0.3).unwrap();
        kb.add_individual("c").unwrap();
        let mut query = AllInstancesQuery::new(Concept::atomic("A"));
        let solution = query.solve(&kb).unwrap();
        assert_eq!(solution.value(), 2.0);
        assert_eq!(query.results().len(), 3);
        assert_eq!(solution.binding("a"), Some(0.6));
        assert_eq!(solution.binding("c"), Some(0.0));
    }
}
