//! Consistency and concept satisfiability

use super::{Bound, Query};
use crate::concept::Concept;
use crate::knowledge_base::KnowledgeBase;
use crate::FuzzyDlError;
use fuzzowl_core::{Expression, Solution};
use std::fmt;

/// Does the knowledge base have a model? Answers 1.0 or `Inconsistent KB`.
#[derive(Debug, Clone, Default)]
pub struct KbSatisfiableQuery;

impl KbSatisfiableQuery {
    pub fn new() -> Self {
        Self
    }
}

impl fmt::Display for KbSatisfiableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(sat?)")
    }
}

impl Query for KbSatisfiableQuery {
    fn preprocess(&mut self, _kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        Ok(None)
    }

    fn interpret(&self, solution: Solution) -> Solution {
        if solution.is_consistent_kb() {
            Solution::with_bindings(1.0, solution.bindings().clone())
        } else {
            solution
        }
    }
}

/// Satisfiability degree of a concept, on a given individual or on a fresh one
#[derive(Debug, Clone)]
struct Satisfiable {
    bound: Bound,
    concept: Concept,
    individual: Option<String>,
}

impl Satisfiable {
    fn preprocess(&self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        let name = match &self.individual {
            Some(name) => kb.require_individual(name)?,
            None => kb.new_witness()?,
        };
        self.bound.frame(kb, &name, &self.concept)
    }

    fn describe(&self, keyword: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.individual {
            Some(a) => write!(f, "({} {} {})", keyword, self.concept, a),
            None => write!(f, "({} {})", keyword, self.concept),
        }
    }
}

/// Infimum satisfiability degree
#[derive(Debug, Clone)]
pub struct MinSatisfiableQuery(Satisfiable);

impl MinSatisfiableQuery {
    pub fn new(concept: Concept) -> Self {
        Self(Satisfiable {
            bound: Bound::Min,
            concept,
            individual: None,
        })
    }

    pub fn for_individual(concept: Concept, individual: impl Into<String>) -> Self {
        Self(Satisfiable {
            bound: Bound::Min,
            concept,
            individual: Some(individual.into()),
        })
    }
}

impl fmt::Display for MinSatisfiableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.describe("min-sat?", f)
    }
}

impl Query for MinSatisfiableQuery {
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        self.0.preprocess(kb)
    }
}

/// Supremum satisfiability degree
#[derive(Debug, Clone)]
pub struct MaxSatisfiableQuery(Satisfiable);

impl MaxSatisfiableQuery {
    pub fn new(concept: Concept) -> Self {
        Self(Satisfiable {
            bound: Bound::Max,
            concept,
            individual: None,
        })
    }

    pub fn for_individual(concept: Concept, individual: impl Into<String>) -> Self {
        Self(Satisfiable {
            bound: Bound::Max,
            concept,
            individual: Some(individual.into()),
        })
    }
}

impl fmt::Display for MaxSatisfiableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.describe("max-sat?", f)
    }
}

impl Query for MaxSatisfiableQuery {
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        self.0.preprocess(kb)
    }

    fn interpret(&self, solution: Solution) -> Solution {
        self.0.bound.interpret(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axiom::Axiom;
    use crate::concept::LogicFamily;

    #[test]
    fn test_kb_satisfiable() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("A"), 0.4).unwrap();
        let solution = KbSatisfiableQuery::new().solve(&kb).unwrap();
        assert_eq!(solution.value(), 1.0);
    }

    #[test]
    fn test_unsatisfiable_concept() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::gci(Concept::atomic("A"), Concept::bottom(), 1.0)).unwrap();
        let max = MaxSatisfiableQuery::new(Concept::atomic("A")).solve(&kb).unwrap();
        assert_eq!(max.value(), 0.0);
        let b = MaxSatisfiableQuery::new(Concept::atomic("B")).solve(&kb).unwrap();
        assert_eq!(b.value(), 1.0);
    }

    #[test]
    fn test_zadeh_contradiction_half_satisfiable() {
        let kb = KnowledgeBase::default();
        let a = Concept::atomic("A");
        let both = Concept::and(LogicFamily::Zadeh, vec![a.clone(), -a]).unwrap();
        let max = MaxSatisfiableQuery::new(both).solve(&kb).unwrap();
        assert!((max.value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_individual() {
        let kb = KnowledgeBase::default();
        let result = MinSatisfiableQuery::for_individual(Concept::atomic("A"), "ghost").solve(&kb);
        assert!(matches!(result, Err(FuzzyDlError::Undefined { .. })));
    }
}
