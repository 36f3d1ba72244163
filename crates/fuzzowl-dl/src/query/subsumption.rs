//! Subsumption degrees and classification

use super::{Bound, Query};
use crate::concept::{Concept, LogicFamily};
use crate::knowledge_base::classification::ClassificationGraph;
use crate::knowledge_base::KnowledgeBase;
use crate::FuzzyDlError;
use fuzzowl_core::{Expression, Solution};
use std::fmt;

/// Degree of `sub ⊑ sup`: the implication evaluated on an arbitrary element
#[derive(Debug, Clone)]
struct Subsumes {
    sub: Concept,
    sup: Concept,
    family: LogicFamily,
}

impl Subsumes {
    /// The terminology alone suffices when there is no ABox to be
    /// inconsistent and no nominal to refer into it
    fn working_copy(&self, kb: &KnowledgeBase) -> KnowledgeBase {
        if kb.individuals().is_empty() && !self.sub.has_nominals() && !self.sup.has_nominals() {
            kb.clone_without_abox()
        } else {
            kb.clone()
        }
    }

    fn preprocess(&self, kb: &mut KnowledgeBase, bound: Bound) -> Result<Option<Expression>, FuzzyDlError> {
        let implication = Concept::implies(self.family, self.sub.clone(), self.sup.clone())?;
        let witness = kb.new_witness()?;
        bound.frame(kb, &witness, &implication)
    }

    fn describe(&self, keyword: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {} {:?})", keyword, self.sub, self.sup, self.family)
    }
}

/// Infimum degree of `sub ⊑ sup`
#[derive(Debug, Clone)]
pub struct MinSubsumesQuery(Subsumes);

impl MinSubsumesQuery {
    pub fn new(sub: Concept, sup: Concept, family: LogicFamily) -> Self {
        Self(Subsumes { sub, sup, family })
    }
}

impl fmt::Display for MinSubsumesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.describe("min-subs?", f)
    }
}

impl Query for MinSubsumesQuery {
    fn working_copy(&self, kb: &KnowledgeBase) -> KnowledgeBase {
        self.0.working_copy(kb)
    }

    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        self.0.preprocess(kb, Bound::Min)
    }
}

/// Supremum degree of `sub ⊑ sup`
#[derive(Debug, Clone)]
pub struct MaxSubsumesQuery(Subsumes);

impl MaxSubsumesQuery {
    pub fn new(sub: Concept, sup: Concept, family: LogicFamily) -> Self {
        Self(Subsumes { sub, sup, family })
    }
}

impl fmt::Display for MaxSubsumesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.describe("max-subs?", f)
    }
}

impl Query for MaxSubsumesQuery {
    fn working_copy(&self, kb: &KnowledgeBase) -> KnowledgeBase {
        self.0.working_copy(kb)
    }

    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        self.0.preprocess(kb, Bound::Max)
    }

    fn interpret(&self, solution: Solution) -> Solution {
        Bound::Max.interpret(solution)
    }
}

/// Classify the terminology. The value is the number of hierarchy nodes.
#[derive(Debug, Clone, Default)]
pub struct ClassifyQuery {
    graph: Option<ClassificationGraph>,
}

impl ClassifyQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hierarchy computed by the last run
    pub fn graph(&self) -> Option<&ClassificationGraph> {
        self.graph.as_ref()
    }
}

impl fmt::Display for ClassifyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(classify)")
    }
}

impl Query for ClassifyQuery {
    fn preprocess(&mut self, _kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        Ok(None)
    }

    fn solve(&mut self, kb: &KnowledgeBase) -> Result<Solution, FuzzyDlError> {
        if !kb.is_consistent()? {
            self.graph = None;
            return Ok(Solution::inconsistent());
        }
        let graph = ClassificationGraph::compute(kb)?;
        let value = graph.nodes().len() as f64;
        self.graph = Some(graph);
        Ok(Solution::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axiom::Axiom;
    use crate::config::{ReasonerConfig, Semantics};

    #[test]
    fn test_goedel_subsumption_degree() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::gci(Concept::atomic("A"), Concept::atomic("B"), 0.4)).unwrap();
        let (a, b) = (Concept::atomic("A"), Concept::atomic("B"));
        let min = MinSubsumesQuery::new(a.clone(), b.clone(), LogicFamily::Goedel).solve(&kb).unwrap();
        assert!((min.value() - 0.4).abs() < 1e-6);
        let max = MaxSubsumesQuery::new(a, b, LogicFamily::Goedel).solve(&kb).unwrap();
        assert!((max.value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lukasiewicz_subsumption_through_chain() {
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
        kb.add_axiom(Axiom::gci(Concept::atomic("A"), Concept::atomic("B"), 0.9)).unwrap();
        kb.add_axiom(Axiom::gci(Concept::atomic("B"), Concept::atomic("C"), 0.8)).unwrap();
        let (a, c) = (Concept::atomic("A"), Concept::atomic("C"));
        let min = MinSubsumesQuery::new(a, c, LogicFamily::Lukasiewicz).solve(&kb).unwrap();
        assert!((min.value() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_subsumption_ignores_abox() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("A"), 1.0).unwrap();
        kb.add_assertion("a", Concept::atomic("B"), 1.0).unwrap();
        let mut query = MinSubsumesQuery::new(Concept::atomic("A"), Concept::atomic("B"), LogicFamily::Goedel);
        assert_eq!(query.solve(&kb).unwrap().value(), 0.0);
    }

    #[test]
    fn test_subsumption_on_inconsistent_abox() {
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
        kb.add_assertion("a", Concept::atomic("C"), 0.9).unwrap();
        kb.add_assertion("a", Concept::not(Concept::atomic("C")), 0.9).unwrap();
        kb.solve_kb().unwrap();
        let (a, b) = (Concept::atomic("A"), Concept::atomic("B"));
        let min = MinSubsumesQuery::new(a.clone(), b.clone(), LogicFamily::Lukasiewicz).solve(&kb).unwrap();
        let max = MaxSubsumesQuery::new(a, b, LogicFamily::Lukasiewicz).solve(&kb).unwrap();
        assert_eq!(min.to_string(), "Inconsistent KB");
        assert_eq!(max.to_string(), "Inconsistent KB");
    }
}
