//! Reasoning queries
//!
//! A query is compiled into assertions and an objective on a working copy of
//! the knowledge base, which is then optimised. Infimum queries assert the
//! complement of what is asked and minimise; supremum queries assert the
//! concept itself and maximise.

mod defuzzify;
mod instance;
mod satisfiability;
mod subsumption;

pub use defuzzify::{BnpQuery, LomDefuzzifyQuery, MomDefuzzifyQuery, SomDefuzzifyQuery};
pub use instance::{AllInstancesQuery, MaxInstanceQuery, MaxRelatedQuery, MinInstanceQuery, MinRelatedQuery};
pub use satisfiability::{KbSatisfiableQuery, MaxSatisfiableQuery, MinSatisfiableQuery};
pub use subsumption::{ClassifyQuery, MaxSubsumesQuery, MinSubsumesQuery};

use crate::concept::Concept;
use crate::knowledge_base::KnowledgeBase;
use crate::FuzzyDlError;
use fuzzowl_core::{Degree, Expression, Solution};
use std::fmt;
use tracing::info;

/// A reasoning task answered by optimisation
pub trait Query: fmt::Display {
    /// Knowledge base the query is compiled into
    fn working_copy(&self, kb: &KnowledgeBase) -> KnowledgeBase {
        kb.clone()
    }

    /// Add the query's assertions and return the objective to minimise
    fn preprocess(&mut self, kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError>;

    /// Turn the optimum of the objective into the answer
    fn interpret(&self, solution: Solution) -> Solution {
        solution
    }

    fn solve(&mut self, kb: &KnowledgeBase) -> Result<Solution, FuzzyDlError> {
        info!("query {}", self);
        let mut local = self.working_copy(kb);
        let objective = self.preprocess(&mut local)?;
        let solution = self
            .interpret(local.optimize(objective)?)
            .rounded(kb.config().precision);
        info!("{} = {}", self, solution);
        Ok(solution)
    }
}

/// Direction of a degree query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    /// Infimum over all models
    Min,
    /// Supremum over all models
    Max,
}

impl Bound {
    /// Assert the query concept on `individual` and return the objective
    pub(crate) fn frame(
        self,
        kb: &mut KnowledgeBase,
        individual: &str,
        concept: &Concept,
    ) -> Result<Option<Expression>, FuzzyDlError> {
        let concept = &kb.factory().simplify(concept);
        kb.note_concept(concept);
        let q = kb.model_mut().new_degree_variable();
        match self {
            Bound::Min => {
                // every model has C ≥ q: ¬C ≥ 1 − q
                let upper = Expression::new(1.0) - q;
                kb.assert_degree(individual, &concept.negate(), Degree::Expression(upper))?;
                Ok(Some(Expression::from(q)))
            }
            Bound::Max => {
                kb.assert_degree(individual, concept, Degree::Variable(q))?;
                Ok(Some(-Expression::from(q)))
            }
        }
    }

    pub(crate) fn interpret(self, solution: Solution) -> Solution {
        match self {
            Bound::Min => solution,
            Bound::Max => solution.map_value(|v| -v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, Semantics};

    #[test]
    fn test_inconsistent_kb_answers_every_query() {
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
        kb.add_assertion("a", Concept::atomic("C"), 0.9).unwrap();
        kb.add_assertion("a", Concept::not(Concept::atomic("C")), 0.9).unwrap();
        let mut query = MinInstanceQuery::new("a", Concept::atomic("D"));
        let solution = query.solve(&kb).unwrap();
        assert!(!solution.is_consistent_kb());
        assert_eq!(solution.to_string(), "Inconsistent KB");
    }

    #[test]
    fn test_query_leaves_kb_untouched() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", Concept::atomic("C"), 0.6).unwrap();
        let constraints = kb.model().num_constraints();
        MaxInstanceQuery::new("a", Concept::atomic("C")).solve(&kb).unwrap();
        assert_eq!(kb.model().num_constraints(), constraints);
        assert_eq!(kb.individuals().len(), 1);
    }
}
