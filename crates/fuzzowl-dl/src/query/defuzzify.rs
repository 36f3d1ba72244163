//! Defuzzification of concrete features
//!
//! The maximal degree `d` of `individual : concept` is computed first; the
//! feature is then minimised (smallest of maxima) or maximised (largest of
//! maxima) over the models where the individual keeps degree `d`.

use super::{Bound, Query};
use crate::concept::Concept;
use crate::knowledge_base::KnowledgeBase;
use crate::membership::FuzzyNumber;
use crate::FuzzyDlError;
use fuzzowl_core::{Degree, Expression, Solution};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
struct Defuzzify {
    individual: String,
    concept: Concept,
    feature: String,
}

impl Defuzzify {
    /// Highest membership degree, unrounded
    fn max_degree(&self, kb: &KnowledgeBase) -> Result<Option<f64>, FuzzyDlError> {
        let mut local = kb.clone();
        let name = local.require_individual(&self.individual)?;
        let objective = Bound::Max.frame(&mut local, &name, &self.concept)?;
        let solution = Bound::Max.interpret(local.optimize(objective)?);
        Ok(solution.is_consistent_kb().then(|| solution.value()))
    }

    /// Extreme feature value among the models reaching `degree`
    fn extreme(&self, kb: &KnowledgeBase, degree: f64, bound: Bound) -> Result<Solution, FuzzyDlError> {
        let mut local = kb.clone();
        let name = local.require_individual(&self.individual)?;
        let tolerance = kb.config().solver.tolerance;
        let degree = (degree - tolerance).max(0.0);
        local.assert_degree(&name, &self.concept, Degree::Numeric(degree))?;
        let x = Expression::from(local.feature_variable(&name, &self.feature)?);
        let objective = match bound {
            Bound::Min => x,
            Bound::Max => -x,
        };
        Ok(bound.interpret(local.optimize(Some(objective))?))
    }

    fn solve(&self, kb: &KnowledgeBase, bounds: &[Bound]) -> Result<Solution, FuzzyDlError> {
        kb.require_individual(&self.individual)?;
        let degree = match self.max_degree(kb)? {
            Some(degree) => degree,
            None => return Ok(Solution::inconsistent()),
        };
        debug!("{} reaches {} with degree {}", self.individual, self.concept, degree);
        let mut total = 0.0;
        for bound in bounds {
            let solution = self.extreme(kb, degree, *bound)?;
            if !solution.is_consistent_kb() {
                return Ok(solution);
            }
            total += solution.value();
        }
        Ok(Solution::new(total / bounds.len() as f64).rounded(kb.config().precision))
    }

    fn describe(&self, keyword: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {} {})", keyword, self.concept, self.individual, self.feature)
    }
}

macro_rules! defuzzify_query {
    ($(#[$doc:meta])* $name:ident, $keyword:literal, [$($bound:expr),+]) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(Defuzzify);

        impl $name {
            pub fn new(individual: impl Into<String>, concept: Concept, feature: impl Into<String>) -> Self {
                Self(Defuzzify {
                    individual: individual.into(),
                    concept,
                    feature: feature.into(),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.describe($keyword, f)
            }
        }

        impl Query for $name {
            fn preprocess(&mut self, _kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
                Ok(None)
            }

            fn solve(&mut self, kb: &KnowledgeBase) -> Result<Solution, FuzzyDlError> {
                self.0.solve(kb, &[$($bound),+])
            }
        }
    };
}

defuzzify_query!(
    /// Largest feature value among the maxima
    LomDefuzzifyQuery,
    "defuzzify-lom?",
    [Bound::Max]
);

defuzzify_query!(
    /// Smallest feature value among the maxima
    SomDefuzzifyQuery,
    "defuzzify-som?",
    [Bound::Min]
);

defuzzify_query!(
    /// Average of the smallest and the largest of the maxima
    MomDefuzzifyQuery,
    "defuzzify-mom?",
    [Bound::Min, Bound::Max]
);

/// Best non-fuzzy performance of a triangular fuzzy number, `(a + b + c) / 3`
#[derive(Debug, Clone)]
pub struct BnpQuery {
    number: FuzzyNumber,
}

impl BnpQuery {
    pub fn new(number: FuzzyNumber) -> Self {
        Self { number }
    }
}

impl fmt::Display for BnpQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(bnp? {})", self.number)
    }
}

impl Query for BnpQuery {
    fn preprocess(&mut self, _kb: &mut KnowledgeBase) -> Result<Option<Expression>, FuzzyDlError> {
        Ok(None)
    }

    fn solve(&mut self, kb: &KnowledgeBase) -> Result<Solution, FuzzyDlError> {
        Ok(Solution::new(self.number.bnp()).rounded(kb.config().precision))
    }
}
