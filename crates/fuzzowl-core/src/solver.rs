//! Solver contract consumed by the model builder

use crate::linear::{Expression, Inequation};
use crate::milp::VariableInfo;
use crate::MilpError;
use serde::{Deserialize, Serialize};

/// Borrowed view of a model handed to a solver
#[derive(Debug, Clone, Copy)]
pub struct MilpProblem<'a> {
    pub variables: &'a [VariableInfo],
    pub constraints: &'a [Inequation],
    /// Minimised when present; `None` asks for feasibility only
    pub objective: Option<&'a Expression>,
}

/// Result of an optimisation call
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// Optimal objective and one value per pool variable
    Optimal { objective: f64, values: Vec<f64> },
    Infeasible,
    Unbounded,
    /// The node or wall-clock limit was hit: the answer is unknown
    TimeLimit,
}

/// `optimize(objective, constraints, variable-types)`
pub trait MilpSolver {
    fn optimize(&self, problem: &MilpProblem<'_>) -> Result<SolverOutcome, MilpError>;
}

/// Numeric settings of the built-in solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Pivot and reduced-cost tolerance
    pub tolerance: f64,

    /// Distance from an integer under which a value counts as integral
    pub integrality_tolerance: f64,

    /// Branch-and-bound node limit
    pub max_nodes: usize,

    /// Wall-clock limit in milliseconds
    pub time_limit_ms: Option<u64>,

    /// Simplex pivots allowed per relaxation
    pub max_pivots: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            integrality_tolerance: 1e-6,
            max_nodes: 200_000,
            time_limit_ms: None,
            max_pivots: 100_000,
        }
    }
}
