//! # fuzzowl-core
//!
//! ファジィ記述論理推論のための線形代数カーネルと MILP モデル
//! - `Variable` / `Term` / `Expression` / `Inequation`
//! - ファジィ真理度 `Degree`
//! - 変数プールをメモ化する `MilpModel`
//! - ソルバ契約 `MilpSolver` と組み込みの単体法 + 分枝限定法

pub mod degree;
pub mod linear;
pub mod milp;
pub mod simplex;
pub mod solution;
pub mod solver;

pub use degree::Degree;
pub use linear::{Expression, InequalityType, Inequation, Term, Variable};
pub use milp::{MilpModel, VariableInfo, VariableKind};
pub use simplex::SimplexSolver;
pub use solution::Solution;
pub use solver::{MilpProblem, MilpSolver, SolverConfig, SolverOutcome};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MilpError {
    #[error("Solver error: {0}")]
    SolverError(String),

    #[error("Solver time limit reached")]
    TimeLimit,

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}
