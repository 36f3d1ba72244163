//! ファジィ記述論理推論エンジン
//!
//! このクレートは以下を提供します:
//! - 概念代数 (Zadeh / Łukasiewicz / Gödel / Kleene-Dienes 各論理族)
//! - 知識ベースの完備化とブロッキング
//! - MILP による各種推論クエリ (インスタンス、包摂、分類、非ファジィ化)

pub mod axiom;
pub mod concept;
pub mod config;
pub mod document;
pub mod knowledge_base;
pub mod membership;
pub mod query;

pub use axiom::Axiom;
pub use concept::{
    AggregationOperator, ApproximationKind, Concept, ConceptFactory, ConceptKind, LogicFamily,
    ThresholdKind, Weight,
};
pub use config::{BlockingType, DynamicBlocking, ReasonerConfig, Semantics};
pub use document::{Document, QuerySpec};
pub use knowledge_base::classification::ClassificationGraph;
pub use knowledge_base::{ConcreteFeature, FeatureKind, Individual, KnowledgeBase};
pub use membership::{FuzzyNumber, FuzzyQuantifier, MembershipFunction, Modifier, ModifierKind};
pub use query::Query;

// Re-export the optimisation kernel
pub use fuzzowl_core::{Degree, MilpError, Solution};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuzzyDlError {
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid concept: {0}")]
    InvalidConcept(String),

    #[error("Concrete concept misuse: {0}")]
    ConcreteMisuse(String),

    #[error("Role kind conflict: {0}")]
    RoleKindConflict(String),

    #[error("Undefined {kind}: {name}")]
    Undefined { kind: &'static str, name: String },

    #[error("Expansion limit reached: more than {0} created individuals")]
    ExpansionLimit(usize),

    #[error("Solver time limit reached; the answer is unknown")]
    SolverTimeout,

    #[error("Solver error: {0}")]
    SolverError(#[source] MilpError),

    #[error("Loader error: {0}")]
    LoaderError(String),
}

impl From<MilpError> for FuzzyDlError {
    fn from(error: MilpError) -> Self {
        match error {
            MilpError::TimeLimit => FuzzyDlError::SolverTimeout,
            other => FuzzyDlError::SolverError(other),
        }
    }
}
