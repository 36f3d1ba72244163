//! Reasoner configuration

use crate::concept::LogicFamily;
use fuzzowl_core::SolverConfig;
use serde::{Deserialize, Serialize};

/// Global fuzzy semantics of a knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Semantics {
    /// Crisp DL: membership and relation degrees are 0 or 1
    Classical,
    /// Minimum t-norm, maximum t-conorm
    #[default]
    Zadeh,
    /// Łukasiewicz t-norm and t-conorm
    Lukasiewicz,
}

impl Semantics {
    /// Family used by quantifiers and connectives written without an explicit family
    pub fn family(&self) -> LogicFamily {
        match self {
            Semantics::Classical => LogicFamily::Classical,
            Semantics::Zadeh => LogicFamily::Zadeh,
            Semantics::Lukasiewicz => LogicFamily::Lukasiewicz,
        }
    }

    /// Implication used for GCIs and subsumption queries by default
    pub fn default_implication(&self) -> LogicFamily {
        match self {
            Semantics::Classical => LogicFamily::KleeneDienes,
            Semantics::Zadeh => LogicFamily::Goedel,
            Semantics::Lukasiewicz => LogicFamily::Lukasiewicz,
        }
    }
}

/// Blocking discipline for created individuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BlockingType {
    /// Never block; runaway expansion stops at `max_created_individuals`
    NoBlocking,
    /// Labels of the node are a subset of an ancestor's
    #[default]
    Subset,
    /// Labels of the node equal an ancestor's
    Set,
    /// Node and its parent match an ancestor and its parent
    Pairwise,
}

/// When blocking decisions are re-evaluated as labels grow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DynamicBlocking {
    /// Switched on by syntactic inspection of asserted and queried concepts
    #[default]
    Auto,
    Always,
    Never,
}

/// Reasoner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Global semantics
    pub semantics: Semantics,

    /// Construction-time simplifications such as `∃r.⊥ → ⊥`
    pub optimizations: bool,

    /// Trace every generated constraint
    pub debug: bool,

    /// Blocking discipline
    pub blocking: BlockingType,

    /// Dynamic re-evaluation of blocking
    pub dynamic_blocking: DynamicBlocking,

    /// Gap used to encode strict inequalities
    pub epsilon: f64,

    /// Created individuals allowed before expansion is aborted
    pub max_created_individuals: usize,

    /// Decimal digits kept in reported values
    pub precision: u32,

    /// Solver settings
    pub solver: SolverConfig,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            semantics: Semantics::default(),
            optimizations: true,
            debug: false,
            blocking: BlockingType::default(),
            dynamic_blocking: DynamicBlocking::default(),
            epsilon: 1e-4,
            max_created_individuals: 1000,
            precision: 6,
            solver: SolverConfig::default(),
        }
    }
}

impl ReasonerConfig {
    pub fn with_semantics(semantics: Semantics) -> Self {
        Self {
            semantics,
            ..Default::default()
        }
    }

    /// Load from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, crate::FuzzyDlError> {
        serde_json::from_str(json).map_err(|e| crate::FuzzyDlError::LoaderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReasonerConfig::from_json(r#"{"semantics": "Lukasiewicz", "solver": {"max_nodes": 10}}"#).unwrap();
        assert_eq!(config.semantics, Semantics::Lukasiewicz);
        assert_eq!(config.solver.max_nodes, 10);
        assert_eq!(config.precision, 6);
        assert!(config.optimizations);
    }

    #[test]
    fn test_default_implications() {
        assert_eq!(Semantics::Zadeh.default_implication(), LogicFamily::Goedel);
        assert_eq!(Semantics::Classical.default_implication(), LogicFamily::KleeneDienes);
        assert_eq!(Semantics::Lukasiewicz.default_implication(), LogicFamily::Lukasiewicz);
    }
}
