//! ファジィ概念代数

use crate::membership::{FuzzyNumber, FuzzyQuantifier, MembershipFunction, Modifier};
use crate::FuzzyDlError;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Neg;
use std::sync::Arc;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Fuzzy logic family of a connective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicFamily {
    /// Crisp connectives
    Classical,
    /// min / max, with the crisp inclusion `C ≤ D` as implication
    Zadeh,
    /// Łukasiewicz t-norm, t-conorm and residuum
    Lukasiewicz,
    /// min / max with the Gödel residuum
    Goedel,
    /// Kleene-Dienes implication `max(1 − C, D)` (implication only)
    KleeneDienes,
}

impl LogicFamily {
    fn prefix(&self) -> &'static str {
        match self {
            LogicFamily::Classical => "c-",
            LogicFamily::Zadeh => "",
            LogicFamily::Lukasiewicz => "l-",
            LogicFamily::Goedel => "g-",
            LogicFamily::KleeneDienes => "kd-",
        }
    }

    fn implies_keyword(&self) -> &'static str {
        match self {
            LogicFamily::Classical => "c-implies",
            LogicFamily::Zadeh => "z-implies",
            LogicFamily::Lukasiewicz => "l-implies",
            LogicFamily::Goedel => "g-implies",
            LogicFamily::KleeneDienes => "kd-implies",
        }
    }

    /// Whether conjunction and disjunction exist in this family
    pub fn has_connectives(&self) -> bool {
        !matches!(self, LogicFamily::KleeneDienes)
    }

    /// min-based families share the Zadeh conjunction encoding
    pub fn is_min_based(&self) -> bool {
        matches!(
            self,
            LogicFamily::Classical | LogicFamily::Zadeh | LogicFamily::Goedel
        )
    }
}

/// Comparison of a fuzzy threshold concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdKind {
    /// `[≥ w] C`
    AtLeast,
    /// `[≤ w] C`
    AtMost,
    /// `[> w] C`
    GreaterThan,
    /// `[< w] C`
    LessThan,
}

impl ThresholdKind {
    /// Complementary comparison: `¬[≥ w] = [< w]`, `¬[≤ w] = [> w]`
    pub fn negate(self) -> Self {
        match self {
            ThresholdKind::AtLeast => ThresholdKind::LessThan,
            ThresholdKind::LessThan => ThresholdKind::AtLeast,
            ThresholdKind::AtMost => ThresholdKind::GreaterThan,
            ThresholdKind::GreaterThan => ThresholdKind::AtMost,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ThresholdKind::AtLeast => ">=",
            ThresholdKind::AtMost => "<=",
            ThresholdKind::GreaterThan => ">",
            ThresholdKind::LessThan => "<",
        }
    }
}

/// Threshold weight: a constant or a named free variable of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Weight {
    Value(f64),
    Variable(String),
}

impl Hash for Weight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Weight::Value(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            Weight::Variable(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Value(v) => write!(f, "{}", v),
            Weight::Variable(name) => write!(f, "{}", name),
        }
    }
}

/// Weighted aggregation operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationOperator {
    /// `Σ wᵢ·Cᵢ`, requires `Σw ≤ 1`
    WeightedSum,
    /// Weighted sum, but 0 as soon as one operand is 0; requires `Σw ≤ 1`
    WeightedSumZero,
    /// `max min(wᵢ, Cᵢ)`, requires `max w = 1`
    WeightedMax,
    /// `min max(1 − wᵢ, Cᵢ)`, requires `max w = 1`
    WeightedMin,
    /// Ordered weighted average over operands sorted decreasingly, requires `Σw = 1`
    Owa,
    /// Choquet integral, `wⱼ` measuring the `j` largest operands; requires `max w = 1`
    Choquet,
    /// Sugeno integral; requires `max w = 1`
    Sugeno,
    /// `max wⱼ·s₍ⱼ₎`; requires `max w = 1`
    QuasiSugeno,
}

impl AggregationOperator {
    fn keyword(&self) -> &'static str {
        match self {
            AggregationOperator::WeightedSum => "w-sum",
            AggregationOperator::WeightedSumZero => "w-sum-zero",
            AggregationOperator::WeightedMax => "w-max",
            AggregationOperator::WeightedMin => "w-min",
            AggregationOperator::Owa => "owa",
            AggregationOperator::Choquet => "choquet",
            AggregationOperator::Sugeno => "sugeno",
            AggregationOperator::QuasiSugeno => "q-sugeno",
        }
    }

    /// Operators whose operands are sorted before weighting
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            AggregationOperator::Owa
                | AggregationOperator::Choquet
                | AggregationOperator::Sugeno
                | AggregationOperator::QuasiSugeno
        )
    }

    /// Validate a weight vector against the operator's normalisation rule
    pub fn validate_weights(&self, weights: &[f64]) -> Result<(), FuzzyDlError> {
        if weights.is_empty() {
            return Err(FuzzyDlError::InvalidWeights(format!(
                "{} needs at least one weight",
                self.keyword()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !(0.0..=1.0).contains(*w)) {
            return Err(FuzzyDlError::InvalidWeights(format!(
                "{}: weight {} outside [0, 1]",
                self.keyword(),
                w
            )));
        }
        let sum: f64 = weights.iter().sum();
        let max = weights.iter().cloned().fold(0.0, f64::max);
        match self {
            AggregationOperator::WeightedSum | AggregationOperator::WeightedSumZero => {
                if sum > 1.0 + WEIGHT_TOLERANCE {
                    return Err(FuzzyDlError::InvalidWeights(format!(
                        "{}: weights sum to {} > 1",
                        self.keyword(),
                        sum
                    )));
                }
            }
            AggregationOperator::Owa => {
                if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                    return Err(FuzzyDlError::InvalidWeights(format!(
                        "owa: weights sum to {} instead of 1",
                        sum
                    )));
                }
            }
            _ => {
                if (max - 1.0).abs() > WEIGHT_TOLERANCE {
                    return Err(FuzzyDlError::InvalidWeights(format!(
                        "{}: largest weight is {} instead of 1",
                        self.keyword(),
                        max
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Rough-set approximation over a similarity relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApproximationKind {
    /// `∀s.C`
    Lower,
    /// `∃s.C`
    Upper,
    /// `∀s.∀s.C`
    TightLower,
    /// `∀s.∃s.C`
    TightUpper,
    /// `∃s.∀s.C`
    LooseLower,
    /// `∃s.∃s.C`
    LooseUpper,
}

impl ApproximationKind {
    /// Kind of the approximation of `¬C` equivalent to the negation
    pub fn dual(self) -> Self {
        match self {
            ApproximationKind::Lower => ApproximationKind::Upper,
            ApproximationKind::Upper => ApproximationKind::Lower,
            ApproximationKind::TightLower => ApproximationKind::LooseUpper,
            ApproximationKind::LooseUpper => ApproximationKind::TightLower,
            ApproximationKind::TightUpper => ApproximationKind::LooseLower,
            ApproximationKind::LooseLower => ApproximationKind::TightUpper,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            ApproximationKind::Lower => "la",
            ApproximationKind::Upper => "ua",
            ApproximationKind::TightLower => "tla",
            ApproximationKind::TightUpper => "tua",
            ApproximationKind::LooseLower => "lla",
            ApproximationKind::LooseUpper => "lua",
        }
    }
}

/// Shape of a concept node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConceptKind {
    /// ⊤
    Top,

    /// ⊥
    Bottom,

    /// Named concept
    Atomic(String),

    /// Conjunction C1 ⊓ ... ⊓ Cn
    And {
        family: LogicFamily,
        operands: Vec<Concept>,
    },

    /// Disjunction C1 ⊔ ... ⊔ Cn
    Or {
        family: LogicFamily,
        operands: Vec<Concept>,
    },

    /// Negation of a concept without a syntactic dual
    Not(Concept),

    /// Implication C → D
    Implies {
        family: LogicFamily,
        antecedent: Concept,
        consequent: Concept,
    },

    /// Existential restriction ∃r.C
    Some { role: String, filler: Concept },

    /// Universal restriction ∀r.C
    All { role: String, filler: Concept },

    /// ∃r.{i}
    HasValue { role: String, individual: String },

    /// ∃r.Self
    SelfRestriction { role: String },

    /// Crisp threshold on the degree of C
    Threshold {
        kind: ThresholdKind,
        weight: Weight,
        filler: Concept,
    },

    /// w·C
    Weighted { weight: f64, filler: Concept },

    /// Weighted aggregation of several concepts
    Aggregation {
        operator: AggregationOperator,
        weights: Vec<f64>,
        operands: Vec<Concept>,
    },

    /// OWA with weights derived from a fuzzy quantifier
    Qowa {
        quantifier: FuzzyQuantifier,
        operands: Vec<Concept>,
    },

    /// Modified concept, e.g. `very C`
    Modified { modifier: Modifier, filler: Concept },

    /// Rough-set approximation over a similarity role
    Approximation {
        kind: ApproximationKind,
        role: String,
        filler: Concept,
    },

    /// Membership function applied to the cardinality of the r-fillers
    /// among `individuals` that are C
    SigmaCount {
        role: String,
        filler: Concept,
        individuals: Vec<String>,
        function: MembershipFunction,
    },

    /// Named concrete-domain concept
    Concrete {
        name: String,
        function: MembershipFunction,
    },

    /// Triangular fuzzy number used as a concrete concept
    FuzzyNumber(FuzzyNumber),
}

impl Hash for ConceptKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConceptKind::Top | ConceptKind::Bottom => {}
            ConceptKind::Atomic(name) => name.hash(state),
            ConceptKind::And { family, operands } | ConceptKind::Or { family, operands } => {
                family.hash(state);
                operands.hash(state);
            }
            ConceptKind::Not(c) => c.hash(state),
            ConceptKind::Implies {
                family,
                antecedent,
                consequent,
            } => {
                family.hash(state);
                antecedent.hash(state);
                consequent.hash(state);
            }
            ConceptKind::Some { role, filler } | ConceptKind::All { role, filler } => {
                role.hash(state);
                filler.hash(state);
            }
            ConceptKind::HasValue { role, individual } => {
                role.hash(state);
                individual.hash(state);
            }
            ConceptKind::SelfRestriction { role } => role.hash(state),
            ConceptKind::Threshold {
                kind,
                weight,
                filler,
            } => {
                kind.hash(state);
                weight.hash(state);
                filler.hash(state);
            }
            ConceptKind::Weighted { weight, filler } => {
                weight.to_bits().hash(state);
                filler.hash(state);
            }
            ConceptKind::Aggregation {
                operator,
                weights,
                operands,
            } => {
                operator.hash(state);
                for w in weights {
                    w.to_bits().hash(state);
                }
                operands.hash(state);
            }
            ConceptKind::Qowa {
                quantifier,
                operands,
            } => {
                quantifier.hash(state);
                operands.hash(state);
            }
            ConceptKind::Modified { modifier, filler } => {
                modifier.hash(state);
                filler.hash(state);
            }
            ConceptKind::Approximation { kind, role, filler } => {
                kind.hash(state);
                role.hash(state);
                filler.hash(state);
            }
            ConceptKind::SigmaCount {
                role,
                filler,
                individuals,
                function,
            } => {
                role.hash(state);
                filler.hash(state);
                individuals.hash(state);
                function.hash(state);
            }
            ConceptKind::Concrete { name, function } => {
                name.hash(state);
                function.hash(state);
            }
            ConceptKind::FuzzyNumber(n) => n.hash(state),
        }
    }
}

#[derive(Debug)]
struct ConceptNode {
    kind: ConceptKind,
    name: String,
    hash: u64,
}

/// Immutable, shared concept node.
///
/// The display name is rendered once at construction. Equality and hashing
/// are structural over the variant tree, with the hash memoised, so two
/// independently built but identical concepts are the same key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "ConceptKind", into = "ConceptKind")]
pub struct Concept(Arc<ConceptNode>);

impl Concept {
    /// Build a node without validation
    fn build(kind: ConceptKind) -> Concept {
        let name = render(&kind);
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        let hash = hasher.finish();
        Concept(Arc::new(ConceptNode { kind, name, hash }))
    }

    pub fn kind(&self) -> &ConceptKind {
        &self.0.kind
    }

    /// Memoised display name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn top() -> Concept {
        Concept::build(ConceptKind::Top)
    }

    pub fn bottom() -> Concept {
        Concept::build(ConceptKind::Bottom)
    }

    pub fn atomic(name: impl Into<String>) -> Concept {
        Concept::build(ConceptKind::Atomic(name.into()))
    }

    pub fn and(family: LogicFamily, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        check_connective(family, &operands, "and")?;
        Ok(match operands.len() {
            0 => Concept::top(),
            1 => operands.into_iter().next().unwrap_or_else(Concept::top),
            _ => Concept::build(ConceptKind::And { family, operands }),
        })
    }

    pub fn or(family: LogicFamily, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        check_connective(family, &operands, "or")?;
        Ok(match operands.len() {
            0 => Concept::bottom(),
            1 => operands.into_iter().next().unwrap_or_else(Concept::bottom),
            _ => Concept::build(ConceptKind::Or { family, operands }),
        })
    }

    /// Negation wrapper, normalising `¬¬C`, `¬⊤` and `¬⊥`
    pub fn not(concept: Concept) -> Concept {
        match concept.kind() {
            ConceptKind::Not(inner) => inner.clone(),
            ConceptKind::Top => Concept::bottom(),
            ConceptKind::Bottom => Concept::top(),
            _ => Concept::build(ConceptKind::Not(concept)),
        }
    }

    pub fn implies(
        family: LogicFamily,
        antecedent: Concept,
        consequent: Concept,
    ) -> Result<Concept, FuzzyDlError> {
        require_abstract(&antecedent, "implication")?;
        require_abstract(&consequent, "implication")?;
        Ok(Concept::build(ConceptKind::Implies {
            family,
            antecedent,
            consequent,
        }))
    }

    pub fn some(role: impl Into<String>, filler: Concept) -> Concept {
        Concept::build(ConceptKind::Some {
            role: role.into(),
            filler,
        })
    }

    pub fn all(role: impl Into<String>, filler: Concept) -> Concept {
        Concept::build(ConceptKind::All {
            role: role.into(),
            filler,
        })
    }

    pub fn has_value(role: impl Into<String>, individual: impl Into<String>) -> Concept {
        Concept::build(ConceptKind::HasValue {
            role: role.into(),
            individual: individual.into(),
        })
    }

    pub fn self_restriction(role: impl Into<String>) -> Concept {
        Concept::build(ConceptKind::SelfRestriction { role: role.into() })
    }

    pub fn threshold(kind: ThresholdKind, weight: Weight, filler: Concept) -> Result<Concept, FuzzyDlError> {
        if let Weight::Value(w) = weight {
            if !(0.0..=1.0).contains(&w) {
                return Err(FuzzyDlError::InvalidWeights(format!(
                    "threshold {} outside [0, 1]",
                    w
                )));
            }
        }
        require_abstract(&filler, "threshold")?;
        Ok(Concept::build(ConceptKind::Threshold {
            kind,
            weight,
            filler,
        }))
    }

    pub fn weighted(weight: f64, filler: Concept) -> Result<Concept, FuzzyDlError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(FuzzyDlError::InvalidWeights(format!(
                "weight {} outside [0, 1]",
                weight
            )));
        }
        require_abstract(&filler, "weighted concept")?;
        Ok(Concept::build(ConceptKind::Weighted { weight, filler }))
    }

    pub fn aggregation(
        operator: AggregationOperator,
        weights: Vec<f64>,
        operands: Vec<Concept>,
    ) -> Result<Concept, FuzzyDlError> {
        if weights.len() != operands.len() {
            return Err(FuzzyDlError::InvalidWeights(format!(
                "{}: {} weights for {} operands",
                operator.keyword(),
                weights.len(),
                operands.len()
            )));
        }
        operator.validate_weights(&weights)?;
        for operand in &operands {
            require_abstract(operand, operator.keyword())?;
        }
        Ok(Concept::build(ConceptKind::Aggregation {
            operator,
            weights,
            operands,
        }))
    }

    pub fn weighted_sum(weights: Vec<f64>, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        Concept::aggregation(AggregationOperator::WeightedSum, weights, operands)
    }

    pub fn owa(weights: Vec<f64>, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        Concept::aggregation(AggregationOperator::Owa, weights, operands)
    }

    pub fn qowa(quantifier: FuzzyQuantifier, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        if operands.is_empty() {
            return Err(FuzzyDlError::InvalidConcept("q-owa without operands".to_string()));
        }
        for operand in &operands {
            require_abstract(operand, "q-owa")?;
        }
        AggregationOperator::Owa.validate_weights(&quantifier.weights(operands.len()))?;
        Ok(Concept::build(ConceptKind::Qowa {
            quantifier,
            operands,
        }))
    }

    pub fn modified(modifier: Modifier, filler: Concept) -> Result<Concept, FuzzyDlError> {
        modifier.validate()?;
        require_abstract(&filler, "modifier")?;
        Ok(Concept::build(ConceptKind::Modified { modifier, filler }))
    }

    pub fn approximation(
        kind: ApproximationKind,
        role: impl Into<String>,
        filler: Concept,
    ) -> Result<Concept, FuzzyDlError> {
        require_abstract(&filler, "approximation")?;
        Ok(Concept::build(ConceptKind::Approximation {
            kind,
            role: role.into(),
            filler,
        }))
    }

    pub fn sigma_count(
        role: impl Into<String>,
        filler: Concept,
        individuals: Vec<String>,
        function: MembershipFunction,
    ) -> Result<Concept, FuzzyDlError> {
        function.validate()?;
        require_abstract(&filler, "sigma-count")?;
        Ok(Concept::build(ConceptKind::SigmaCount {
            role: role.into(),
            filler,
            individuals,
            function,
        }))
    }

    pub fn concrete(name: impl Into<String>, function: MembershipFunction) -> Result<Concept, FuzzyDlError> {
        function.validate()?;
        Ok(Concept::build(ConceptKind::Concrete {
            name: name.into(),
            function,
        }))
    }

    pub fn fuzzy_number(number: FuzzyNumber) -> Result<Concept, FuzzyDlError> {
        let number = FuzzyNumber::new(number.a, number.b, number.c)?;
        Ok(Concept::build(ConceptKind::FuzzyNumber(number)))
    }

    pub fn is_top(&self) -> bool {
        matches!(self.kind(), ConceptKind::Top)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self.kind(), ConceptKind::Bottom)
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind(), ConceptKind::Atomic(_))
    }

    /// Concrete-domain concepts (and their negations) only appear under a
    /// concrete feature
    pub fn is_concrete(&self) -> bool {
        match self.kind() {
            ConceptKind::Concrete { .. } | ConceptKind::FuzzyNumber(_) => true,
            ConceptKind::Not(inner) => inner.is_concrete(),
            _ => false,
        }
    }

    /// Negation, pushed through every construct with a syntactic dual
    pub fn negate(&self) -> Concept {
        match self.kind() {
            ConceptKind::Top => Concept::bottom(),
            ConceptKind::Bottom => Concept::top(),
            ConceptKind::Not(inner) => inner.clone(),
            ConceptKind::And { family, operands } => Concept::build(ConceptKind::Or {
                family: *family,
                operands: operands.iter().map(Concept::negate).collect(),
            }),
            ConceptKind::Or { family, operands } => Concept::build(ConceptKind::And {
                family: *family,
                operands: operands.iter().map(Concept::negate).collect(),
            }),
            ConceptKind::Implies {
                family,
                antecedent,
                consequent,
            } => match family {
                LogicFamily::KleeneDienes | LogicFamily::Classical | LogicFamily::Lukasiewicz => {
                    let conjunction = match family {
                        LogicFamily::Lukasiewicz => LogicFamily::Lukasiewicz,
                        LogicFamily::Classical => LogicFamily::Classical,
                        _ => LogicFamily::Zadeh,
                    };
                    Concept::build(ConceptKind::And {
                        family: conjunction,
                        operands: vec![antecedent.clone(), consequent.negate()],
                    })
                }
                LogicFamily::Zadeh | LogicFamily::Goedel => Concept::not(self.clone()),
            },
            ConceptKind::Some { role, filler } => Concept::build(ConceptKind::All {
                role: role.clone(),
                filler: filler.negate(),
            }),
            ConceptKind::All { role, filler } => Concept::build(ConceptKind::Some {
                role: role.clone(),
                filler: filler.negate(),
            }),
            ConceptKind::Threshold {
                kind,
                weight,
                filler,
            } => Concept::build(ConceptKind::Threshold {
                kind: kind.negate(),
                weight: weight.clone(),
                filler: filler.clone(),
            }),
            ConceptKind::Approximation { kind, role, filler } => {
                Concept::build(ConceptKind::Approximation {
                    kind: kind.dual(),
                    role: role.clone(),
                    filler: filler.negate(),
                })
            }
            _ => Concept::not(self.clone()),
        }
    }

    /// Direct sub-concepts
    pub fn children(&self) -> Vec<&Concept> {
        match self.kind() {
            ConceptKind::And { operands, .. }
            | ConceptKind::Or { operands, .. }
            | ConceptKind::Aggregation { operands, .. }
            | ConceptKind::Qowa { operands, .. } => operands.iter().collect(),
            ConceptKind::Not(c) => vec![c],
            ConceptKind::Implies {
                antecedent,
                consequent,
                ..
            } => vec![antecedent, consequent],
            ConceptKind::Some { filler, .. }
            | ConceptKind::All { filler, .. }
            | ConceptKind::Threshold { filler, .. }
            | ConceptKind::Weighted { filler, .. }
            | ConceptKind::Modified { filler, .. }
            | ConceptKind::Approximation { filler, .. }
            | ConceptKind::SigmaCount { filler, .. } => vec![filler],
            _ => Vec::new(),
        }
    }

    /// Names of the atomic concepts occurring in the concept
    pub fn atomic_concepts(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_atomic(&mut names);
        names
    }

    fn collect_atomic(&self, names: &mut BTreeSet<String>) {
        if let ConceptKind::Atomic(name) = self.kind() {
            names.insert(name.clone());
        }
        for child in self.children() {
            child.collect_atomic(names);
        }
    }

    /// Roles and features occurring in the concept
    pub fn roles(&self) -> BTreeSet<String> {
        let mut roles = BTreeSet::new();
        self.collect_roles(&mut roles);
        roles
    }

    fn collect_roles(&self, roles: &mut BTreeSet<String>) {
        match self.kind() {
            ConceptKind::Some { role, .. }
            | ConceptKind::All { role, .. }
            | ConceptKind::HasValue { role, .. }
            | ConceptKind::SelfRestriction { role }
            | ConceptKind::Approximation { role, .. }
            | ConceptKind::SigmaCount { role, .. } => {
                roles.insert(role.clone());
            }
            _ => {}
        }
        for child in self.children() {
            child.collect_roles(roles);
        }
    }

    /// Substitute every occurrence of `target` with `replacement`
    pub fn replace(&self, target: &Concept, replacement: &Concept) -> Concept {
        if self == target {
            return replacement.clone();
        }
        self.map_children(|c| c.replace(target, replacement))
    }

    /// Same constructor over rewritten children
    pub(crate) fn map_children(&self, f: impl Fn(&Concept) -> Concept) -> Concept {
        if self.children().is_empty() {
            return self.clone();
        }
        let r = |c: &Concept| f(c);
        let rs = |cs: &[Concept]| cs.iter().map(|c| f(c)).collect::<Vec<_>>();
        match self.kind() {
            ConceptKind::Not(c) => Concept::not(r(c)),
            ConceptKind::And { family, operands } => Concept::build(ConceptKind::And {
                family: *family,
                operands: rs(operands),
            }),
            ConceptKind::Or { family, operands } => Concept::build(ConceptKind::Or {
                family: *family,
                operands: rs(operands),
            }),
            ConceptKind::Implies {
                family,
                antecedent,
                consequent,
            } => Concept::build(ConceptKind::Implies {
                family: *family,
                antecedent: r(antecedent),
                consequent: r(consequent),
            }),
            ConceptKind::Some { role, filler } => Concept::some(role.clone(), r(filler)),
            ConceptKind::All { role, filler } => Concept::all(role.clone(), r(filler)),
            ConceptKind::Threshold {
                kind,
                weight,
                filler,
            } => Concept::build(ConceptKind::Threshold {
                kind: *kind,
                weight: weight.clone(),
                filler: r(filler),
            }),
            ConceptKind::Weighted { weight, filler } => Concept::build(ConceptKind::Weighted {
                weight: *weight,
                filler: r(filler),
            }),
            ConceptKind::Aggregation {
                operator,
                weights,
                operands,
            } => Concept::build(ConceptKind::Aggregation {
                operator: *operator,
                weights: weights.clone(),
                operands: rs(operands),
            }),
            ConceptKind::Qowa {
                quantifier,
                operands,
            } => Concept::build(ConceptKind::Qowa {
                quantifier: quantifier.clone(),
                operands: rs(operands),
            }),
            ConceptKind::Modified { modifier, filler } => Concept::build(ConceptKind::Modified {
                modifier: modifier.clone(),
                filler: r(filler),
            }),
            ConceptKind::Approximation { kind, role, filler } => {
                Concept::build(ConceptKind::Approximation {
                    kind: *kind,
                    role: role.clone(),
                    filler: r(filler),
                })
            }
            ConceptKind::SigmaCount {
                role,
                filler,
                individuals,
                function,
            } => Concept::build(ConceptKind::SigmaCount {
                role: role.clone(),
                filler: r(filler),
                individuals: individuals.clone(),
                function: function.clone(),
            }),
            _ => self.clone(),
        }
    }

    /// Whether the concept mentions individuals
    pub fn has_nominals(&self) -> bool {
        match self.kind() {
            ConceptKind::HasValue { .. } | ConceptKind::SigmaCount { .. } => true,
            _ => self.children().iter().any(|c| c.has_nominals()),
        }
    }

    /// Syntactic triggers of dynamic blocking: a universal restriction nested
    /// under a quantifier, or a negated `HasValue` / `Self`
    pub fn needs_dynamic_blocking(&self) -> bool {
        self.dynamic_trigger(false)
    }

    fn dynamic_trigger(&self, under_quantifier: bool) -> bool {
        match self.kind() {
            ConceptKind::All { filler, .. } => under_quantifier || filler.dynamic_trigger(true),
            ConceptKind::Some { filler, .. } => filler.dynamic_trigger(true),
            ConceptKind::Not(inner) => matches!(
                inner.kind(),
                ConceptKind::HasValue { .. } | ConceptKind::SelfRestriction { .. }
            ) || inner.dynamic_trigger(under_quantifier),
            ConceptKind::Approximation { kind, role, filler } => {
                expand_approximation(*kind, role, filler).dynamic_trigger(under_quantifier)
            }
            _ => self
                .children()
                .iter()
                .any(|c| c.dynamic_trigger(under_quantifier)),
        }
    }
}

/// Rewrite an approximation into the quantifiers it stands for
pub fn expand_approximation(kind: ApproximationKind, role: &str, filler: &Concept) -> Concept {
    match kind {
        ApproximationKind::Lower => Concept::all(role, filler.clone()),
        ApproximationKind::Upper => Concept::some(role, filler.clone()),
        ApproximationKind::TightLower => Concept::all(role, Concept::all(role, filler.clone())),
        ApproximationKind::TightUpper => Concept::all(role, Concept::some(role, filler.clone())),
        ApproximationKind::LooseLower => Concept::some(role, Concept::all(role, filler.clone())),
        ApproximationKind::LooseUpper => Concept::some(role, Concept::some(role, filler.clone())),
    }
}

fn require_abstract(concept: &Concept, context: &str) -> Result<(), FuzzyDlError> {
    if concept.is_concrete() {
        return Err(FuzzyDlError::ConcreteMisuse(format!(
            "concrete concept {} used in {}",
            concept, context
        )));
    }
    Ok(())
}

fn check_connective(family: LogicFamily, operands: &[Concept], keyword: &str) -> Result<(), FuzzyDlError> {
    if !family.has_connectives() {
        return Err(FuzzyDlError::InvalidConcept(format!(
            "{:?} has no {} connective",
            family, keyword
        )));
    }
    for operand in operands {
        require_abstract(operand, keyword)?;
    }
    Ok(())
}

fn join(concepts: &[Concept]) -> String {
    concepts
        .iter()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render(kind: &ConceptKind) -> String {
    match kind {
        ConceptKind::Top => "*top*".to_string(),
        ConceptKind::Bottom => "*bottom*".to_string(),
        ConceptKind::Atomic(name) => name.clone(),
        ConceptKind::And { family, operands } => {
            format!("({}and {})", family.prefix(), join(operands))
        }
        ConceptKind::Or { family, operands } => {
            format!("({}or {})", family.prefix(), join(operands))
        }
        ConceptKind::Not(c) => format!("(not {})", c),
        ConceptKind::Implies {
            family,
            antecedent,
            consequent,
        } => format!("({} {} {})", family.implies_keyword(), antecedent, consequent),
        ConceptKind::Some { role, filler } => format!("(some {} {})", role, filler),
        ConceptKind::All { role, filler } => format!("(all {} {})", role, filler),
        ConceptKind::HasValue { role, individual } => format!("(b-some {} {})", role, individual),
        ConceptKind::SelfRestriction { role } => format!("(self {})", role),
        ConceptKind::Threshold {
            kind,
            weight,
            filler,
        } => format!("([{} {}] {})", kind.symbol(), weight, filler),
        ConceptKind::Weighted { weight, filler } => format!("({} {})", weight, filler),
        ConceptKind::Aggregation {
            operator,
            weights,
            operands,
        } => {
            if operator.is_ordered() {
                let ws: Vec<String> = weights.iter().map(|w| w.to_string()).collect();
                format!("({} ({}) ({}))", operator.keyword(), ws.join(" "), join(operands))
            } else {
                let pairs: Vec<String> = weights
                    .iter()
                    .zip(operands)
                    .map(|(w, c)| format!("({} {})", w, c))
                    .collect();
                format!("({} {})", operator.keyword(), pairs.join(" "))
            }
        }
        ConceptKind::Qowa {
            quantifier,
            operands,
        } => format!("(q-owa {} {})", quantifier.name, join(operands)),
        ConceptKind::Modified { modifier, filler } => format!("({} {})", modifier.name, filler),
        ConceptKind::Approximation { kind, role, filler } => {
            format!("({} {} {})", kind.keyword(), role, filler)
        }
        ConceptKind::SigmaCount {
            role,
            filler,
            individuals,
            function,
        } => format!(
            "(sigma-count {} {} {{{}}} {})",
            role,
            filler,
            individuals.join(" "),
            function
        ),
        ConceptKind::Concrete { name, .. } => name.clone(),
        ConceptKind::FuzzyNumber(n) => n.to_string(),
    }
}

impl PartialEq for Concept {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

// weights and parameters are validated finite, so equality is reflexive
impl Eq for Concept {}

impl Hash for Concept {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concept({})", self.name())
    }
}

impl Neg for Concept {
    type Output = Concept;

    fn neg(self) -> Concept {
        self.negate()
    }
}

impl Neg for &Concept {
    type Output = Concept;

    fn neg(self) -> Concept {
        self.negate()
    }
}

impl From<Concept> for ConceptKind {
    fn from(concept: Concept) -> Self {
        concept.kind().clone()
    }
}

impl TryFrom<ConceptKind> for Concept {
    type Error = FuzzyDlError;

    /// Validating construction, used when concepts are deserialised
    fn try_from(kind: ConceptKind) -> Result<Self, Self::Error> {
        match kind {
            ConceptKind::Top => Ok(Concept::top()),
            ConceptKind::Bottom => Ok(Concept::bottom()),
            ConceptKind::Atomic(name) => Ok(Concept::atomic(name)),
            ConceptKind::And { family, operands } => Concept::and(family, operands),
            ConceptKind::Or { family, operands } => Concept::or(family, operands),
            ConceptKind::Not(c) => Ok(Concept::not(c)),
            ConceptKind::Implies {
                family,
                antecedent,
                consequent,
            } => Concept::implies(family, antecedent, consequent),
            ConceptKind::Some { role, filler } => Ok(Concept::some(role, filler)),
            ConceptKind::All { role, filler } => Ok(Concept::all(role, filler)),
            ConceptKind::HasValue { role, individual } => Ok(Concept::has_value(role, individual)),
            ConceptKind::SelfRestriction { role } => Ok(Concept::self_restriction(role)),
            ConceptKind::Threshold {
                kind,
                weight,
                filler,
            } => Concept::threshold(kind, weight, filler),
            ConceptKind::Weighted { weight, filler } => Concept::weighted(weight, filler),
            ConceptKind::Aggregation {
                operator,
                weights,
                operands,
            } => Concept::aggregation(operator, weights, operands),
            ConceptKind::Qowa {
                quantifier,
                operands,
            } => Concept::qowa(quantifier, operands),
            ConceptKind::Modified { modifier, filler } => Concept::modified(modifier, filler),
            ConceptKind::Approximation { kind, role, filler } => {
                Concept::approximation(kind, role, filler)
            }
            ConceptKind::SigmaCount {
                role,
                filler,
                individuals,
                function,
            } => Concept::sigma_count(role, filler, individuals, function),
            ConceptKind::Concrete { name, function } => Concept::concrete(name, function),
            ConceptKind::FuzzyNumber(n) => Concept::fuzzy_number(n),
        }
    }
}

/// Concept constructors applying proof-irrelevant simplifications when
/// optimisations are on: `∃r.⊥ → ⊥`, `∀r.⊤ → ⊤`, and absorbing ⊤ / ⊥ in
/// conjunctions and disjunctions.
#[derive(Debug, Clone, Copy)]
pub struct ConceptFactory {
    optimizations: bool,
}

impl ConceptFactory {
    pub fn new(optimizations: bool) -> Self {
        Self { optimizations }
    }

    pub fn optimizations(&self) -> bool {
        self.optimizations
    }

    pub fn some(&self, role: impl Into<String>, filler: Concept) -> Concept {
        if self.optimizations && filler.is_bottom() {
            return Concept::bottom();
        }
        Concept::some(role, filler)
    }

    pub fn all(&self, role: impl Into<String>, filler: Concept) -> Concept {
        if self.optimizations && filler.is_top() {
            return Concept::top();
        }
        Concept::all(role, filler)
    }

    pub fn and(&self, family: LogicFamily, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        if !self.optimizations {
            return Concept::and(family, operands);
        }
        if operands.iter().any(Concept::is_bottom) {
            check_connective(family, &operands, "and")?;
            return Ok(Concept::bottom());
        }
        let mut kept: Vec<Concept> = Vec::with_capacity(operands.len());
        for operand in operands.into_iter().filter(|c| !c.is_top()) {
            if !kept.contains(&operand) || !family.is_min_based() {
                kept.push(operand);
            }
        }
        Concept::and(family, kept)
    }

    pub fn or(&self, family: LogicFamily, operands: Vec<Concept>) -> Result<Concept, FuzzyDlError> {
        if !self.optimizations {
            return Concept::or(family, operands);
        }
        if operands.iter().any(Concept::is_top) {
            check_connective(family, &operands, "or")?;
            return Ok(Concept::top());
        }
        let mut kept: Vec<Concept> = Vec::with_capacity(operands.len());
        for operand in operands.into_iter().filter(|c| !c.is_bottom()) {
            if !kept.contains(&operand) || !family.is_min_based() {
                kept.push(operand);
            }
        }
        Concept::or(family, kept)
    }

    /// Apply the simplifications bottom-up to an already built concept
    pub fn simplify(&self, concept: &Concept) -> Concept {
        if !self.optimizations {
            return concept.clone();
        }
        let concept = concept.map_children(|c| self.simplify(c));
        let simplified = match concept.kind() {
            ConceptKind::Some { filler, .. } if filler.is_bottom() => Some(Concept::bottom()),
            ConceptKind::All { filler, .. } if filler.is_top() => Some(Concept::top()),
            ConceptKind::And { operands, .. } if operands.iter().any(Concept::is_bottom) => {
                Some(Concept::bottom())
            }
            ConceptKind::Or { operands, .. } if operands.iter().any(Concept::is_top) => Some(Concept::top()),
            ConceptKind::And { family, operands } => {
                absorb(*family, operands, Concept::is_top).and_then(|kept| Concept::and(*family, kept).ok())
            }
            ConceptKind::Or { family, operands } => {
                absorb(*family, operands, Concept::is_bottom).and_then(|kept| Concept::or(*family, kept).ok())
            }
            _ => None,
        };
        simplified.unwrap_or(concept)
    }
}

/// Operands without neutral elements and, for idempotent families,
/// without duplicates; `None` when nothing changes
fn absorb(family: LogicFamily, operands: &[Concept], neutral: fn(&Concept) -> bool) -> Option<Vec<Concept>> {
    let mut kept: Vec<Concept> = Vec::with_capacity(operands.len());
    for operand in operands.iter().filter(|c| !neutral(c)) {
        if !kept.contains(operand) || !family.is_min_based() {
            kept.push(operand.clone());
        }
    }
    (kept.len() != operands.len()).then_some(kept)
}

impl Default for ConceptFactory {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Concept {
        Concept::atomic("A")
    }

    fn b() -> Concept {
        Concept::atomic("B")
    }

    #[test]
    fn test_structural_equality() {
        let c1 = Concept::and(LogicFamily::Zadeh, vec![a(), Concept::some("r", b())]).unwrap();
        let c2 = Concept::and(LogicFamily::Zadeh, vec![a(), Concept::some("r", b())]).unwrap();
        assert_eq!(c1, c2);
        let mut set = std::collections::HashSet::new();
        set.insert(c1);
        assert!(set.contains(&c2));

        let l = Concept::and(LogicFamily::Lukasiewicz, vec![a(), Concept::some("r", b())]).unwrap();
        assert_ne!(l, c2);
    }

    #[test]
    fn test_names() {
        let c = Concept::implies(LogicFamily::Goedel, a(), Concept::all("r", b())).unwrap();
        assert_eq!(c.name(), "(g-implies A (all r B))");
        let t = Concept::threshold(ThresholdKind::AtLeast, Weight::Value(0.5), a()).unwrap();
        assert_eq!(t.to_string(), "([>= 0.5] A)");
        let owa = Concept::owa(vec![0.4, 0.6], vec![a(), b()]).unwrap();
        assert_eq!(owa.to_string(), "(owa (0.4 0.6) (A B))");
    }

    #[test]
    fn test_weight_validation() {
        assert!(Concept::weighted_sum(vec![0.5, 0.51], vec![a(), b()]).is_err());
        assert!(Concept::weighted_sum(vec![0.5, 0.49], vec![a(), b()]).is_ok());
        assert!(Concept::owa(vec![0.3, 0.3, 0.3], vec![a(), b(), Concept::atomic("C")]).is_err());
        assert!(Concept::owa(vec![0.4, 0.6], vec![a(), b()]).is_ok());
        assert!(Concept::aggregation(AggregationOperator::WeightedMax, vec![0.5, 0.9], vec![a(), b()]).is_err());
        assert!(Concept::aggregation(AggregationOperator::Sugeno, vec![0.5, 1.0], vec![a(), b()]).is_ok());
        assert!(Concept::owa(vec![1.0], vec![a(), b()]).is_err());
    }

    #[test]
    fn test_negation_duals() {
        let some = Concept::some("r", a());
        assert_eq!(-&some, Concept::all("r", -a()));
        assert_eq!(-(-&some), some);

        let t = Concept::threshold(ThresholdKind::AtMost, Weight::Value(0.3), a()).unwrap();
        match (-&t).kind() {
            ConceptKind::Threshold { kind, .. } => assert_eq!(*kind, ThresholdKind::GreaterThan),
            other => panic!("unexpected {:?}", other),
        }

        let la = Concept::approximation(ApproximationKind::TightLower, "s", a()).unwrap();
        match (-&la).kind() {
            ConceptKind::Approximation { kind, filler, .. } => {
                assert_eq!(*kind, ApproximationKind::LooseUpper);
                assert_eq!(*filler, -a());
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(-Concept::top(), Concept::bottom());
        let w = Concept::weighted(0.5, a()).unwrap();
        assert_eq!(-(-&w), w);
    }

    #[test]
    fn test_implication_negation() {
        let kd = Concept::implies(LogicFamily::KleeneDienes, a(), b()).unwrap();
        assert_eq!(
            -&kd,
            Concept::and(LogicFamily::Zadeh, vec![a(), -b()]).unwrap()
        );
        let g = Concept::implies(LogicFamily::Goedel, a(), b()).unwrap();
        assert!(matches!((-&g).kind(), ConceptKind::Not(_)));
    }

    #[test]
    fn test_replace() {
        let c = Concept::and(LogicFamily::Zadeh, vec![a(), Concept::some("r", -a())]).unwrap();
        let d = Concept::atomic("D");
        let replaced = c.replace(&a(), &d);
        assert_eq!(replaced.atomic_concepts(), ["D".to_string()].into_iter().collect());
        assert_eq!(replaced.name(), "(and D (some r (not D)))");
    }

    #[test]
    fn test_concrete_misuse() {
        let young = Concept::concrete(
            "young",
            MembershipFunction::LeftShoulder { k1: 0.0, k2: 100.0, a: 20.0, b: 30.0 },
        )
        .unwrap();
        assert!(young.is_concrete());
        assert!((-&young).is_concrete());
        assert!(Concept::and(LogicFamily::Zadeh, vec![a(), young.clone()]).is_err());
        assert!(!Concept::some("age", young).is_concrete());
    }

    #[test]
    fn test_factory_optimisations() {
        let on = ConceptFactory::new(true);
        let off = ConceptFactory::new(false);
        assert!(on.some("r", Concept::bottom()).is_bottom());
        assert!(on.all("r", Concept::top()).is_top());
        assert!(!off.some("r", Concept::bottom()).is_bottom());
        let and = on.and(LogicFamily::Zadeh, vec![a(), Concept::top()]).unwrap();
        assert_eq!(and, a());
    }

    #[test]
    fn test_factory_simplifies_nested_concepts() {
        let on = ConceptFactory::new(true);
        let empty = Concept::some("r", Concept::bottom());
        let or = Concept::or(LogicFamily::Zadeh, vec![empty.clone(), a()]).unwrap();
        assert_eq!(on.simplify(&or), a());
        assert!(on.simplify(&Concept::not(empty.clone())).is_top());
        let trivial = Concept::all("s", Concept::or(LogicFamily::Zadeh, vec![b(), Concept::top()]).unwrap());
        assert!(on.simplify(&trivial).is_top());
        assert_eq!(ConceptFactory::new(false).simplify(&or), or);
    }

    #[test]
    fn test_dynamic_blocking_triggers() {
        assert!(!Concept::all("r", a()).needs_dynamic_blocking());
        assert!(Concept::some("r", Concept::all("r", a())).needs_dynamic_blocking());
        assert!(Concept::all("r", Concept::all("s", a())).needs_dynamic_blocking());
        assert!(Concept::not(Concept::has_value("r", "i")).needs_dynamic_blocking());
        assert!(!Concept::some("r", Concept::some("r", a())).needs_dynamic_blocking());
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"{"Aggregation":{"operator":"Owa","weights":[0.3,0.3,0.3],"operands":[{"Atomic":"A"},{"Atomic":"B"},{"Atomic":"C"}]}}"#;
        assert!(serde_json::from_str::<Concept>(json).is_err());
        let json = r#"{"Some":{"role":"r","filler":{"Atomic":"A"}}}"#;
        let c: Concept = serde_json::from_str(json).unwrap();
        assert_eq!(c.name(), "(some r A)");
        assert_eq!(serde_json::to_string(&c).unwrap(), json);
    }
}
