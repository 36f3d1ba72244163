//! TBox and RBox axioms

use crate::concept::{Concept, LogicFamily};
use crate::knowledge_base::FeatureKind;
use serde::{Deserialize, Serialize};

/// Terminological and role axioms accepted by a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Axiom {
    /// `A ≡ C`
    ConceptDefinition { name: String, concept: Concept },

    /// `A ⊑ C`
    PrimitiveDefinition { name: String, concept: Concept },

    /// General concept inclusion `⟨C ⊑ D, n⟩` under an implication family
    /// (the semantics' default when absent)
    Gci {
        sub: Concept,
        sup: Concept,
        #[serde(default = "one")]
        degree: f64,
        #[serde(default)]
        family: Option<LogicFamily>,
    },

    /// `C ≡ D` as two inclusions
    EquivalentConcepts(Concept, Concept),

    /// Pairwise disjoint atomic concepts
    Disjoint(Vec<String>),

    /// `∃r.⊤ ⊑ C`
    Domain { role: String, concept: Concept },

    /// `⊤ ⊑ ∀r.C`
    Range { role: String, concept: Concept },

    Functional(String),

    InverseFunctional(String),

    Transitive(String),

    Symmetric(String),

    Reflexive(String),

    /// `⟨r ⊑ s, n⟩`
    RoleInclusion {
        sub: String,
        sup: String,
        #[serde(default = "one")]
        degree: f64,
    },

    /// `s` is the inverse of `r`
    InverseRoles(String, String),

    /// Similarity relation: reflexive and symmetric
    Similarity(String),

    /// Fuzzy equivalence relation: similarity that is also transitive
    Equivalence(String),

    /// Functional concrete feature with range `[k1, k2]`
    ConcreteFeature {
        name: String,
        kind: FeatureKind,
        k1: f64,
        k2: f64,
    },
}

fn one() -> f64 {
    1.0
}

impl Axiom {
    pub fn gci(sub: Concept, sup: Concept, degree: f64) -> Self {
        Axiom::Gci {
            sub,
            sup,
            degree,
            family: None,
        }
    }

    /// Same axiom with every concept rewritten by `f`
    pub fn map_concepts(self, f: impl Fn(&Concept) -> Concept) -> Self {
        match self {
            Axiom::ConceptDefinition { name, concept } => Axiom::ConceptDefinition {
                name,
                concept: f(&concept),
            },
            Axiom::PrimitiveDefinition { name, concept } => Axiom::PrimitiveDefinition {
                name,
                concept: f(&concept),
            },
            Axiom::Gci {
                sub,
                sup,
                degree,
                family,
            } => Axiom::Gci {
                sub: f(&sub),
                sup: f(&sup),
                degree,
                family,
            },
            Axiom::EquivalentConcepts(c, d) => Axiom::EquivalentConcepts(f(&c), f(&d)),
            Axiom::Domain { role, concept } => Axiom::Domain {
                role,
                concept: f(&concept),
            },
            Axiom::Range { role, concept } => Axiom::Range {
                role,
                concept: f(&concept),
            },
            other => other,
        }
    }
}
