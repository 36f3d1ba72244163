//! JSON knowledge base documents
//!
//! A document carries the reasoner configuration, the axioms and assertions
//! of a knowledge base and the queries to run against it.

use crate::axiom::Axiom;
use crate::concept::{Concept, LogicFamily};
use crate::config::ReasonerConfig;
use crate::knowledge_base::{Assertion, KnowledgeBase, RelationAssertion};
use crate::membership::FuzzyNumber;
use crate::query::{
    AllInstancesQuery, BnpQuery, ClassifyQuery, KbSatisfiableQuery, LomDefuzzifyQuery, MaxInstanceQuery,
    MaxRelatedQuery, MaxSatisfiableQuery, MaxSubsumesQuery, MinInstanceQuery, MinRelatedQuery,
    MinSatisfiableQuery, MinSubsumesQuery, MomDefuzzifyQuery, Query, SomDefuzzifyQuery,
};
use crate::FuzzyDlError;
use fuzzowl_core::Solution;
use serde::{Deserialize, Serialize};
use tracing::info;

/// `individual.feature = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    pub individual: String,
    pub feature: String,
    pub value: f64,
}

/// Query as written in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum QuerySpec {
    KbSatisfiable,
    MinSatisfiable {
        concept: Concept,
        #[serde(default)]
        individual: Option<String>,
    },
    MaxSatisfiable {
        concept: Concept,
        #[serde(default)]
        individual: Option<String>,
    },
    MinInstance {
        individual: String,
        concept: Concept,
    },
    MaxInstance {
        individual: String,
        concept: Concept,
    },
    MinRelated {
        subject: String,
        role: String,
        object: String,
    },
    MaxRelated {
        subject: String,
        role: String,
        object: String,
    },
    /// Implication family defaults to the semantics' default implication
    MinSubsumes {
        sub: Concept,
        sup: Concept,
        #[serde(default)]
        family: Option<LogicFamily>,
    },
    MaxSubsumes {
        sub: Concept,
        sup: Concept,
        #[serde(default)]
        family: Option<LogicFamily>,
    },
    AllInstances {
        concept: Concept,
    },
    Classify,
    LomDefuzzify {
        individual: String,
        concept: Concept,
        feature: String,
    },
    SomDefuzzify {
        individual: String,
        concept: Concept,
        feature: String,
    },
    MomDefuzzify {
        individual: String,
        concept: Concept,
        feature: String,
    },
    Bnp {
        number: FuzzyNumber,
    },
}

impl QuerySpec {
    /// Executable query for a knowledge base with the given configuration
    pub fn build(&self, config: &ReasonerConfig) -> Box<dyn Query> {
        let implication = |family: &Option<LogicFamily>| family.unwrap_or_else(|| config.semantics.default_implication());
        match self.clone() {
            QuerySpec::KbSatisfiable => Box::new(KbSatisfiableQuery::new()),
            QuerySpec::MinSatisfiable { concept, individual } => match individual {
                Some(a) => Box::new(MinSatisfiableQuery::for_individual(concept, a)),
                None => Box::new(MinSatisfiableQuery::new(concept)),
            },
            QuerySpec::MaxSatisfiable { concept, individual } => match individual {
                Some(a) => Box::new(MaxSatisfiableQuery::for_individual(concept, a)),
                None => Box::new(MaxSatisfiableQuery::new(concept)),
            },
            QuerySpec::MinInstance { individual, concept } => Box::new(MinInstanceQuery::new(individual, concept)),
            QuerySpec::MaxInstance { individual, concept } => Box::new(MaxInstanceQuery::new(individual, concept)),
            QuerySpec::MinRelated { subject, role, object } => Box::new(MinRelatedQuery::new(subject, role, object)),
            QuerySpec::MaxRelated { subject, role, object } => Box::new(MaxRelatedQuery::new(subject, role, object)),
            QuerySpec::MinSubsumes { sub, sup, family } => {
                Box::new(MinSubsumesQuery::new(sub, sup, implication(&family)))
            }
            QuerySpec::MaxSubsumes { sub, sup, family } => {
                Box::new(MaxSubsumesQuery::new(sub, sup, implication(&family)))
            }
            QuerySpec::AllInstances { concept } => Box::new(AllInstancesQuery::new(concept)),
            QuerySpec::Classify => Box::new(ClassifyQuery::new()),
            QuerySpec::LomDefuzzify {
                individual,
                concept,
                feature,
            } => Box::new(LomDefuzzifyQuery::new(individual, concept, feature)),
            QuerySpec::SomDefuzzify {
                individual,
                concept,
                feature,
            } => Box::new(SomDefuzzifyQuery::new(individual, concept, feature)),
            QuerySpec::MomDefuzzify {
                individual,
                concept,
                feature,
            } => Box::new(MomDefuzzifyQuery::new(individual, concept, feature)),
            QuerySpec::Bnp { number } => Box::new(BnpQuery::new(number)),
        }
    }
}

/// Answer to one query of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub solution: Solution,
}

/// A knowledge base together with its queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub config: ReasonerConfig,
    pub axioms: Vec<Axiom>,
    pub individuals: Vec<String>,
    pub assertions: Vec<Assertion>,
    pub relations: Vec<RelationAssertion>,
    pub feature_values: Vec<FeatureValue>,
    pub queries: Vec<QuerySpec>,
}

impl Document {
    pub fn from_json(json: &str) -> Result<Self, FuzzyDlError> {
        serde_json::from_str(json).map_err(|e| FuzzyDlError::LoaderError(e.to_string()))
    }

    /// Replace the configuration, e.g. with one given on the command line
    pub fn with_config(mut self, config: ReasonerConfig) -> Self {
        self.config = config;
        self
    }

    /// Knowledge base described by the document, expanded once
    pub fn build_kb(&self) -> Result<KnowledgeBase, FuzzyDlError> {
        let mut kb = KnowledgeBase::new(self.config.clone());
        for axiom in &self.axioms {
            kb.add_axiom(axiom.clone())?;
        }
        for name in &self.individuals {
            kb.add_individual(name)?;
        }
        for assertion in &self.assertions {
            kb.add_assertion(&assertion.individual, assertion.concept.clone(), assertion.degree)?;
        }
        for relation in &self.relations {
            kb.add_relation(&relation.subject, &relation.role, &relation.object, relation.degree)?;
        }
        for fv in &self.feature_values {
            kb.set_feature_value(&fv.individual, &fv.feature, fv.value)?;
        }
        kb.solve_kb()?;
        info!(
            "loaded {} axioms, {} assertions and {} relations",
            self.axioms.len(),
            self.assertions.len(),
            self.relations.len()
        );
        Ok(kb)
    }

    pub fn queries(&self) -> &[QuerySpec] {
        &self.queries
    }

    /// Build the knowledge base and answer every query in order
    pub fn run(&self) -> Result<Vec<QueryResult>, FuzzyDlError> {
        let kb = self.build_kb()?;
        self.queries
            .iter()
            .map(|entry| {
                let mut query = entry.build(kb.config());
                let solution = query.solve(&kb)?;
                Ok(QueryResult {
                    query: query.to_string(),
                    solution,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "config": { "semantics": "Zadeh" },
        "axioms": [
            { "Gci": { "sub": { "Atomic": "A" }, "sup": { "Atomic": "B" }, "degree": 0.4 } }
        ],
        "assertions": [
            { "individual": "a", "concept": { "Atomic": "A" }, "degree": 0.7 }
        ],
        "queries": [
            { "query": "min_instance", "individual": "a", "concept": { "Atomic": "B" } },
            { "query": "kb_satisfiable" }
        ]
    }"#;

    #[test]
    fn test_run_document() {
        let document = Document::from_json(DOCUMENT).unwrap();
        let results = document.run().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].query, "(min-instance? a B)");
        assert!((results[0].solution.value() - 0.4).abs() < 1e-6);
        assert_eq!(results[1].solution.value(), 1.0);
    }

    #[test]
    fn test_loader_error() {
        assert!(matches!(
            Document::from_json("{ \"axioms\": 3 }"),
            Err(FuzzyDlError::LoaderError(_))
        ));
    }

    #[test]
    fn test_invalid_concept_rejected_at_load() {
        let json = r#"{ "assertions": [ { "individual": "a",
            "concept": { "Aggregation": { "operator": "Owa", "weights": [0.5, 0.6], "operands": [ { "Atomic": "A" }, { "Atomic": "B" } ] } } } ] }"#;
        assert!(matches!(Document::from_json(json), Err(FuzzyDlError::LoaderError(_))));
    }
}
