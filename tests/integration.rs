// Integration tests for fuzzowl components
// These tests run whole knowledge bases through completion, encoding and the solver

#[cfg(test)]
mod tests {
    use fuzzowl_core::SolverConfig;
    use fuzzowl_dl::query::{
        KbSatisfiableQuery, MaxSatisfiableQuery, MaxSubsumesQuery, MinInstanceQuery, MinSatisfiableQuery,
        MinSubsumesQuery,
    };
    use fuzzowl_dl::*;

    fn atom(name: &str) -> Concept {
        Concept::atomic(name)
    }

    /// `a : C = degree`
    fn fix_degree(kb: &mut KnowledgeBase, individual: &str, concept: Concept, degree: f64) {
        kb.add_assertion(individual, concept.clone(), degree).unwrap();
        kb.add_assertion(individual, Concept::not(concept), 1.0 - degree).unwrap();
    }

    fn max_sat(kb: &KnowledgeBase, concept: Concept, individual: &str) -> Solution {
        MaxSatisfiableQuery::for_individual(concept, individual)
            .solve(kb)
            .unwrap()
    }

    #[test]
    fn test_end_to_end_owa_regression() {
        let mut kb = KnowledgeBase::default();
        fix_degree(&mut kb, "a", atom("A"), 0.5);
        fix_degree(&mut kb, "a", atom("B"), 0.75);
        let owa = Concept::owa(vec![0.4, 0.6], vec![atom("A"), atom("B")]).unwrap();
        assert_eq!(max_sat(&kb, owa, "a").to_string(), "0.6");
    }

    #[test]
    fn test_end_to_end_weighted_sum_regression() {
        let mut kb = KnowledgeBase::new(ReasonerConfig {
            precision: 4,
            ..ReasonerConfig::default()
        });
        fix_degree(&mut kb, "a", atom("A"), 1.0);
        fix_degree(&mut kb, "a", atom("B"), 0.0);
        let sum =
            Concept::weighted_sum(vec![2.0 / 7.0, 5.0 / 7.0], vec![atom("A"), atom("B")]).unwrap();
        assert_eq!(max_sat(&kb, sum, "a").to_string(), "0.2857");
    }

    #[test]
    fn test_end_to_end_goedel_implication_regression() {
        let mut kb = KnowledgeBase::default();
        fix_degree(&mut kb, "a", atom("A"), 0.7);
        fix_degree(&mut kb, "a", atom("B"), 0.4);
        let implication = Concept::implies(LogicFamily::Goedel, atom("A"), atom("B")).unwrap();
        assert_eq!(max_sat(&kb, implication, "a").to_string(), "0.4");
    }

    #[test]
    fn test_blocking_loop_is_stable() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::Transitive("partOf".into())).unwrap();
        kb.add_axiom(Axiom::gci(
            atom("Part"),
            Concept::some("partOf", atom("Part")),
            1.0,
        ))
        .unwrap();
        kb.add_assertion("wheel", atom("Part"), 0.8).unwrap();
        kb.solve_kb().unwrap();

        let query = Concept::some("partOf", Concept::some("partOf", atom("Part")));
        let first = MinInstanceQuery::new("wheel", query.clone()).solve(&kb).unwrap();
        let second = MinInstanceQuery::new("wheel", query).solve(&kb).unwrap();
        assert_eq!(first.to_string(), "0.8");
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn test_document_with_several_queries() {
        let json = r#"{
            "config": { "semantics": "Lukasiewicz" },
            "axioms": [
                { "Gci": { "sub": { "Atomic": "Student" }, "sup": { "Atomic": "Person" }, "degree": 1.0 } }
            ],
            "assertions": [
                { "individual": "ann", "concept": { "Atomic": "Student" }, "degree": 0.7 }
            ],
            "relations": [
                { "subject": "ann", "role": "knows", "object": "bob", "degree": 0.6 }
            ],
            "queries": [
                { "query": "kb_satisfiable" },
                { "query": "min_instance", "individual": "ann", "concept": { "Atomic": "Person" } },
                { "query": "min_related", "subject": "ann", "role": "knows", "object": "bob" },
                { "query": "max_instance", "individual": "bob", "concept": { "Atomic": "Person" } }
            ]
        }"#;
        let results = Document::from_json(json).unwrap().run().unwrap();
        let rendered: Vec<String> = results.iter().map(|r| r.solution.to_string()).collect();
        assert_eq!(rendered, vec!["1.0", "0.7", "0.6", "1.0"]);

        let data = serde_json::to_value(&results).unwrap();
        assert_eq!(data[1]["query"], "(min-instance? ann Person)");
    }

    #[test]
    fn test_inconsistency_is_an_answer_not_an_error() {
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
        kb.add_assertion("a", atom("C"), 0.9).unwrap();
        kb.add_assertion("a", Concept::not(atom("C")), 0.9).unwrap();
        kb.solve_kb().unwrap();

        assert!(!kb.is_consistent().unwrap());
        for solution in [
            KbSatisfiableQuery::new().solve(&kb).unwrap(),
            MinInstanceQuery::new("a", atom("C")).solve(&kb).unwrap(),
            MinSatisfiableQuery::new(atom("D")).solve(&kb).unwrap(),
            MinSubsumesQuery::new(atom("A"), atom("B"), LogicFamily::Lukasiewicz)
                .solve(&kb)
                .unwrap(),
            MaxSubsumesQuery::new(atom("A"), atom("B"), LogicFamily::Lukasiewicz)
                .solve(&kb)
                .unwrap(),
        ] {
            assert!(!solution.is_consistent_kb());
            assert_eq!(solution.to_string(), "Inconsistent KB");
        }
    }

    #[test]
    fn test_solver_limit_is_not_inconsistency() {
        let config = ReasonerConfig {
            solver: SolverConfig {
                max_nodes: 0,
                ..SolverConfig::default()
            },
            ..ReasonerConfig::default()
        };
        let mut kb = KnowledgeBase::new(config);
        kb.add_assertion("a", atom("A"), 0.5).unwrap();
        kb.solve_kb().unwrap();

        assert!(matches!(
            MinInstanceQuery::new("a", atom("A")).solve(&kb),
            Err(FuzzyDlError::SolverTimeout)
        ));
        assert!(matches!(kb.is_consistent(), Err(FuzzyDlError::SolverTimeout)));
    }

    #[test]
    fn test_queries_do_not_change_the_knowledge_base() {
        let mut kb = KnowledgeBase::default();
        kb.add_assertion("a", atom("A"), 0.6).unwrap();
        kb.solve_kb().unwrap();
        let constraints = kb.model().num_constraints();

        MinInstanceQuery::new("a", atom("A")).solve(&kb).unwrap();
        MaxSatisfiableQuery::new(atom("B")).solve(&kb).unwrap();

        assert_eq!(kb.model().num_constraints(), constraints);
        assert_eq!(kb.named_individuals(), vec!["a".to_string()]);
    }
}
