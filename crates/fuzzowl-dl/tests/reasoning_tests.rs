use fuzzowl_dl::query::{
    AllInstancesQuery, MaxInstanceQuery, MinInstanceQuery, MinSubsumesQuery, SomDefuzzifyQuery,
};
use fuzzowl_dl::*;
use proptest::prelude::*;

fn atom(name: &str) -> Concept {
    Concept::atomic(name)
}

fn assert_value(solution: &Solution, expected: f64) {
    assert!(solution.is_consistent_kb(), "unexpected inconsistency");
    assert!(
        (solution.value() - expected).abs() < 1e-5,
        "expected {}, got {}",
        expected,
        solution
    );
}

/// Assert `a : C = degree` exactly
fn fix_degree(kb: &mut KnowledgeBase, individual: &str, concept: Concept, degree: f64) {
    kb.add_assertion(individual, concept.clone(), degree).unwrap();
    kb.add_assertion(individual, Concept::not(concept), 1.0 - degree).unwrap();
}

fn with_age(kb: &mut KnowledgeBase) {
    kb.add_axiom(Axiom::ConcreteFeature {
        name: "age".into(),
        kind: FeatureKind::Real,
        k1: 0.0,
        k2: 100.0,
    })
    .unwrap();
}

#[test]
fn test_weighted_sum_of_crisp_degrees() {
    let mut kb = KnowledgeBase::default();
    fix_degree(&mut kb, "a", atom("A"), 1.0);
    fix_degree(&mut kb, "a", atom("B"), 0.0);
    let sum = Concept::weighted_sum(vec![2.0 / 7.0, 5.0 / 7.0], vec![atom("A"), atom("B")]).unwrap();
    let min = MinInstanceQuery::new("a", sum.clone()).solve(&kb).unwrap();
    let max = MaxInstanceQuery::new("a", sum).solve(&kb).unwrap();
    assert_value(&min, 2.0 / 7.0);
    assert_value(&max, 2.0 / 7.0);
}

#[test]
fn test_owa_orders_operands() {
    let mut kb = KnowledgeBase::default();
    fix_degree(&mut kb, "a", atom("A"), 0.5);
    fix_degree(&mut kb, "a", atom("B"), 0.75);
    let owa = Concept::owa(vec![0.4, 0.6], vec![atom("A"), atom("B")]).unwrap();
    // 0.4 · 0.75 + 0.6 · 0.5
    assert_value(&MinInstanceQuery::new("a", owa.clone()).solve(&kb).unwrap(), 0.6);
    assert_value(&MaxInstanceQuery::new("a", owa).solve(&kb).unwrap(), 0.6);
}

#[test]
fn test_left_shoulder_feature() {
    let mut kb = KnowledgeBase::default();
    with_age(&mut kb);
    kb.set_feature_value("a", "age", 25.0).unwrap();
    let young = Concept::concrete(
        "young",
        MembershipFunction::LeftShoulder { k1: 0.0, k2: 100.0, a: 20.0, b: 30.0 },
    )
    .unwrap();
    let query = Concept::some("age", young);
    assert_value(&MinInstanceQuery::new("a", query.clone()).solve(&kb).unwrap(), 0.5);
    assert_value(&MaxInstanceQuery::new("a", query).solve(&kb).unwrap(), 0.5);
}

#[test]
fn test_feature_value_out_of_range() {
    let mut kb = KnowledgeBase::default();
    with_age(&mut kb);
    assert!(matches!(
        kb.set_feature_value("a", "age", 130.0),
        Err(FuzzyDlError::InvalidConcept(_))
    ));
}

#[test]
fn test_defuzzify_from_assertion() {
    let mut kb = KnowledgeBase::default();
    with_age(&mut kb);
    let old = Concept::concrete(
        "old",
        MembershipFunction::RightShoulder { k1: 0.0, k2: 100.0, a: 60.0, b: 70.0 },
    )
    .unwrap();
    let concept = Concept::some("age", old);
    kb.add_assertion("a", concept.clone(), 1.0).unwrap();
    let som = SomDefuzzifyQuery::new("a", concept, "age").solve(&kb).unwrap();
    assert!((som.value() - 70.0).abs() < 1e-3, "som = {}", som);
}

#[test]
fn test_blocking_cycle_keeps_degrees() {
    let mut kb = KnowledgeBase::default();
    kb.add_axiom(Axiom::Transitive("r".into())).unwrap();
    kb.add_axiom(Axiom::gci(atom("A"), Concept::some("r", atom("A")), 1.0)).unwrap();
    kb.add_assertion("a", atom("A"), 0.8).unwrap();
    let query = Concept::some("r", atom("A"));
    assert_value(&MinInstanceQuery::new("a", query).solve(&kb).unwrap(), 0.8);
}

#[test]
fn test_functional_role_merges_fillers() {
    let mut kb = KnowledgeBase::default();
    kb.add_axiom(Axiom::Functional("hasMother".into())).unwrap();
    kb.add_assertion("mary", atom("Teacher"), 0.7).unwrap();
    kb.add_relation("tom", "hasMother", "mary", 1.0).unwrap();
    kb.add_relation("tom", "hasMother", "mother_of_tom", 1.0).unwrap();
    assert_eq!(kb.resolve("mother_of_tom"), "mary");
    assert!(!kb.named_individuals().contains(&"mother_of_tom".to_string()));
    let degree = MinInstanceQuery::new("mother_of_tom", atom("Teacher")).solve(&kb).unwrap();
    assert_value(&degree, 0.7);
}

#[test]
fn test_role_hierarchy_and_inverse() {
    let mut kb = KnowledgeBase::default();
    kb.add_axiom(Axiom::RoleInclusion {
        sub: "hasSon".into(),
        sup: "hasChild".into(),
        degree: 1.0,
    })
    .unwrap();
    kb.add_axiom(Axiom::InverseRoles("hasChild".into(), "hasParent".into())).unwrap();
    kb.add_relation("ann", "hasSon", "bob", 0.9).unwrap();
    let parent = Concept::has_value("hasParent", "ann");
    assert_value(&MinInstanceQuery::new("bob", parent).solve(&kb).unwrap(), 0.9);
}

#[test]
fn test_all_instances_reports_degrees() {
    let mut kb = KnowledgeBase::default();
    kb.add_axiom(Axiom::gci(atom("Dog"), atom("Animal"), 1.0)).unwrap();
    kb.add_assertion("rex", atom("Dog"), 0.9).unwrap();
    kb.add_assertion("tom", atom("Cat"), 1.0).unwrap();
    let mut query = AllInstancesQuery::new(atom("Animal"));
    let solution = query.solve(&kb).unwrap();
    assert_eq!(solution.value(), 1.0);
    assert_eq!(query.results(), &[("rex".to_string(), 0.9), ("tom".to_string(), 0.0)]);
}

#[test]
fn test_classical_semantics_is_crisp() {
    let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Classical));
    kb.add_assertion("a", atom("A"), 0.3).unwrap();
    // any positive degree forces membership 1
    assert_value(&MinInstanceQuery::new("a", atom("A")).solve(&kb).unwrap(), 1.0);
}

#[test]
fn test_lukasiewicz_subsumption_of_definitions() {
    let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(Semantics::Lukasiewicz));
    let both = Concept::and(LogicFamily::Lukasiewicz, vec![atom("A"), atom("B")]).unwrap();
    kb.add_axiom(Axiom::ConceptDefinition {
        name: "C".into(),
        concept: both,
    })
    .unwrap();
    kb.solve_kb().unwrap();
    let query = MinSubsumesQuery::new(atom("C"), atom("A"), LogicFamily::Lukasiewicz);
    assert_value(&query.clone().solve(&kb).unwrap(), 1.0);
}

#[test]
fn test_classification_of_document() {
    let json = r#"{
        "axioms": [
            { "Gci": { "sub": { "Atomic": "Puppy" }, "sup": { "Atomic": "Dog" } } },
            { "Gci": { "sub": { "Atomic": "Dog" }, "sup": { "Atomic": "Animal" } } }
        ],
        "queries": [ { "query": "classify" } ]
    }"#;
    let results = Document::from_json(json).unwrap().run().unwrap();
    // top, bottom and one node per name
    assert_eq!(results[0].solution.value(), 5.0);
}

#[test]
fn test_expansion_limit_without_blocking() {
    let config = ReasonerConfig {
        blocking: BlockingType::NoBlocking,
        max_created_individuals: 20,
        ..Default::default()
    };
    let mut kb = KnowledgeBase::new(config);
    kb.add_axiom(Axiom::gci(atom("A"), Concept::some("r", atom("A")), 1.0)).unwrap();
    kb.add_assertion("a", atom("A"), 1.0).unwrap();
    assert!(matches!(
        MinInstanceQuery::new("a", atom("A")).solve(&kb),
        Err(FuzzyDlError::ExpansionLimit(20))
    ));
}

fn concept_strategy() -> impl Strategy<Value = Concept> {
    let leaf = prop_oneof![
        "[A-D]".prop_map(|name| Concept::atomic(name.as_str())),
        Just(Concept::top()),
        Just(Concept::bottom()),
        "[r-t]".prop_map(|role| Concept::self_restriction(role.as_str())),
        ("[r-t]", "[a-c]").prop_map(|(role, a)| Concept::has_value(role.as_str(), a.as_str())),
    ];
    let connective = prop_oneof![
        Just(LogicFamily::Zadeh),
        Just(LogicFamily::Lukasiewicz),
        Just(LogicFamily::Goedel),
    ];
    let implication = prop_oneof![
        Just(LogicFamily::Zadeh),
        Just(LogicFamily::Lukasiewicz),
        Just(LogicFamily::Goedel),
        Just(LogicFamily::KleeneDienes),
    ];
    let threshold = prop_oneof![
        Just(ThresholdKind::AtLeast),
        Just(ThresholdKind::AtMost),
        Just(ThresholdKind::GreaterThan),
        Just(ThresholdKind::LessThan),
    ];
    let approximation = prop_oneof![
        Just(ApproximationKind::Lower),
        Just(ApproximationKind::Upper),
        Just(ApproximationKind::TightLower),
        Just(ApproximationKind::TightUpper),
        Just(ApproximationKind::LooseLower),
        Just(ApproximationKind::LooseUpper),
    ];
    leaf.prop_recursive(3, 24, 3, move |inner| {
        prop_oneof![
            inner.clone().prop_map(Concept::not),
            (connective.clone(), prop::collection::vec(inner.clone(), 2..=3))
                .prop_map(|(family, operands)| Concept::and(family, operands).unwrap()),
            (connective.clone(), prop::collection::vec(inner.clone(), 2..=3))
                .prop_map(|(family, operands)| Concept::or(family, operands).unwrap()),
            (implication.clone(), inner.clone(), inner.clone())
                .prop_map(|(family, c, d)| Concept::implies(family, c, d).unwrap()),
            ("[r-t]", inner.clone()).prop_map(|(role, c)| Concept::some(role.as_str(), c)),
            ("[r-t]", inner.clone()).prop_map(|(role, c)| Concept::all(role.as_str(), c)),
            (threshold.clone(), 0.0f64..=1.0, inner.clone())
                .prop_map(|(kind, w, c)| Concept::threshold(kind, Weight::Value(w), c).unwrap()),
            (0.0f64..=1.0, inner.clone()).prop_map(|(w, c)| Concept::weighted(w, c).unwrap()),
            (inner.clone(), inner.clone())
                .prop_map(|(c, d)| Concept::owa(vec![0.4, 0.6], vec![c, d]).unwrap()),
            (approximation.clone(), "[r-t]", inner)
                .prop_map(|(kind, role, c)| Concept::approximation(kind, role.as_str(), c).unwrap()),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_min_never_exceeds_max(degree in 0.0f64..=1.0, lukasiewicz in any::<bool>()) {
        let semantics = if lukasiewicz { Semantics::Lukasiewicz } else { Semantics::Zadeh };
        let mut kb = KnowledgeBase::new(ReasonerConfig::with_semantics(semantics));
        kb.add_axiom(Axiom::gci(atom("A"), atom("B"), 0.6)).unwrap();
        kb.add_assertion("a", atom("A"), degree).unwrap();
        for concept in [atom("A"), atom("B")] {
            let min = MinInstanceQuery::new("a", concept.clone()).solve(&kb).unwrap();
            let max = MaxInstanceQuery::new("a", concept).solve(&kb).unwrap();
            prop_assert!(min.value() <= max.value() + 1e-9);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_double_negation_of_compound_concepts(concept in concept_strategy()) {
        prop_assert_eq!(Concept::not(Concept::not(concept.clone())), concept.clone());
        let twice = concept.negate().negate();
        prop_assert_eq!(twice.atomic_concepts(), concept.atomic_concepts());
        prop_assert_eq!(twice.roles(), concept.roles());
        prop_assert_eq!((-(-concept.clone())).atomic_concepts(), concept.atomic_concepts());
    }
}
