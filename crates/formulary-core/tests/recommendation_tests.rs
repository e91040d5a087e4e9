//! End-to-end recommendation scenarios.

use formulary_core::models::{DrugRecord, RecommendationResult};
use formulary_core::recommender::{peer_candidates, Recommender};
use formulary_core::RecommenderConfig;

fn statin(name: &str) -> DrugRecord {
    DrugRecord::new(name)
        .with_class("Statin")
        .with_indication("high cholesterol")
        .with_base_cost(30.0)
}

fn analgesic(name: &str) -> DrugRecord {
    DrugRecord::new(name)
        .with_class("Analgesic")
        .with_indication("pain relief")
        .with_base_cost(8.0)
}

fn formulary() -> Vec<DrugRecord> {
    vec![
        statin("Lipitor").with_alternative("Atorvastatin", "$10.00"),
        statin("Zocor"),
        statin("Crestor").with_alternative("GenericX", 8.0),
        statin("Pravachol").with_alternative("GenericX", 6.0),
        statin("Livalo").with_alternative("Atorvastatin", 5.0),
        analgesic("Advil").with_alternative("Ibuprofen", 2.0),
        analgesic("Tylenol").with_alternative("NULL", 1.0),
        analgesic("Aleve"),
    ]
}

/// Four peers: every statin's neighborhood is exactly the other statins.
fn config() -> RecommenderConfig {
    RecommenderConfig::default().with_neighborhood_size(4)
}

fn build(records: Vec<DrugRecord>) -> Recommender {
    Recommender::build(records, config()).unwrap()
}

#[test]
fn test_unknown_drug_not_found() {
    let recommender = build(formulary());
    assert_eq!(
        recommender.recommend("Unknown-Drug-XYZ").unwrap(),
        RecommendationResult::NotFound {
            queried_name: "Unknown-Drug-XYZ".into()
        }
    );
}

#[test]
fn test_no_alternatives_anywhere() {
    let recommender = build(vec![
        analgesic("Tylenol").with_alternative("NULL", 1.0),
        analgesic("Aleve").with_alternative("Naproxen", "n/a"),
        DrugRecord::new("Mystery"),
    ]);

    assert_eq!(
        recommender.recommend("tylenol").unwrap(),
        RecommendationResult::NoAlternatives {
            queried_name: "tylenol".into()
        }
    );
}

#[test]
fn test_self_alternative_beats_cheaper_peer() {
    let recommender = build(formulary());

    // Livalo offers the same substitute at 5, but Lipitor's own slot wins
    let result = recommender.recommend("Lipitor").unwrap();
    let best = result.best().unwrap();
    assert_eq!(best.substitute_name, "Atorvastatin");
    assert_eq!(best.cost, 10.0);
    assert_eq!(best.source_drug_name, "Lipitor");
    assert_eq!(best.source_drug_cost, Some(30.0));

    if let RecommendationResult::Found { others, .. } = result {
        assert!(others.iter().all(|c| c.substitute_name != "Atorvastatin"));
    }
}

#[test]
fn test_peer_duplicates_collapse_to_cheapest() {
    let recommender = Recommender::build(formulary(), RecommenderConfig::default()).unwrap();
    let built = recommender.ensure_built().unwrap();

    let (zocor, _) = built.catalog().find("Zocor").unwrap();
    let neighbors = built.index().neighbors(zocor, 6).unwrap();
    let peers = peer_candidates(built.catalog(), &neighbors);

    let generic_x: Vec<_> = peers.iter().filter(|c| c.substitute_name == "GenericX").collect();
    assert_eq!(generic_x.len(), 1);
    assert_eq!(generic_x[0].cost, 6.0);
    assert_eq!(generic_x[0].source_drug_name, "Pravachol");
}

#[test]
fn test_peer_best_when_no_own_alternative() {
    let recommender = build(formulary());

    match recommender.recommend("Zocor").unwrap() {
        RecommendationResult::Found { best, others } => {
            // statin peers offer Atorvastatin at 10 and 5, GenericX at 8 and 6
            assert_eq!(best.substitute_name, "Atorvastatin");
            assert_eq!(best.cost, 5.0);
            assert_eq!(best.source_drug_name, "Livalo");
            assert!(others.iter().all(|c| c.substitute_name != best.substitute_name));
            for pair in others.windows(2) {
                assert!(pair[0].cost <= pair[1].cost);
            }
        }
        other => panic!("expected a recommendation, got {:?}", other),
    }
}

#[test]
fn test_case_insensitive_match() {
    let recommender = build(formulary());
    assert!(recommender.recommend("ADVIL").unwrap().is_found());
}

#[test]
fn test_rebuild_is_deterministic() {
    let names = ["Lipitor", "Zocor", "Advil", "Tylenol", "Aleve", "Nope"];

    let first = build(formulary()).recommend_all(&names).unwrap();
    let second = build(formulary()).recommend_all(&names).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_raw_tfidf_matches_svd_choices() {
    let names = ["Zocor", "Aleve"];
    let reduced = build(formulary()).recommend_all(&names).unwrap();
    let raw = Recommender::build(formulary(), config().without_svd())
        .unwrap()
        .recommend_all(&names)
        .unwrap();

    let best = |results: &[RecommendationResult]| -> Vec<Option<String>> {
        results
            .iter()
            .map(|r| r.best().map(|c| c.substitute_name.clone()))
            .collect()
    };
    assert_eq!(best(&reduced), best(&raw));
}

#[test]
fn test_neighbors_never_include_query() {
    let recommender = build(formulary());
    let built = recommender.ensure_built().unwrap();

    for i in 0..built.index().len() {
        let neighbors = built.index().neighbors(i, 6).unwrap();
        assert!(neighbors.iter().all(|n| n.index != i));
        assert!(neighbors.len() <= 6);
    }
}

#[test]
fn test_suggest_after_not_found() {
    let recommender = build(formulary());
    let suggestions = recommender.suggest("lipitr", 3).unwrap();
    assert_eq!(suggestions[0].name, "Lipitor");
}

#[test]
fn test_equally_close_peers_keep_row_order() {
    let mut records: Vec<DrugRecord> = [
        "Lipitor", "Zocor", "Crestor", "Pravachol", "Livalo",
        "Lescol", "Mevacor", "Altoprev", "Zypitamag", "Ezallor",
    ]
    .iter()
    .map(|name| statin(name))
    .collect();
    records.push(analgesic("Advil"));
    records.push(analgesic("Tylenol"));

    let recommender = Recommender::build(records, RecommenderConfig::default()).unwrap();
    let built = recommender.ensure_built().unwrap();
    assert!(built.index().space().is_reduced());

    let order: Vec<_> = built.index().neighbors(0, 4).unwrap().iter().map(|n| n.index).collect();
    assert_eq!(order, vec![1, 2, 3, 4]);
}
