//! Integration tests for docket-store
//!
//! Graph documents must survive a save/load cycle unchanged, and the evidence
//! store must list what was stored, per case, in insertion order.

use docket_domain::traits::EvidenceStore;
use docket_domain::{
    AttributeValue, DependencyGraph, DependencyNode, Entity, EntityType, EvidenceRecord,
    KnowledgeGraph, LegalElement, LegalElementType, LegalGraph, LegalRelation, LegalRelationType,
    Relationship, RelationshipType,
};
use docket_store::{from_json, load, save, to_json, SqliteEvidenceStore, StoreError};
use proptest::prelude::*;
use tempfile::TempDir;

fn sample_knowledge_graph() -> KnowledgeGraph {
    let mut kg = KnowledgeGraph::new();
    let claim = kg.add_entity(
        Entity::new(EntityType::Claim, "Retaliation")
            .with_source("narrative")
            .with_confidence(0.7)
            .with_attribute("claim_type", "retaliation")
            .with_attribute("keywords", vec!["complained".to_string(), "fired".to_string()])
            .with_attribute("amount", 1250.5)
            .with_attribute("verified", false),
    );
    let person = kg.add_entity(Entity::new(EntityType::Person, "Employee").with_source("narrative"));
    kg.add_relationship(Relationship::new(&person, &claim, RelationshipType::Involves).with_confidence(0.6));
    // Dangling endpoints are legal and must survive persistence
    kg.add_relationship(Relationship::new("missing_entity", &claim, RelationshipType::Supports));
    kg
}

fn sample_dependency_graph() -> DependencyGraph {
    let mut dg = DependencyGraph::new();
    let claim = dg.add_node(DependencyNode::claim("Retaliation", "retaliation"));
    let req = dg.add_requirement(&claim, DependencyNode::requirement("Protected activity", "protected_activity"), true);
    dg.add_requirement(
        &claim,
        DependencyNode::requirement("Causal connection", "causal_connection").with_satisfied(None),
        false,
    );
    dg.satisfy_requirement(&req, 0.85);
    dg.attach_evidence(&req, "ev_1");
    dg
}

fn sample_legal_graph() -> LegalGraph {
    let mut lg = LegalGraph::new();
    let statute = lg.add_element(
        LegalElement::new(LegalElementType::Statute, "Title VII")
            .with_citation("42 U.S.C. § 2000e-3(a)")
            .with_jurisdiction("federal")
            .with_claim_types(["retaliation"]),
    );
    let req = lg.add_element(
        LegalElement::new(LegalElementType::Requirement, "Protected activity")
            .with_claim_types(["retaliation"])
            .with_attribute("requirement_key", "protected_activity"),
    );
    lg.add_relation(LegalRelation::new(&statute, &req, LegalRelationType::Provides));
    lg
}

#[test]
fn test_knowledge_graph_save_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kg.json");
    let kg = sample_knowledge_graph();

    save(&kg, &path).unwrap();
    let restored: KnowledgeGraph = load(&path).unwrap();

    assert_eq!(restored, kg);
    let ids: Vec<_> = restored.entities().map(|e| e.id.clone()).collect();
    let original: Vec<_> = kg.entities().map(|e| e.id.clone()).collect();
    assert_eq!(ids, original, "insertion order must be preserved");
}

#[test]
fn test_dependency_graph_save_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dg.json");
    let dg = sample_dependency_graph();

    save(&dg, &path).unwrap();
    let restored: DependencyGraph = load(&path).unwrap();

    assert_eq!(restored, dg);
    assert_eq!(
        restored.get_claim_readiness().overall_readiness,
        dg.get_claim_readiness().overall_readiness
    );
}

#[test]
fn test_legal_graph_save_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lg.json");
    let lg = sample_legal_graph();

    save(&lg, &path).unwrap();
    let restored: LegalGraph = load(&path).unwrap();
    assert_eq!(restored, lg);
}

#[test]
fn test_document_shape() {
    let json = to_json(&sample_knowledge_graph()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["metadata"]["created_at"].is_u64());
    assert!(value["metadata"]["last_updated"].is_u64());
    assert_eq!(value["metadata"]["version"], "1.0");
    assert!(value["entities"].is_object());
    assert!(value["relationships"].is_object());

    let json = to_json(&sample_legal_graph()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["elements"].is_object());
    assert!(value["relations"].is_object());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result: Result<KnowledgeGraph, _> = load(dir.path().join("nope.json"));
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_malformed_json_is_surfaced() {
    let result: Result<KnowledgeGraph, _> = from_json("{ not json");
    assert!(matches!(result, Err(StoreError::Serialization(_))));
}

#[test]
fn test_evidence_store_roundtrip() {
    let mut store = SqliteEvidenceStore::new(":memory:").unwrap();

    let first = EvidenceRecord::new("case_a", "claim_1", "Termination letter")
        .with_type("letter")
        .with_confidence(0.9)
        .supporting(["adverse_action"]);
    let second = EvidenceRecord::new("case_a", "claim_1", "Email to HR about pay");
    let other_case = EvidenceRecord::new("case_b", "claim_9", "Unrelated");

    let handle = store.store_evidence(&first).unwrap();
    assert_eq!(handle.evidence_id, first.id);
    assert_eq!(handle.case_id, "case_a");
    store.store_evidence(&second).unwrap();
    store.store_evidence(&other_case).unwrap();

    let listed = store.list_evidence("case_a").unwrap();
    assert_eq!(listed, vec![first.clone(), second]);
    assert_eq!(store.count_for_case("case_b").unwrap(), 1);
    assert_eq!(store.get_evidence(&first.id).unwrap(), Some(first));
    assert!(store.list_evidence("case_z").unwrap().is_empty());
}

#[test]
fn test_evidence_store_rejects_duplicate_ids() {
    let mut store = SqliteEvidenceStore::new(":memory:").unwrap();
    let record = EvidenceRecord::new("case_a", "claim_1", "Pay stub");

    assert!(store.store_evidence(&record).is_ok());
    assert!(store.store_evidence(&record).is_err());
}

#[test]
fn test_evidence_store_persists_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    let record = EvidenceRecord::new("case_a", "claim_1", "Witness statement").with_type("witness");

    {
        let mut store = SqliteEvidenceStore::new(&path).unwrap();
        store.store_evidence(&record).unwrap();
    }

    let store = SqliteEvidenceStore::new(&path).unwrap();
    assert_eq!(store.list_evidence("case_a").unwrap(), vec![record]);
}

fn entity_type() -> impl Strategy<Value = EntityType> {
    proptest::sample::select(EntityType::ALL.to_vec())
}

fn relationship_type() -> impl Strategy<Value = RelationshipType> {
    proptest::sample::select(RelationshipType::ALL.to_vec())
}

fn attribute_value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,12}".prop_map(AttributeValue::Text),
        (-1.0e9f64..1.0e9).prop_map(AttributeValue::Number),
        any::<bool>().prop_map(AttributeValue::Flag),
        proptest::collection::vec("[a-z]{1,6}", 0..4).prop_map(AttributeValue::List),
    ]
}

prop_compose! {
    fn arb_knowledge_graph()(
        entities in proptest::collection::vec(
            (entity_type(), "[A-Za-z ]{1,16}", 0.0f64..=1.0,
             proptest::collection::btree_map("[a-z_]{1,8}", attribute_value(), 0..3)),
            0..8,
        ),
        edges in proptest::collection::vec((0usize..10, 0usize..10, relationship_type(), 0.0f64..=1.0), 0..8),
    ) -> KnowledgeGraph {
        let mut kg = KnowledgeGraph::new();
        let mut ids = Vec::new();
        for (entity_type, name, confidence, attributes) in entities {
            let mut entity = Entity::new(entity_type, name).with_confidence(confidence);
            entity.attributes = attributes;
            ids.push(kg.add_entity(entity));
        }
        for (s, t, rel_type, confidence) in edges {
            // Out-of-range indices produce dangling references on purpose
            let source = ids.get(s).cloned().unwrap_or_else(|| format!("ghost_{}", s));
            let target = ids.get(t).cloned().unwrap_or_else(|| format!("ghost_{}", t));
            kg.add_relationship(Relationship::new(source, target, rel_type).with_confidence(confidence));
        }
        kg
    }
}

proptest! {
    #[test]
    fn prop_knowledge_graph_json_roundtrip(kg in arb_knowledge_graph()) {
        let json = to_json(&kg).unwrap();
        let restored: KnowledgeGraph = from_json(&json).unwrap();
        prop_assert_eq!(restored, kg);
    }

    #[test]
    fn prop_dependency_graph_json_roundtrip(
        claims in proptest::collection::vec(("[A-Za-z]{1,10}", 0usize..4, any::<bool>(), 0.0f64..=1.0), 0..5)
    ) {
        let mut dg = DependencyGraph::new();
        for (name, requirements, satisfy_first, confidence) in claims {
            let claim = dg.add_node(DependencyNode::claim(name.clone(), "discrimination"));
            for i in 0..requirements {
                let req = dg.add_requirement(
                    &claim,
                    DependencyNode::requirement(format!("{} {}", name, i), format!("key_{}", i)),
                    i % 2 == 0,
                );
                if satisfy_first && i == 0 {
                    dg.satisfy_requirement(&req, confidence);
                }
            }
        }
        let restored: DependencyGraph = from_json(&to_json(&dg).unwrap()).unwrap();
        prop_assert_eq!(restored, dg);
    }
}
