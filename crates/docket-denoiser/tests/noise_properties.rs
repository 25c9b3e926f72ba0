//! Property tests for the noise level and question selection

use docket_denoiser::{ComplaintDenoiser, DenoiserConfig, ExplorationConfig};
use docket_domain::{DependencyGraph, DependencyNode, Entity, EntityType, KnowledgeGraph};
use docket_extractor::ExtractorConfig;
use proptest::prelude::*;

/// `claims` claim entities with fixed confidence; the first `missing_dates` of
/// them lack a date (one extra gap each)
fn knowledge_graph(claims: usize, missing_dates: usize) -> KnowledgeGraph {
    let mut kg = KnowledgeGraph::new();
    for i in 0..claims {
        let mut claim = Entity::new(EntityType::Claim, format!("Claim {}", i))
            .with_confidence(0.5)
            .with_attribute("description", "Something happened");
        if i >= missing_dates {
            claim = claim.with_attribute("date", "2023-01-01");
        }
        kg.add_entity(claim);
    }
    kg
}

/// One claim with `total` requirements, the first `satisfied` of them satisfied
fn dependency_graph(total: usize, satisfied: usize) -> DependencyGraph {
    let mut dg = DependencyGraph::new();
    let claim = dg.add_node(DependencyNode::claim("Claim", "other"));
    for i in 0..total {
        let id = dg.add_requirement(&claim, DependencyNode::requirement(format!("R{}", i), format!("r{}", i)), true);
        if i < satisfied {
            dg.satisfy_requirement(&id, 0.5);
        }
    }
    dg
}

proptest! {
    #[test]
    fn prop_noise_in_unit_interval(claims in 0usize..6, missing in 0usize..6, total in 0usize..6, satisfied in 0usize..6) {
        let denoiser = ComplaintDenoiser::default();
        let noise = denoiser.calculate_noise_level(
            &knowledge_graph(claims, missing.min(claims)),
            &dependency_graph(total, satisfied.min(total)),
        );
        prop_assert!((0.0..=1.0).contains(&noise));
    }

    #[test]
    fn prop_noise_monotone_in_gaps(claims in 1usize..6, missing in 0usize..6) {
        let denoiser = ComplaintDenoiser::default();
        let dg = dependency_graph(3, 1);
        let fewer = missing.min(claims - 1);
        let low = denoiser.calculate_noise_level(&knowledge_graph(claims, fewer), &dg);
        let high = denoiser.calculate_noise_level(&knowledge_graph(claims, fewer + 1), &dg);
        prop_assert!(high >= low);
    }

    #[test]
    fn prop_noise_monotone_in_unsatisfied(total in 1usize..8, satisfied in 1usize..8) {
        let denoiser = ComplaintDenoiser::default();
        let kg = knowledge_graph(2, 1);
        let satisfied = satisfied.min(total);
        let more_unsatisfied = denoiser.calculate_noise_level(&kg, &dependency_graph(total, satisfied - 1));
        let fewer_unsatisfied = denoiser.calculate_noise_level(&kg, &dependency_graph(total, satisfied));
        prop_assert!(more_unsatisfied >= fewer_unsatisfied);
    }

    #[test]
    fn prop_at_most_k_questions(
        claims in 0usize..5,
        total in 0usize..6,
        k in 0usize..8,
        seed in any::<u64>(),
        epsilon in 0.0f64..=1.0,
    ) {
        let config = DenoiserConfig {
            exploration: ExplorationConfig { seed, epsilon, momentum_beta: 0.5 },
            ..DenoiserConfig::default()
        };
        let mut denoiser = ComplaintDenoiser::new(config, ExtractorConfig::default()).unwrap();
        let kg = knowledge_graph(claims, claims);
        let dg = dependency_graph(total, 0);

        let questions = denoiser.generate_questions(&kg, &dg, k);
        prop_assert!(questions.len() <= k);

        let mut ids: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), questions.len());
    }
}

#[test]
fn test_no_questions_once_everything_is_closed() {
    let mut denoiser = ComplaintDenoiser::default();
    let mut kg = KnowledgeGraph::new();
    let claim = kg.add_entity(
        Entity::new(EntityType::Claim, "Claim")
            .with_attribute("description", "Something happened")
            .with_attribute("date", "2023-01-01"),
    );
    let fact = kg.add_entity(Entity::new(EntityType::Fact, "It happened"));
    kg.add_relationship(docket_domain::Relationship::new(
        &fact,
        &claim,
        docket_domain::RelationshipType::Supports,
    ));
    let dg = dependency_graph(2, 2);

    assert!(kg.find_gaps().is_empty());
    assert!(denoiser.generate_questions(&kg, &dg, 5).is_empty());
    assert!(denoiser.is_exhausted());
}
