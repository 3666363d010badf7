//! Property tests for classification, comparison and extraction

use proptest::prelude::*;

use competitor_overlap::application::SimilarityEngine;
use competitor_overlap::domain::matching::classify;
use competitor_overlap::domain::{CategorySet, MatchCandidate, MatchMethod, MatchResult, Thresholds};
use competitor_overlap::infrastructure::extract_from_markup;

fn results(confidences: &[f64]) -> Vec<MatchResult> {
    confidences
        .iter()
        .enumerate()
        .map(|(i, &confidence)| {
            MatchResult::with_confidence(
                MatchCandidate {
                    client_label: format!("client {i}"),
                    competitor_label: format!("competitor {i}"),
                    raw_similarity: confidence,
                    method: MatchMethod::Fuzzy,
                },
                confidence,
            )
        })
        .collect()
}

fn label() -> impl Strategy<Value = String> {
    "[a-z]{3,8}( [a-z]{3,8})?"
}

proptest! {
    #[test]
    fn raising_a_confidence_never_lowers_the_status(
        confidences in prop::collection::vec(0.0f64..=1.0, 1..12),
        index in any::<prop::sample::Index>(),
        bump in 0.0f64..=1.0,
    ) {
        let thresholds = Thresholds::default();
        let before = classify(&results(&confidences), &thresholds);

        let mut raised = confidences.clone();
        let i = index.index(raised.len());
        raised[i] = (raised[i] + bump).min(1.0);
        let after = classify(&results(&raised), &thresholds);

        prop_assert!(after.status.rank() >= before.status.rank());
    }

    #[test]
    fn classify_is_deterministic(confidences in prop::collection::vec(0.0f64..=1.0, 0..12)) {
        let thresholds = Thresholds::default();
        let matches = results(&confidences);
        prop_assert_eq!(classify(&matches, &thresholds), classify(&matches, &thresholds));
    }

    #[test]
    fn compare_is_deterministic_and_bounded(
        client in prop::collection::vec(label(), 0..8),
        competitor in prop::collection::vec(label(), 0..8),
    ) {
        let engine = SimilarityEngine::default();
        let client = CategorySet::from_raw_labels(&client);
        let competitor = CategorySet::from_raw_labels(&competitor);

        let first = engine.compare(&client, &competitor);
        let second = engine.compare(&client, &competitor);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
        prop_assert!(first.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn identical_sets_classify_identically(labels in prop::collection::vec(label(), 1..8)) {
        let engine = SimilarityEngine::default();
        let set = CategorySet::from_raw_labels(&labels);
        let a = engine.classify(&engine.compare(&set, &set));
        let b = engine.classify(&engine.compare(&set, &set));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn extraction_is_idempotent(labels in prop::collection::vec(label(), 0..10)) {
        let links: String = labels
            .iter()
            .map(|l| format!(r#"<a href="/category/{}">{}</a>"#, l.replace(' ', "-"), l))
            .collect();
        let markup = format!(r#"<html><body><nav class="main-nav">{links}</nav></body></html>"#);

        let first = extract_from_markup(&markup, 20);
        let second = extract_from_markup(&markup, 20);
        prop_assert!(first.categories.same_labels(&second.categories));
        prop_assert_eq!(first.source, second.source);
    }
}
