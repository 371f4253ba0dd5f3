//! Heuristic answer confidence

use crate::models::RetrievalResult;

/// Phrases marking an answer that admits missing information
const UNCERTAINTY_PHRASES: [&str; 5] = [
    "i don't have",
    "i don't know",
    "not enough information",
    "cannot find",
    "unclear",
];

/// Sources considered when averaging distance
const CONFIDENCE_TOP_N: usize = 3;

/// Score an answer in `[0, 1]` from retrieval distances and its wording.
///
/// The mean distance of the best three sources maps to `1 - mean / 2`;
/// an answer containing an uncertainty phrase has its score halved. The
/// result is rounded to two decimals.
pub fn estimate_confidence(sources: &[RetrievalResult], answer: &str) -> f32 {
    if sources.is_empty() {
        return 0.0;
    }

    let top = &sources[..sources.len().min(CONFIDENCE_TOP_N)];
    let avg_distance = top.iter().map(|s| s.distance).sum::<f32>() / top.len() as f32;
    let mut confidence = (1.0 - avg_distance / 2.0).clamp(0.0, 1.0);

    let lowered = answer.to_lowercase();
    if UNCERTAINTY_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
    {
        confidence *= 0.5;
    }

    let rounded = (confidence * 100.0).round() / 100.0;
    if rounded.is_nan() {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::Metadata;

    fn sources(distances: &[f32]) -> Vec<RetrievalResult> {
        distances
            .iter()
            .map(|&distance| RetrievalResult {
                text: "chunk".to_string(),
                metadata: Metadata::new(),
                distance,
            })
            .collect()
    }

    #[test]
    fn test_no_sources_is_zero() {
        assert_eq!(estimate_confidence(&[], "Ashish works at Acme."), 0.0);
    }

    #[test]
    fn test_only_top_three_count() {
        // mean(0.2, 0.4, 0.6) = 0.4 -> 0.8; the fourth source is ignored
        let score = estimate_confidence(&sources(&[0.2, 0.4, 0.6, 1.9]), "He knows Rust.");
        assert!((score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_uncertainty_halves() {
        let s = sources(&[0.2, 0.4, 0.6]);
        let score = estimate_confidence(&s, "Sorry, I DON'T KNOW where he studied.");
        assert!((score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_far_sources_clamp_to_zero() {
        assert_eq!(estimate_confidence(&sources(&[2.5, 3.0]), "answer"), 0.0);
    }

    proptest! {
        #[test]
        fn prop_confidence_in_unit_range(
            distances in proptest::collection::vec(0.0f32..4.0, 0..8),
            answer in ".{0,60}",
        ) {
            let score = estimate_confidence(&sources(&distances), &answer);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_uncertain_never_exceeds_certain(
            distances in proptest::collection::vec(0.0f32..2.0, 1..6),
        ) {
            let s = sources(&distances);
            let certain = estimate_confidence(&s, "He has five years of experience.");
            let uncertain = estimate_confidence(&s, "It is unclear.");
            prop_assert!(uncertain <= certain);
        }

        #[test]
        fn prop_uncertain_is_half_of_unrounded_certain(
            distances in proptest::collection::vec(0.0f32..2.0, 1..6),
            phrase in proptest::sample::select(UNCERTAINTY_PHRASES.to_vec()),
            prefix in "[0-9 ]{0,20}",
            shout in any::<bool>(),
        ) {
            let s = sources(&distances);
            let top = &distances[..distances.len().min(CONFIDENCE_TOP_N)];
            let mean = top.iter().sum::<f32>() / top.len() as f32;
            let unrounded = (1.0 - mean / 2.0).clamp(0.0, 1.0);
            let expected = ((unrounded / 2.0) * 100.0).round() / 100.0;

            let phrase = if shout { phrase.to_uppercase() } else { phrase.to_string() };
            let answer = format!("{prefix}{phrase} about that.");
            let uncertain = estimate_confidence(&s, &answer);
            prop_assert!(
                (uncertain - expected).abs() <= 0.01,
                "got {uncertain}, expected {expected}"
            );
        }
    }
}
