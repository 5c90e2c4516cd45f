// crates/gateflag-core/src/hashing.rs
// ============================================================================
// Module: Gateflag Percentage Hashing
// Description: Deterministic actor-to-percentage scoring for the
//              percentage-of-actors gate.
// Purpose: Give every (feature, actor) pair a stable score in `[0, 100)` so
//          that enabling a feature for N% of actors is reproducible across
//          processes and restarts.
// Dependencies: crc32fast
// ============================================================================

/// The CRC32 (IEEE) modulus used to normalize a checksum into `[0, 1)`.
const CRC32_MAX: f64 = 4_294_967_295.0;

/// Computes the deterministic percentage score for an actor against a
/// feature, in the half-open range `[0.0, 100.0)`.
///
/// The score is `CRC32(feature_name ++ actor_id) / (2^32 - 1) * 100`. Two
/// processes evaluating the same `(feature_name, actor_id)` pair always agree,
/// and the distribution of scores across many actor ids is uniform, which is
/// what lets a percentage-of-actors threshold admit (approximately) that
/// fraction of actors.
#[must_use]
pub fn actor_score(feature_name: &str, actor_id: &str) -> f64 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(feature_name.as_bytes());
    hasher.update(actor_id.as_bytes());
    let checksum = hasher.finalize();
    f64::from(checksum) / CRC32_MAX * 100.0
}

/// Returns whether an actor falls within a percentage-of-actors threshold.
///
/// An actor is within the threshold when its [`actor_score`] is strictly less
/// than `threshold`, so a `0` threshold admits no actors and a `100`
/// threshold admits every actor.
#[must_use]
pub fn within_percentage(feature_name: &str, actor_id: &str, threshold: f64) -> bool {
    actor_score(feature_name, actor_id) < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_deterministic() {
        let a = actor_score("search_v2", "user-42");
        let b = actor_score("search_v2", "user-42");
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn score_differs_by_feature() {
        let a = actor_score("search_v2", "user-42");
        let b = actor_score("checkout_v3", "user-42");
        assert!((a - b).abs() > f64::EPSILON);
    }

    #[test]
    fn zero_threshold_admits_nobody() {
        assert!(!within_percentage("f", "1", 0.0));
        assert!(!within_percentage("f", "anything-else", 0.0));
    }

    #[test]
    fn hundred_threshold_admits_everybody() {
        for id in ["1", "2", "the-long-tail-actor-id", ""] {
            assert!(within_percentage("f", id, 100.0));
        }
    }

    #[test]
    fn score_is_bounded() {
        for id in ["a", "b", "c", "long-actor-identifier-string"] {
            let score = actor_score("f", id);
            assert!((0.0..100.0).contains(&score), "score {score} out of range");
        }
    }

    proptest::proptest! {
        #[test]
        fn score_is_always_in_range(feature in ".*", actor in ".*") {
            let score = actor_score(&feature, &actor);
            proptest::prop_assert!((0.0..100.0).contains(&score));
        }

        #[test]
        fn score_is_deterministic_for_arbitrary_inputs(feature in ".*", actor in ".*") {
            let a = actor_score(&feature, &actor);
            let b = actor_score(&feature, &actor);
            proptest::prop_assert!((a - b).abs() < f64::EPSILON);
        }
    }
}
