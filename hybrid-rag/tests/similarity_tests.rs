//! Property tests for cosine similarity.

use hybrid_rag::{RagError, cosine_similarity};
use proptest::prelude::*;

/// Generate a pair of equal-length vectors.
fn arb_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (1usize..32).prop_flat_map(|dim| {
        (
            proptest::collection::vec(-10.0f32..10.0f32, dim),
            proptest::collection::vec(-10.0f32..10.0f32, dim),
        )
    })
}

/// Generate a vector with a magnitude comfortably above zero.
fn arb_non_zero(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-10.0f32..10.0f32, dim)
        .prop_filter("non-zero vector", |v| v.iter().map(|x| x * x).sum::<f32>().sqrt() > 1e-3)
}

mod prop_cosine_similarity {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn is_symmetric((a, b) in arb_pair()) {
            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();
            prop_assert!((ab - ba).abs() < 1e-6, "{ab} != {ba}");
        }

        #[test]
        fn vector_is_fully_similar_to_itself(a in (1usize..32).prop_flat_map(arb_non_zero)) {
            let score = cosine_similarity(&a, &a).unwrap();
            prop_assert!((score - 1.0).abs() < 1e-4, "self-similarity was {score}");
        }

        #[test]
        fn zero_vector_scores_exactly_zero(a in (1usize..32).prop_flat_map(|dim| {
            proptest::collection::vec(-10.0f32..10.0f32, dim)
        })) {
            let zero = vec![0.0; a.len()];
            prop_assert_eq!(cosine_similarity(&a, &zero).unwrap(), 0.0);
            prop_assert_eq!(cosine_similarity(&zero, &a).unwrap(), 0.0);
        }

        #[test]
        fn stays_within_unit_range((a, b) in arb_pair()) {
            let score = cosine_similarity(&a, &b).unwrap();
            prop_assert!((-1.0001..=1.0001).contains(&score), "score {score} out of range");
        }
    }
}

#[test]
fn orthogonal_vectors_score_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
}

#[test]
fn opposite_vectors_score_minus_one() {
    let score = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
    assert!((score + 1.0).abs() < 1e-6);
}

#[test]
fn unequal_lengths_are_rejected() {
    let err = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { left: 3, right: 2 }));
}

#[test]
fn empty_vectors_are_rejected() {
    let err = cosine_similarity(&[], &[]).unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { left: 0, right: 0 }));
}

#[test]
fn tiny_magnitudes_do_not_underflow() {
    let a = [1e-25f32, 2e-25];
    let score = cosine_similarity(&a, &a).unwrap();
    assert!((score - 1.0).abs() < 1e-6, "self-similarity was {score}");
}

#[test]
fn huge_magnitudes_do_not_overflow() {
    let a = [1e25f32, 2e25];
    let score = cosine_similarity(&a, &a).unwrap();
    assert!((score - 1.0).abs() < 1e-6, "self-similarity was {score}");

    let b = [2e25f32, -1e25];
    assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
}
