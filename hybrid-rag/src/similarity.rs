//! Vector math used to compare embeddings.

use crate::error::{RagError, Result};

/// Compute the cosine similarity between two vectors.
///
/// Returns `dot(a, b) / (‖a‖ · ‖b‖)`, or exactly `0.0` when either vector
/// has zero magnitude.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] if the vectors differ in length
/// or are empty. Vectors are never truncated to a common length.
///
/// # Example
///
/// ```rust
/// use hybrid_rag::cosine_similarity;
///
/// let score = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0])?;
/// assert!((score - 1.0).abs() < 1e-6);
/// # Ok::<(), hybrid_rag::RagError>(())
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() || a.is_empty() {
        return Err(RagError::DimensionMismatch { left: a.len(), right: b.len() });
    }

    // Accumulate in f64: squaring extreme f32 magnitudes would underflow or overflow.
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)) as f32)
}
