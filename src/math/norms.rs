//! Norm and distance computations for flat updates.
//!
//! Provides L2 (Euclidean) norm functions plus the pairwise distance
//! contract used by the aggregation strategies and attacks. Distances over
//! two updates require equal lengths and fail with
//! [`AegisError::DimensionMismatch`] otherwise.

use crate::error::AegisError;

/// Compute the L2 (Euclidean) norm of an f32 slice.
pub fn l2_norm(v: &[f32]) -> f32 {
    l2_norm_sq(v).sqrt()
}

/// Compute the squared L2 norm of an f32 slice (avoids sqrt).
pub fn l2_norm_sq(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum()
}

/// Squared Euclidean distance between two equal-length updates.
pub fn squared_distance(a: &[f32], b: &[f32]) -> Result<f32, AegisError> {
    if a.len() != b.len() {
        return Err(AegisError::DimensionMismatch);
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum())
}

/// Euclidean distance between two equal-length updates.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32, AegisError> {
    squared_distance(a, b).map(f32::sqrt)
}

/// Cosine distance (1 - cosine similarity) between two equal-length updates.
///
/// Zero-norm inputs have no direction: two zero vectors are at distance 0.0,
/// a zero vector against a non-zero one is at distance 1.0.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32, AegisError> {
    if a.len() != b.len() {
        return Err(AegisError::DimensionMismatch);
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 && norm_b == 0.0 {
        return Ok(0.0);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(1.0);
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    Ok(1.0 - dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_norm_3_4_5() {
        let v = vec![3.0f32, 4.0];
        assert!((l2_norm(&v) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_norm_sq_3_4() {
        let v = vec![3.0f32, 4.0];
        assert!((l2_norm_sq(&v) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_norm_empty() {
        assert_eq!(l2_norm(&[]), 0.0);
        assert_eq!(l2_norm_sq(&[]), 0.0);
    }

    #[test]
    fn test_squared_distance_simple() {
        let a = vec![0.0f32, 0.0];
        let b = vec![3.0f32, 4.0];
        assert!((squared_distance(&a, &b).unwrap() - 25.0).abs() < 1e-6);
        assert!((euclidean_distance(&a, &b).unwrap() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let a = vec![1.0f32];
        let b = vec![1.0f32, 2.0];
        assert!(matches!(
            squared_distance(&a, &b),
            Err(AegisError::DimensionMismatch)
        ));
        assert!(matches!(
            cosine_distance(&a, &b),
            Err(AegisError::DimensionMismatch)
        ));
    }

    #[test]
    fn test_cosine_distance_parallel_and_opposite() {
        let a = vec![1.0f32, 0.0];
        let b = vec![2.0f32, 0.0];
        let c = vec![-1.0f32, 0.0];
        assert!(cosine_distance(&a, &b).unwrap().abs() < 1e-6);
        assert!((cosine_distance(&a, &c).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_zero_vectors() {
        let zero = vec![0.0f32, 0.0];
        let a = vec![1.0f32, 0.0];
        assert_eq!(cosine_distance(&zero, &zero).unwrap(), 0.0);
        assert_eq!(cosine_distance(&zero, &a).unwrap(), 1.0);
    }
}
