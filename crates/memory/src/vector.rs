//! Vector distance utilities.

/// Squared Euclidean distance between two equal-length vectors.
///
/// Accumulates in f64 to keep rankings stable for high-dimensional
/// embeddings. Mismatched lengths compare only the common prefix; callers
/// check dimensions first.
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum::<f64>() as f32
}

/// Indices of the `k` smallest values, ascending by value.
///
/// Ties keep insertion order so results are deterministic.
pub fn k_smallest(values: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(k);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_identical_is_zero() {
        let v = vec![0.5, -1.0, 2.0];
        assert!(l2_squared(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn l2_known_value() {
        assert!((l2_squared(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn k_smallest_orders_and_truncates() {
        let values = [4.0, 1.0, 3.0, 1.0, 0.5];
        assert_eq!(k_smallest(&values, 3), vec![4, 1, 3]);
        assert_eq!(k_smallest(&values, 10).len(), 5);
        assert!(k_smallest(&[], 3).is_empty());
    }
}
