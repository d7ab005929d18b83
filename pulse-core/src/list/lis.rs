//! Longest strictly increasing subsequence.

/// Indices of a longest strictly increasing subsequence of `values`.
///
/// Patience-sorting construction: `tails[k]` holds the index of the
/// smallest value that ends an increasing run of length `k + 1`, and
/// `prev[i]` links each element to its predecessor in the run it extends.
/// Each value binary-searches the first tail that is not smaller than it,
/// so equal values replace a tail instead of extending it. The chain is
/// rebuilt backwards from the last tail.
///
/// Runs in O(n log n) time and O(n) space. The returned indices are in
/// ascending order.
///
/// ```
/// use pulse_core::compute_lis;
///
/// assert_eq!(compute_lis::<usize>(&[]), Vec::<usize>::new());
/// assert_eq!(compute_lis(&[2, 0, 1, 3]), vec![1, 2, 3]);
/// assert_eq!(compute_lis(&[4, 4, 4]).len(), 1);
/// ```
pub fn compute_lis<T: Ord>(values: &[T]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::with_capacity(values.len());
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];

    for (i, value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < *value);
        if slot > 0 {
            prev[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = prev[i];
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn is_strictly_increasing(values: &[i32], indices: &[usize]) -> bool {
        indices.windows(2).all(|w| w[0] < w[1] && values[w[0]] < values[w[1]])
    }

    /// O(n²) reference for the optimal length.
    fn reference_len(values: &[i32]) -> usize {
        let mut best = vec![1usize; values.len()];
        for i in 0..values.len() {
            for j in 0..i {
                if values[j] < values[i] {
                    best[i] = best[i].max(best[j] + 1);
                }
            }
        }
        best.into_iter().max().unwrap_or(0)
    }

    #[test]
    fn empty_and_single() {
        assert!(compute_lis::<i32>(&[]).is_empty());
        assert_eq!(compute_lis(&[42]), vec![0]);
    }

    #[test]
    fn sorted_input_keeps_everything() {
        let values: Vec<usize> = (0..50).collect();
        assert_eq!(compute_lis(&values), values);
    }

    #[test]
    fn reverse_sorted_input_keeps_one() {
        let values: Vec<usize> = (0..50).rev().collect();
        assert_eq!(compute_lis(&values).len(), 1);
    }

    #[test]
    fn repeated_values_are_not_increasing() {
        assert_eq!(compute_lis(&[7, 7, 7, 7]).len(), 1);
        assert_eq!(compute_lis(&[1, 2, 2, 3]).len(), 3);
    }

    #[test]
    fn known_sequence() {
        let values = [3, 1, 8, 2, 5];
        let lis = compute_lis(&values);
        assert_eq!(lis, vec![1, 3, 4]);
    }

    #[test]
    fn single_move_leaves_rest_stable() {
        // Moving the last entry to the front.
        let values = [4, 0, 1, 2, 3];
        assert_eq!(compute_lis(&values), vec![1, 2, 3, 4]);
    }

    #[test]
    fn large_input() {
        let values: Vec<usize> = (0..1000).map(|i| (i * 7919) % 1000).collect();
        let lis = compute_lis(&values);
        assert!(lis.windows(2).all(|w| values[w[0]] < values[w[1]]));
    }

    proptest! {
        #[test]
        fn output_is_an_optimal_increasing_subsequence(values in prop::collection::vec(-50i32..50, 0..120)) {
            let lis = compute_lis(&values);
            prop_assert!(is_strictly_increasing(&values, &lis));
            prop_assert_eq!(lis.len(), reference_len(&values));
        }
    }
}
