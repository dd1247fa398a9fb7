use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Fraction of predictions equal to the truth; `None` for an empty set.
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> Option<f64> {
    if truth.is_empty() || predicted.len() != truth.len() {
        return None;
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Some(correct as f64 / truth.len() as f64)
}

/// Rows are true classes, columns predicted classes.
pub fn confusion_matrix(predicted: &[usize], truth: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0; n_classes]; n_classes];
    for (&p, &t) in predicted.iter().zip(truth) {
        if p < n_classes && t < n_classes {
            matrix[t][p] += 1;
        }
    }
    matrix
}

/// Shuffles `0..n` and splits off the last `test_fraction` as the hold-out part.
///
/// The test part gets `ceil(n * test_fraction)` rows but always leaves at
/// least one training row.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut ChaCha20Rng::seed_from_u64(seed));

    let n_test = ((n as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n.saturating_sub(1));
    let test = indices.split_off(n - n_test);
    (indices, test)
}

/// Contiguous k-fold partition of `0..n`; the first `n % k` folds get one extra row.
pub fn k_fold(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    if k < 2 || n < k {
        return Vec::new();
    }
    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let test: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, test));
        start = end;
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 2, 3, 4], &[1, 2, 0, 4]), Some(0.75));
        assert_eq!(accuracy(&[], &[]), None);
    }

    #[test]
    fn test_confusion_matrix() {
        let matrix = confusion_matrix(&[0, 1, 1], &[0, 0, 1], 2);
        assert_eq!(matrix, vec![vec![1, 1], vec![0, 1]]);
    }

    #[test]
    fn test_train_test_split() {
        let (train, test) = train_test_split(10, 0.2, 24);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert_eq!(train_test_split(10, 0.2, 24), (train, test));
    }

    #[test]
    fn test_split_keeps_a_training_row() {
        let (train, test) = train_test_split(1, 0.5, 24);
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn test_k_fold() {
        let folds = k_fold(7, 3);
        assert_eq!(folds.len(), 3);
        let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 7);
            assert!(test.iter().all(|i| !train.contains(i)));
        }
        assert!(k_fold(3, 1).is_empty());
        assert!(k_fold(2, 5).is_empty());
    }
}
