use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Per-class sample count bounds applied before fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Classes with fewer rows are oversampled with replacement up to this count
    pub min_samples: usize,
    /// Classes with more rows are undersampled without replacement down to this count
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            min_samples: 30,
            max_samples: 100,
            seed: 42,
        }
    }
}

/// Chooses the row indices of a balanced, shuffled training set.
///
/// Classes are visited in code order. Every class that has at least one row
/// ends up with between `min_samples` and `max_samples` rows; classes without
/// rows stay empty.
pub fn balance(labels: &[usize], n_classes: usize, config: &BalanceConfig) -> Vec<usize> {
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
    let mut selected = Vec::new();

    for class in 0..n_classes {
        let rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            continue;
        }

        let count = rows.len();
        if count < config.min_samples {
            debug!("Class {}: oversampling {} -> {}", class, count, config.min_samples);
            selected.extend((0..config.min_samples).map(|_| rows[rng.gen_range(0..count)]));
        } else if count > config.max_samples {
            debug!("Class {}: undersampling {} -> {}", class, count, config.max_samples);
            selected.extend(rows.choose_multiple(&mut rng, config.max_samples).copied());
        } else {
            selected.extend(rows);
        }
    }

    selected.shuffle(&mut rng);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(indices: &[usize], labels: &[usize], class: usize) -> usize {
        indices.iter().filter(|&&i| labels[i] == class).count()
    }

    #[test]
    fn test_balance_bounds() {
        // class 0: 2 rows, class 1: 150 rows, class 2: 50 rows
        let mut labels = vec![0; 2];
        labels.extend(vec![1; 150]);
        labels.extend(vec![2; 50]);

        let indices = balance(&labels, 3, &BalanceConfig::default());
        assert_eq!(count(&indices, &labels, 0), 30);
        assert_eq!(count(&indices, &labels, 1), 100);
        assert_eq!(count(&indices, &labels, 2), 50);
        assert_eq!(indices.len(), 180);

        let mut undersampled: Vec<usize> =
            indices.iter().copied().filter(|&i| labels[i] == 1).collect();
        undersampled.sort_unstable();
        undersampled.dedup();
        assert_eq!(undersampled.len(), 100);
    }

    #[test]
    fn test_balance_is_deterministic() {
        let labels: Vec<usize> = (0..120).map(|i| i % 4).collect();
        let config = BalanceConfig::default();
        assert_eq!(balance(&labels, 4, &config), balance(&labels, 4, &config));
    }

    #[test]
    fn test_absent_class_stays_empty() {
        let labels = vec![0, 0, 2];
        let indices = balance(&labels, 3, &BalanceConfig::default());
        assert_eq!(count(&indices, &labels, 1), 0);
        assert_eq!(indices.len(), 60);
    }
}
