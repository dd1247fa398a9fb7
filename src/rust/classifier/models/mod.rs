//! The three classifier families of the ensemble.
//!
//! Each family is fitted on a dense feature matrix (one row per sample, one
//! column per vocabulary symptom) and integer label codes, and predicts one
//! label code per feature vector. The bundle and the voting resolver only ever
//! see them through [`SymptomClassifier`].

use std::fmt;

use ndarray::{Array2, ArrayView1};

use super::error::ClassifierError;

mod naive_bayes;
mod random_forest;
mod svm;

pub use naive_bayes::{GaussianNaiveBayes, NaiveBayesConfig};
pub use random_forest::{RandomForest, RandomForestConfig};
pub use svm::{KernelSvm, SvmConfig};

/// Capability shared by every classifier in the ensemble.
///
/// Implementations are read-only after fitting, so one instance can serve
/// concurrent predictions without locking.
pub trait SymptomClassifier: fmt::Debug + Send + Sync {
    /// Short, stable name used in logs and reports.
    fn name(&self) -> &str;

    /// Width of the feature vectors the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Number of label codes the classifier can emit.
    fn n_classes(&self) -> usize;

    /// Predicts one label code.
    ///
    /// Callers must pass a vector of exactly [`n_features`](Self::n_features)
    /// entries; the bundle checks this before any classifier is invoked.
    fn predict(&self, features: ArrayView1<'_, f64>) -> usize;

    fn predict_batch(&self, samples: &Array2<f64>) -> Vec<usize> {
        samples.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

/// Validates a training set before any family starts fitting.
pub(crate) fn check_training_set(
    samples: &Array2<f64>,
    labels: &[usize],
    n_classes: usize,
) -> Result<(), ClassifierError> {
    if samples.nrows() == 0 || samples.ncols() == 0 {
        return Err(ClassifierError::ModelError("Training set is empty".into()));
    }
    if samples.nrows() != labels.len() {
        return Err(ClassifierError::ModelError(format!(
            "Training set has {} rows but {} labels",
            samples.nrows(),
            labels.len()
        )));
    }
    if let Some(&label) = labels.iter().find(|&&label| label >= n_classes) {
        return Err(ClassifierError::DecodeOutOfRange {
            code: label,
            classes: n_classes,
        });
    }
    Ok(())
}

/// Index of the largest score, preferring the lowest index on ties.
pub(crate) fn argmax_lowest(scores: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, score) in scores.into_iter().enumerate() {
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ndarray::{array, Array2};

    /// Three well separated classes over four binary symptoms.
    pub fn separable() -> (Array2<f64>, Vec<usize>) {
        let samples = array![
            [1.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        (samples, vec![0, 0, 0, 1, 1, 1, 2, 2, 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_prefers_lowest_index() {
        assert_eq!(argmax_lowest([0.5, 0.9, 0.9]), 1);
        assert_eq!(argmax_lowest([1.0, 1.0]), 0);
        assert_eq!(argmax_lowest([f64::NEG_INFINITY, -1.0]), 1);
    }

    #[test]
    fn test_check_training_set() {
        let (samples, labels) = fixtures::separable();
        assert!(check_training_set(&samples, &labels, 3).is_ok());
        assert!(check_training_set(&samples, &labels[1..], 3).is_err());
        assert!(check_training_set(&samples, &labels, 2).is_err());
    }
}
