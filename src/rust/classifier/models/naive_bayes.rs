use linfa::prelude::*;
use linfa_bayes::{GaussianNb, NaiveBayes};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::{argmax_lowest, check_training_set, SymptomClassifier};
use crate::classifier::error::ClassifierError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesConfig {
    /// Fraction of the largest feature variance added to every class variance
    pub var_smoothing: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self { var_smoothing: 1e-9 }
    }
}

/// Gaussian Naive-Bayes: one independent normal distribution per (class, feature).
///
/// Fitting is delegated to `linfa-bayes`; the wrapper records the label range so
/// that classes missing from the training rows score negative infinity, and so
/// that ties resolve to the lowest label code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    n_features: usize,
    n_classes: usize,
    model: GaussianNb<f64, usize>,
}

impl GaussianNaiveBayes {
    pub fn fit(
        samples: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        config: &NaiveBayesConfig,
    ) -> Result<Self, ClassifierError> {
        check_training_set(samples, labels, n_classes)?;

        let dataset = Dataset::new(samples.clone(), Array1::from(labels.to_vec()));
        let model = GaussianNb::<f64, usize>::params()
            .var_smoothing(config.var_smoothing)
            .fit(&dataset)
            .map_err(|e| {
                ClassifierError::ModelError(format!("Naive-Bayes training failed: {}", e))
            })?;

        Ok(Self {
            n_features: samples.ncols(),
            n_classes,
            model,
        })
    }

    /// Log of prior times likelihood for every label code.
    pub fn class_scores(&self, features: ArrayView1<'_, f64>) -> Vec<f64> {
        let scores = self.model.joint_log_likelihood(features.insert_axis(Axis(0)));
        (0..self.n_classes)
            .map(|class| scores.get(&class).map_or(f64::NEG_INFINITY, |s| s[0]))
            .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        if self.n_features == 0 || self.n_classes == 0 {
            return Err(ClassifierError::ModelError(
                "Naive-Bayes model has no features or no classes".into(),
            ));
        }
        Ok(())
    }
}

impl SymptomClassifier for GaussianNaiveBayes {
    fn name(&self) -> &str {
        "naive_bayes"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> usize {
        argmax_lowest(self.class_scores(features))
    }
}
