use linfa::prelude::*;
use linfa_svm::Svm;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::{argmax_lowest, check_training_set, SymptomClassifier};
use crate::classifier::error::ClassifierError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Penalty for margin violations
    pub c: f64,
    /// Gaussian kernel coefficient; `None` scales it by the feature count and variance
    pub gamma: Option<f64>,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self { c: 1.0, gamma: None }
    }
}

/// Multi-class support-vector machine with a Gaussian (RBF) kernel, one machine per class
/// (one-vs-rest).
///
/// Each machine is solved by `linfa-svm`. Only the training rows that end up as support
/// vectors are kept, together with every machine's signed dual coefficients and offset:
///
/// `f_c(x) = Σ dual_coef[c, j] · exp(-‖x - sv_j‖² / kernel_width) - rho[c]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSvm {
    kernel_width: f64,
    support_vectors: Array2<f64>,
    dual_coef: Array2<f64>,
    rho: Array1<f64>,
}

impl KernelSvm {
    pub fn fit(
        samples: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        config: &SvmConfig,
    ) -> Result<Self, ClassifierError> {
        check_training_set(samples, labels, n_classes)?;
        if !(config.c > 0.0) {
            return Err(ClassifierError::ModelError("SVM needs a positive C".into()));
        }
        let kernel_width = match config.gamma {
            Some(gamma) if gamma > 0.0 => 1.0 / gamma,
            Some(gamma) => {
                return Err(ClassifierError::ModelError(format!(
                    "SVM gamma must be positive, got {}",
                    gamma
                )))
            }
            None => scaled_kernel_width(samples),
        };

        let n_samples = samples.nrows();
        let mut machines = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let targets: Array1<bool> = labels.iter().map(|&label| label == class).collect();
            let positives = targets.iter().filter(|&&t| t).count();

            // One-sided problems have no boundary; the offset alone decides.
            let machine = if positives == 0 {
                (vec![0.0; n_samples], 1.0)
            } else if positives == n_samples {
                (vec![0.0; n_samples], -1.0)
            } else {
                let dataset = Dataset::new(samples.clone(), targets);
                let svm = Svm::<_, bool>::params()
                    .pos_neg_weights(config.c, config.c)
                    .gaussian_kernel(kernel_width)
                    .fit(&dataset)
                    .map_err(|e| {
                        ClassifierError::ModelError(format!(
                            "SVM training failed for class {}: {}",
                            class, e
                        ))
                    })?;
                if svm.alpha.len() != n_samples {
                    return Err(ClassifierError::ModelError(format!(
                        "SVM returned {} coefficients for {} samples",
                        svm.alpha.len(),
                        n_samples
                    )));
                }
                (svm.alpha, svm.rho)
            };
            machines.push(machine);
        }

        let support: Vec<usize> = (0..n_samples)
            .filter(|&i| machines.iter().any(|(alpha, _)| alpha[i] != 0.0))
            .collect();
        let mut dual_coef = Array2::zeros((n_classes, support.len()));
        let mut rho = Array1::zeros(n_classes);
        for (class, (alpha, offset)) in machines.iter().enumerate() {
            for (j, &i) in support.iter().enumerate() {
                dual_coef[[class, j]] = alpha[i];
            }
            rho[class] = *offset;
        }
        debug!(
            "SVM kept {} of {} samples as support vectors (kernel width {:.4})",
            support.len(),
            n_samples,
            kernel_width
        );

        Ok(Self {
            kernel_width,
            support_vectors: samples.select(Axis(0), &support),
            dual_coef,
            rho,
        })
    }

    pub fn decision_values(&self, features: ArrayView1<'_, f64>) -> Array1<f64> {
        let kernel: Array1<f64> = self
            .support_vectors
            .rows()
            .into_iter()
            .map(|sv| {
                let distance: f64 = sv
                    .iter()
                    .zip(features.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (-distance / self.kernel_width).exp()
            })
            .collect();
        self.dual_coef.dot(&kernel) - &self.rho
    }

    pub fn support_vector_count(&self) -> usize {
        self.support_vectors.nrows()
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        if self.dual_coef.ncols() != self.support_vectors.nrows()
            || self.rho.len() != self.dual_coef.nrows()
        {
            return Err(ClassifierError::ModelError(format!(
                "SVM has {} support vectors, {}x{} coefficients and {} offsets",
                self.support_vectors.nrows(),
                self.dual_coef.nrows(),
                self.dual_coef.ncols(),
                self.rho.len()
            )));
        }
        if !(self.kernel_width > 0.0) {
            return Err(ClassifierError::ModelError(
                "SVM kernel width must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// `n_features · Var(X)`, the reciprocal of the usual "scale" gamma.
fn scaled_kernel_width(samples: &Array2<f64>) -> f64 {
    let mean = samples.mean().unwrap_or(0.0);
    let variance = samples.mapv(|x| (x - mean).powi(2)).mean().unwrap_or(0.0);
    let width = samples.ncols() as f64 * variance;
    if width > 0.0 {
        width
    } else {
        samples.ncols() as f64
    }
}

impl SymptomClassifier for KernelSvm {
    fn name(&self) -> &str {
        "svm"
    }

    fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    fn n_classes(&self) -> usize {
        self.dual_coef.nrows()
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> usize {
        argmax_lowest(self.decision_values(features).iter().copied())
    }
}
