//! Offline training: turns a labeled symptom table into a bundle's artifacts.
//!
//! The pipeline reads the table, fits the label encoder and the
//! disease–symptom map on the raw rows, balances the classes, reports
//! cross-validated and hold-out accuracy for every classifier family and the
//! majority-vote ensemble, and finally fits the three families on the whole
//! balanced set.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::artifact_manager::{ArtifactError, ArtifactManager, BundleArtifacts};
use crate::classifier::models::{
    GaussianNaiveBayes, KernelSvm, NaiveBayesConfig, RandomForest, RandomForestConfig, SvmConfig,
};
use crate::classifier::{
    majority_vote, ClassifierError, DiseaseSymptomMap, LabelEncoder, SymptomClassifier,
    SymptomVocabulary,
};

mod balance;
mod dataset;
pub mod evaluation;

pub use balance::{balance, BalanceConfig};
pub use dataset::Dataset;

pub const REPORT_FILE: &str = "training_report.json";

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Dataset error: {0}")]
    Dataset(String),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Header of the column holding the disease name
    pub label_column: String,
    pub balance: BalanceConfig,
    /// Share of the balanced set held out for testing
    pub test_fraction: f64,
    pub split_seed: u64,
    /// Upper bound on cross-validation folds
    pub cv_folds: usize,
    pub svm: SvmConfig,
    pub naive_bayes: NaiveBayesConfig,
    pub random_forest: RandomForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            label_column: "prognosis".to_string(),
            balance: BalanceConfig::default(),
            test_fraction: 0.2,
            split_seed: 24,
            cv_folds: 5,
            svm: SvmConfig::default(),
            naive_bayes: NaiveBayesConfig::default(),
            random_forest: RandomForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Reseeds every random step from one value.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.balance.seed = seed;
        self.split_seed = seed;
        self.random_forest.seed = seed;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {
    pub classifier: String,
    pub cv_scores: Vec<f64>,
    pub cv_mean: Option<f64>,
    pub train_accuracy: Option<f64>,
    pub test_accuracy: Option<f64>,
}

/// Summary of one training run, written next to the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: String,
    pub raw_samples: usize,
    pub balanced_samples: usize,
    pub vocabulary_size: usize,
    pub num_classes: usize,
    pub raw_distribution: BTreeMap<String, usize>,
    pub balanced_distribution: BTreeMap<String, usize>,
    pub models: Vec<ModelScore>,
    /// Majority-vote accuracy on the hold-out split
    pub ensemble_test_accuracy: Option<f64>,
    pub ensemble_confusion: Vec<Vec<usize>>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: BundleArtifacts,
    pub report: TrainingReport,
}

struct Ensemble {
    svm: KernelSvm,
    naive_bayes: GaussianNaiveBayes,
    random_forest: RandomForest,
}

impl Ensemble {
    fn fit(
        samples: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        config: &TrainingConfig,
    ) -> Result<Self, ClassifierError> {
        Ok(Self {
            svm: KernelSvm::fit(samples, labels, n_classes, &config.svm)?,
            naive_bayes: GaussianNaiveBayes::fit(samples, labels, n_classes, &config.naive_bayes)?,
            random_forest: RandomForest::fit(samples, labels, n_classes, &config.random_forest)?,
        })
    }

    fn members(&self) -> [&dyn SymptomClassifier; 3] {
        [&self.svm, &self.naive_bayes, &self.random_forest]
    }

    fn predict_batch(&self, samples: &Array2<f64>) -> Vec<usize> {
        let per_model: Vec<Vec<usize>> = self
            .members()
            .iter()
            .map(|m| m.predict_batch(samples))
            .collect();
        (0..samples.nrows())
            .map(|row| {
                let codes: Vec<usize> = per_model.iter().map(|codes| codes[row]).collect();
                majority_vote(&codes).unwrap_or_default()
            })
            .collect()
    }
}

fn select(samples: &Array2<f64>, labels: &[usize], rows: &[usize]) -> (Array2<f64>, Vec<usize>) {
    (samples.select(Axis(0), rows), rows.iter().map(|&i| labels[i]).collect())
}

fn distribution(labels: &[usize], encoder: &LabelEncoder) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for &code in labels {
        if let Ok(name) = encoder.decode(code) {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Fits a full set of artifacts on `dataset` and scores the classifiers.
pub fn train(
    dataset: &Dataset,
    config: &TrainingConfig,
    run_id: &str,
) -> Result<TrainingOutcome, TrainingError> {
    if dataset.is_empty() {
        return Err(TrainingError::Dataset("Training data has no rows".into()));
    }

    let vocabulary = SymptomVocabulary::new(dataset.symptoms.clone())?;
    let encoder = LabelEncoder::fit(&dataset.labels)?;
    let n_classes = encoder.len();
    let labels: Vec<usize> = dataset
        .labels
        .iter()
        .map(|label| encoder.encode(label))
        .collect::<Result<_, _>>()?;

    let mut symptom_map = DiseaseSymptomMap::new();
    for (row, label) in dataset.samples.rows().into_iter().zip(&dataset.labels) {
        symptom_map.record(label, dataset.present_symptoms(row));
    }
    info!(
        "Fitted encoder with {} diseases and symptom map over {} symptoms",
        n_classes,
        vocabulary.len()
    );

    let raw_distribution = distribution(&labels, &encoder);
    let balanced_rows = balance(&labels, n_classes, &config.balance);
    let (samples, labels_balanced) = select(&dataset.samples, &labels, &balanced_rows);
    let balanced_distribution = distribution(&labels_balanced, &encoder);
    info!(
        "Balanced {} raw records into {} training records",
        dataset.len(),
        balanced_rows.len()
    );

    let folds = evaluation::k_fold(samples.nrows(), config.cv_folds.min(samples.nrows()));
    let mut cv_scores: [Vec<f64>; 3] = Default::default();
    for (fold, (train_rows, test_rows)) in folds.iter().enumerate() {
        let (x_train, y_train) = select(&samples, &labels_balanced, train_rows);
        let (x_test, y_test) = select(&samples, &labels_balanced, test_rows);
        let ensemble = Ensemble::fit(&x_train, &y_train, n_classes, config)?;
        for (scores, member) in cv_scores.iter_mut().zip(ensemble.members()) {
            if let Some(score) = evaluation::accuracy(&member.predict_batch(&x_test), &y_test) {
                scores.push(score);
            }
        }
        debug!("Cross-validation fold {} done", fold + 1);
    }

    let (train_rows, test_rows) =
        evaluation::train_test_split(samples.nrows(), config.test_fraction, config.split_seed);
    let (x_train, y_train) = select(&samples, &labels_balanced, &train_rows);
    let (x_test, y_test) = select(&samples, &labels_balanced, &test_rows);
    let holdout = Ensemble::fit(&x_train, &y_train, n_classes, config)?;

    let mut models = Vec::with_capacity(3);
    for (scores, member) in cv_scores.into_iter().zip(holdout.members()) {
        let score = ModelScore {
            classifier: member.name().to_string(),
            cv_mean: mean(&scores),
            cv_scores: scores,
            train_accuracy: evaluation::accuracy(&member.predict_batch(&x_train), &y_train),
            test_accuracy: evaluation::accuracy(&member.predict_batch(&x_test), &y_test),
        };
        info!(
            "{}: cv mean {:?}, train {:?}, test {:?}",
            score.classifier, score.cv_mean, score.train_accuracy, score.test_accuracy
        );
        models.push(score);
    }

    let ensemble_predictions = holdout.predict_batch(&x_test);
    let ensemble_test_accuracy = evaluation::accuracy(&ensemble_predictions, &y_test);
    let ensemble_confusion =
        evaluation::confusion_matrix(&ensemble_predictions, &y_test, n_classes);
    info!("Ensemble hold-out accuracy {:?}", ensemble_test_accuracy);
    debug!("Ensemble confusion matrix: {:?}", ensemble_confusion);

    let final_models = Ensemble::fit(&samples, &labels_balanced, n_classes, config)?;
    let report = TrainingReport {
        run_id: run_id.to_string(),
        raw_samples: dataset.len(),
        balanced_samples: samples.nrows(),
        vocabulary_size: vocabulary.len(),
        num_classes: n_classes,
        raw_distribution,
        balanced_distribution,
        models,
        ensemble_test_accuracy,
        ensemble_confusion,
    };

    Ok(TrainingOutcome {
        artifacts: BundleArtifacts {
            vocabulary,
            encoder,
            symptom_map,
            svm: final_models.svm,
            naive_bayes: final_models.naive_bayes,
            random_forest: final_models.random_forest,
        },
        report,
    })
}

/// Identifier for a training run started now, e.g. `20250301T120000Z`.
pub fn new_run_id() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Trains on a CSV file and stores the artifacts and the report with `manager`.
pub fn train_and_save(
    csv_path: impl AsRef<Path>,
    manager: &ArtifactManager,
    config: &TrainingConfig,
) -> Result<TrainingReport, TrainingError> {
    let dataset = Dataset::from_csv_path(csv_path, &config.label_column)?;
    let run_id = new_run_id();
    let outcome = train(&dataset, config, &run_id)?;

    // Fail before touching the store if the artifacts could never load.
    outcome.artifacts.clone().into_bundle(Some(run_id.clone()))?;

    manager.save(&outcome.artifacts, &run_id)?;
    let report_path = manager.write_json(REPORT_FILE, &outcome.report)?;
    info!("Training report written to {:?}", report_path);
    Ok(outcome.report)
}
