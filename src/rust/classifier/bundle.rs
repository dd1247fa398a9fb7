use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::builder::BundleBuilder;
use super::encoder::LabelEncoder;
use super::error::ClassifierError;
use super::models::SymptomClassifier;
use super::resolver::{ResolutionSource, VotingResolver};
use super::symptom_map::DiseaseSymptomMap;
use super::vocabulary::SymptomVocabulary;
use super::BundleInfo;

/// One classifier's vote for a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub classifier: String,
    pub code: usize,
}

/// Outcome of a successful prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    /// Final disease after disambiguation
    pub disease: String,
    /// Decoded majority vote before disambiguation
    pub base_prediction: String,
    pub source: ResolutionSource,
    pub votes: Vec<Vote>,
    /// The normalized symptoms that were recognized and used
    pub symptoms: Vec<String>,
}

/// The immutable product of one training run: vocabulary, encoder,
/// disease–symptom map and the fitted classifiers.
///
/// # Thread Safety
///
/// Every part is read-only after [`BundleBuilder::build`] and shared through
/// `Arc`, so a bundle can be cloned cheaply into request handlers and used
/// from many threads at once:
///
/// ```rust,ignore
/// let bundle = Arc::new(store.load_bundle()?);
/// let worker = Arc::clone(&bundle);
/// std::thread::spawn(move || worker.predict(&["Fever", "Cough"]));
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierBundle {
    pub(super) vocabulary: Arc<SymptomVocabulary>,
    pub(super) encoder: Arc<LabelEncoder>,
    pub(super) symptom_map: Arc<DiseaseSymptomMap>,
    pub(super) classifiers: Arc<[Arc<dyn SymptomClassifier>]>,
    pub(super) run_id: Option<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassifierBundle>();
    }
};

impl ClassifierBundle {
    /// Creates a new BundleBuilder for fluent construction
    pub fn builder() -> BundleBuilder {
        BundleBuilder::new()
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn symptom_map(&self) -> &DiseaseSymptomMap {
        &self.symptom_map
    }

    pub fn classifiers(&self) -> &[Arc<dyn SymptomClassifier>] {
        &self.classifiers
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Returns information about the bundle's contents
    pub fn info(&self) -> BundleInfo {
        BundleInfo {
            run_id: self.run_id.clone(),
            vocabulary_size: self.vocabulary.len(),
            vocabulary_hash: self.vocabulary.content_hash(),
            num_classes: self.encoder.len(),
            class_labels: self.encoder.classes().to_vec(),
            classifiers: self.classifiers.iter().map(|c| c.name().to_string()).collect(),
        }
    }

    /// Predicts a disease from a free-form symptom report.
    ///
    /// The report is normalized and filtered against the vocabulary first. If
    /// nothing is left the call fails with
    /// [`ClassifierError::NoRecognizableSymptoms`] and no classifier runs.
    ///
    /// # Example
    /// ```rust,ignore
    /// let prediction = bundle.predict(&["Fever", "Cough"])?;
    /// println!("{} ({:?})", prediction.disease, prediction.source);
    /// ```
    pub fn predict<S: AsRef<str>>(&self, reported: &[S]) -> Result<Prediction, ClassifierError> {
        let symptoms = self.vocabulary.filter(reported);
        if symptoms.is_empty() {
            return Err(ClassifierError::NoRecognizableSymptoms);
        }

        let features = self.vocabulary.feature_vector(&symptoms)?;
        let mut votes = Vec::with_capacity(self.classifiers.len());
        for classifier in self.classifiers.iter() {
            if classifier.n_features() != features.len() {
                return Err(ClassifierError::DimensionMismatch {
                    expected: classifier.n_features(),
                    actual: features.len(),
                });
            }
            votes.push(Vote {
                classifier: classifier.name().to_string(),
                code: classifier.predict(features.view()),
            });
        }

        let codes: Vec<usize> = votes.iter().map(|v| v.code).collect();
        let resolution =
            VotingResolver::new(&self.encoder, &self.symptom_map).resolve(&codes, &symptoms)?;
        debug!(
            "Votes {:?} -> base '{}', final '{}' ({:?})",
            codes, resolution.base_prediction, resolution.disease, resolution.source
        );

        Ok(Prediction {
            disease: resolution.disease,
            base_prediction: resolution.base_prediction,
            source: resolution.source,
            votes,
            symptoms,
        })
    }
}
