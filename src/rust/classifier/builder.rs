use std::sync::Arc;

use log::info;

use super::bundle::ClassifierBundle;
use super::encoder::LabelEncoder;
use super::error::ClassifierError;
use super::models::SymptomClassifier;
use super::symptom_map::DiseaseSymptomMap;
use super::vocabulary::SymptomVocabulary;

/// Number of classifiers voting in every bundle.
pub const ENSEMBLE_SIZE: usize = 3;

/// A builder for constructing a ClassifierBundle with a fluent interface.
///
/// `build` is where every cross-artifact invariant is checked, so a bundle
/// that exists is always internally consistent.
#[derive(Default, Debug)]
pub struct BundleBuilder {
    vocabulary: Option<SymptomVocabulary>,
    encoder: Option<LabelEncoder>,
    symptom_map: Option<DiseaseSymptomMap>,
    classifiers: Vec<Arc<dyn SymptomClassifier>>,
    run_id: Option<String>,
    expected_vocabulary_hash: Option<String>,
}

impl BundleBuilder {
    /// Creates a new empty BundleBuilder instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the symptom vocabulary that defines the feature order
    pub fn with_vocabulary(
        mut self,
        vocabulary: SymptomVocabulary,
    ) -> Result<Self, ClassifierError> {
        if self.vocabulary.is_some() {
            return Err(ClassifierError::BuildError("Vocabulary already set".into()));
        }
        self.vocabulary = Some(vocabulary);
        Ok(self)
    }

    /// Sets the label encoder shared by all classifiers
    pub fn with_encoder(mut self, encoder: LabelEncoder) -> Result<Self, ClassifierError> {
        if self.encoder.is_some() {
            return Err(ClassifierError::BuildError("Label encoder already set".into()));
        }
        self.encoder = Some(encoder);
        Ok(self)
    }

    /// Sets the disease–symptom map used for disambiguation
    pub fn with_symptom_map(
        mut self,
        symptom_map: DiseaseSymptomMap,
    ) -> Result<Self, ClassifierError> {
        if self.symptom_map.is_some() {
            return Err(ClassifierError::BuildError("Disease-symptom map already set".into()));
        }
        self.symptom_map = Some(symptom_map);
        Ok(self)
    }

    /// Adds one classifier to the ensemble.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder, or an error if the
    ///   ensemble is already complete
    pub fn add_classifier<C>(mut self, classifier: C) -> Result<Self, ClassifierError>
    where
        C: SymptomClassifier + 'static,
    {
        if self.classifiers.len() >= ENSEMBLE_SIZE {
            return Err(ClassifierError::BuildError(format!(
                "Ensemble already has {} classifiers",
                ENSEMBLE_SIZE
            )));
        }
        self.classifiers.push(Arc::new(classifier));
        Ok(self)
    }

    /// Tags the bundle with the training run it came from
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Requires the vocabulary content hash to equal `hash` at build time
    pub fn expect_vocabulary_hash(mut self, hash: impl Into<String>) -> Self {
        self.expected_vocabulary_hash = Some(hash.into());
        self
    }

    /// Builds and returns the final ClassifierBundle
    ///
    /// # Returns
    /// * `Result<ClassifierBundle, ClassifierError>` - The bundle, or an error if:
    ///   - The vocabulary, encoder or disease–symptom map is missing
    ///   - The ensemble does not have exactly three classifiers
    ///   - A classifier's input width differs from the vocabulary size
    ///   - A classifier's class count differs from the encoder
    ///   - The disease–symptom map names an unknown disease or symptom
    ///   - The vocabulary hash differs from the expected one
    pub fn build(self) -> Result<ClassifierBundle, ClassifierError> {
        let vocabulary = self
            .vocabulary
            .ok_or_else(|| ClassifierError::BuildError("Symptom vocabulary must be set".into()))?;
        let encoder = self
            .encoder
            .ok_or_else(|| ClassifierError::BuildError("Label encoder must be set".into()))?;
        let symptom_map = self
            .symptom_map
            .ok_or_else(|| ClassifierError::BuildError("Disease-symptom map must be set".into()))?;

        if self.classifiers.len() != ENSEMBLE_SIZE {
            return Err(ClassifierError::BuildError(format!(
                "Ensemble needs exactly {} classifiers, got {}",
                ENSEMBLE_SIZE,
                self.classifiers.len()
            )));
        }

        if let Some(expected) = &self.expected_vocabulary_hash {
            let actual = vocabulary.content_hash();
            if *expected != actual {
                return Err(ClassifierError::BuildError(format!(
                    "Vocabulary hash mismatch: expected {}, got {}",
                    expected, actual
                )));
            }
        }

        for classifier in &self.classifiers {
            if classifier.n_features() != vocabulary.len() {
                return Err(ClassifierError::DimensionMismatch {
                    expected: vocabulary.len(),
                    actual: classifier.n_features(),
                });
            }
            if classifier.n_classes() != encoder.len() {
                return Err(ClassifierError::BuildError(format!(
                    "Classifier '{}' predicts {} classes but the encoder knows {}",
                    classifier.name(),
                    classifier.n_classes(),
                    encoder.len()
                )));
            }
        }

        for disease in symptom_map.diseases() {
            encoder.encode(disease)?;
            if let Some(unknown) = symptom_map
                .symptoms_of(disease)
                .into_iter()
                .flatten()
                .find(|s| !vocabulary.contains(s))
            {
                return Err(ClassifierError::BuildError(format!(
                    "Disease '{}' lists symptom '{}' outside the vocabulary",
                    disease, unknown
                )));
            }
        }

        info!(
            "Classifier bundle ready: {} symptoms, {} diseases, classifiers [{}]",
            vocabulary.len(),
            encoder.len(),
            self.classifiers
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ClassifierBundle {
            vocabulary: Arc::new(vocabulary),
            encoder: Arc::new(encoder),
            symptom_map: Arc::new(symptom_map),
            classifiers: self.classifiers.into(),
            run_id: self.run_id,
        })
    }
}
