use serde::Serialize;

mod builder;
mod bundle;
mod encoder;
mod error;
pub mod models;
pub mod resolver;
mod symptom_map;
mod vocabulary;

pub use builder::{BundleBuilder, ENSEMBLE_SIZE};
pub use bundle::{ClassifierBundle, Prediction, Vote};
pub use encoder::LabelEncoder;
pub use error::ClassifierError;
pub use models::SymptomClassifier;
pub use resolver::{majority_vote, Resolution, ResolutionSource, VotingResolver};
pub use symptom_map::DiseaseSymptomMap;
pub use vocabulary::{normalize_symptom, SymptomVocabulary};

/// Information about the contents of a loaded bundle
#[derive(Debug, Clone, Serialize)]
pub struct BundleInfo {
    /// Training run the artifacts came from, if recorded
    pub run_id: Option<String>,
    /// Number of symptoms in the feature space
    pub vocabulary_size: usize,
    /// SHA-256 of the ordered vocabulary
    pub vocabulary_hash: String,
    /// Number of diseases the encoder knows
    pub num_classes: usize,
    /// Disease names in code order
    pub class_labels: Vec<String>,
    /// Names of the voting classifiers
    pub classifiers: Vec<String>,
}
