//! Symptom-to-disease prediction backed by a three-classifier voting ensemble.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lifeline::ArtifactManager;
//!
//! let bundle = ArtifactManager::new_default()?.load_bundle()?;
//!
//! let prediction = bundle.predict(&["High Fever", "chills", "sweating"])?;
//! println!("Predicted disease: {}", prediction.disease);
//! println!("Votes: {:?}", prediction.votes);
//! # Ok(())
//! # }
//! ```
//!
//! # Training
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lifeline::{train_and_save, ArtifactManager, TrainingConfig};
//!
//! let manager = ArtifactManager::new("artifacts")?;
//! let report = train_and_save("Training.csv", &manager, &TrainingConfig::default())?;
//! println!("Ensemble accuracy: {:?}", report.ensemble_test_accuracy);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A loaded bundle is immutable and can be shared across threads using `Arc`:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lifeline::ArtifactManager;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let bundle = Arc::new(ArtifactManager::new_default()?.load_bundle()?);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let bundle = Arc::clone(&bundle);
//!     handles.push(thread::spawn(move || bundle.predict(&["cough"]).is_ok()));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact_manager;
pub mod classifier;
pub mod config;
pub mod history;
pub mod llm;
pub mod server;
pub mod training;

pub use artifact_manager::{ArtifactError, ArtifactManager, BundleArtifacts, Manifest};
pub use classifier::{
    BundleBuilder, BundleInfo, ClassifierBundle, ClassifierError, DiseaseSymptomMap, LabelEncoder,
    Prediction, ResolutionSource, SymptomClassifier, SymptomVocabulary,
};
pub use config::ServiceConfig;
pub use history::{HistoryStore, PredictionRecord};
pub use llm::{LlmError, TextGenerator};
pub use server::{ApiError, AppState};
pub use training::{train, train_and_save, TrainingConfig, TrainingError, TrainingReport};

/// Initializes `env_logger` with an `info` default that `RUST_LOG` overrides.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
