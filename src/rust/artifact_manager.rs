use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::models::{GaussianNaiveBayes, KernelSvm, RandomForest};
use crate::classifier::{
    ClassifierBundle, ClassifierError, DiseaseSymptomMap, LabelEncoder, SymptomVocabulary,
};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed {artifact}: {source}")]
    Malformed {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Hash mismatch: expected {expected}, got {actual} for {artifact}")]
    HashMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },
    #[error("Inconsistent bundle: {0}")]
    Inconsistent(#[from] ClassifierError),
}

/// The persisted pieces of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Symptoms,
    Encoder,
    DiseaseSymptomMap,
    SvmModel,
    NaiveBayesModel,
    RandomForestModel,
}

impl Artifact {
    pub const ALL: [Artifact; 6] = [
        Artifact::Symptoms,
        Artifact::Encoder,
        Artifact::DiseaseSymptomMap,
        Artifact::SvmModel,
        Artifact::NaiveBayesModel,
        Artifact::RandomForestModel,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Symptoms => "symptoms.json",
            Self::Encoder => "encoder.json",
            Self::DiseaseSymptomMap => "disease_symptom_map.json",
            Self::SvmModel => "svm_model.json",
            Self::NaiveBayesModel => "nb_model.json",
            Self::RandomForestModel => "rf_model.json",
        }
    }
}

/// Written last by [`ArtifactManager::save`]; ties the artifact files of one run together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub vocabulary_size: usize,
    pub vocabulary_hash: String,
    /// SHA-256 of each artifact file, keyed by file name
    pub files: BTreeMap<String, String>,
}

/// Everything a training run produces, in memory.
#[derive(Debug, Clone)]
pub struct BundleArtifacts {
    pub vocabulary: SymptomVocabulary,
    pub encoder: LabelEncoder,
    pub symptom_map: DiseaseSymptomMap,
    pub svm: KernelSvm,
    pub naive_bayes: GaussianNaiveBayes,
    pub random_forest: RandomForest,
}

impl BundleArtifacts {
    /// Validates the artifacts against each other and assembles a servable bundle.
    pub fn into_bundle(self, run_id: Option<String>) -> Result<ClassifierBundle, ClassifierError> {
        self.assemble(run_id, None)
    }

    fn assemble(
        self,
        run_id: Option<String>,
        vocabulary_hash: Option<String>,
    ) -> Result<ClassifierBundle, ClassifierError> {
        self.svm.validate()?;
        self.naive_bayes.validate()?;
        self.random_forest.validate()?;

        let mut builder = ClassifierBundle::builder()
            .with_vocabulary(self.vocabulary)?
            .with_encoder(self.encoder)?
            .with_symptom_map(self.symptom_map)?
            .add_classifier(self.svm)?
            .add_classifier(self.naive_bayes)?
            .add_classifier(self.random_forest)?;
        if let Some(run_id) = run_id {
            builder = builder.with_run_id(run_id);
        }
        if let Some(hash) = vocabulary_hash {
            builder = builder.expect_vocabulary_hash(hash);
        }
        builder.build()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn to_json<T: Serialize>(value: &T, artifact: &str) -> Result<Vec<u8>, ArtifactError> {
    serde_json::to_vec(value).map_err(|source| ArtifactError::Malformed {
        artifact: artifact.to_string(),
        source,
    })
}

fn from_json<T: DeserializeOwned>(bytes: &[u8], artifact: &str) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Malformed {
        artifact: artifact.to_string(),
        source,
    })
}

/// Stores and loads the artifacts of one training run in a directory.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    artifacts_dir: PathBuf,
}

impl ArtifactManager {
    /// Creates a new ArtifactManager with the default artifacts directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Where bundles live when no directory is given.
    ///
    /// `LIFELINE_ARTIFACTS` wins outright. Otherwise `lifeline/artifacts` under the
    /// platform data directory, `~/.local/share` or the temp directory, whichever
    /// resolves first.
    pub fn get_default_artifacts_dir() -> PathBuf {
        if let Ok(path) = env::var("LIFELINE_ARTIFACTS") {
            return PathBuf::from(path);
        }
        dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .unwrap_or_else(env::temp_dir)
            .join("lifeline")
            .join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self { artifacts_dir })
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn get_artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.artifacts_dir.join(artifact.file_name())
    }

    pub fn get_manifest_path(&self) -> PathBuf {
        self.artifacts_dir.join(MANIFEST_FILE)
    }

    pub fn is_bundle_present(&self) -> bool {
        let manifest_path = self.get_manifest_path();
        log::debug!("Checking for artifacts in {:?}", self.artifacts_dir);
        manifest_path.exists() && Artifact::ALL.iter().all(|a| self.get_artifact_path(*a).exists())
    }

    pub fn read_manifest(&self) -> Result<Manifest, ArtifactError> {
        let path = self.get_manifest_path();
        if !path.exists() {
            return Err(ArtifactError::NotFound(MANIFEST_FILE.to_string()));
        }
        from_json(&fs::read(path)?, MANIFEST_FILE)
    }

    /// Reads one artifact and checks it against the hash recorded in the manifest.
    fn read_verified(
        &self,
        manifest: &Manifest,
        artifact: Artifact,
    ) -> Result<Vec<u8>, ArtifactError> {
        let name = artifact.file_name();
        let path = self.get_artifact_path(artifact);
        if !path.exists() {
            return Err(ArtifactError::NotFound(name.to_string()));
        }
        let expected = manifest
            .files
            .get(name)
            .ok_or_else(|| {
                ArtifactError::NotFound(format!("{} entry in {}", name, MANIFEST_FILE))
            })?;

        let bytes = fs::read(&path)?;
        let actual = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: expected {}, calculated {}", path, expected, actual);
        if *expected != actual {
            log::error!("{} hash mismatch: expected {}, got {}", name, expected, actual);
            return Err(ArtifactError::HashMismatch {
                artifact: name.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(bytes)
    }

    /// Checks that every artifact exists and matches the manifest.
    ///
    /// Returns `Ok(false)` for missing or altered files; other failures are errors.
    pub fn verify_bundle(&self) -> Result<bool, ArtifactError> {
        if !self.is_bundle_present() {
            log::info!("Artifact set in {:?} is incomplete", self.artifacts_dir);
            return Ok(false);
        }
        let manifest = self.read_manifest()?;
        for artifact in Artifact::ALL {
            match self.read_verified(&manifest, artifact) {
                Ok(_) => {}
                Err(ArtifactError::HashMismatch { .. }) | Err(ArtifactError::NotFound(_)) => {
                    return Ok(false)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Persists all artifacts of a run, manifest last.
    ///
    /// Every file is first written under a temporary name and then renamed, so
    /// readers never see a half-written file; a reader racing the save sees a
    /// hash mismatch until the new manifest lands.
    pub fn save(
        &self,
        artifacts: &BundleArtifacts,
        run_id: &str,
    ) -> Result<Manifest, ArtifactError> {
        let mut payloads: Vec<(Artifact, Vec<u8>)> = Vec::with_capacity(Artifact::ALL.len());
        for artifact in Artifact::ALL {
            let name = artifact.file_name();
            let bytes = match artifact {
                Artifact::Symptoms => to_json(&artifacts.vocabulary, name)?,
                Artifact::Encoder => to_json(&artifacts.encoder, name)?,
                Artifact::DiseaseSymptomMap => to_json(&artifacts.symptom_map, name)?,
                Artifact::SvmModel => to_json(&artifacts.svm, name)?,
                Artifact::NaiveBayesModel => to_json(&artifacts.naive_bayes, name)?,
                Artifact::RandomForestModel => to_json(&artifacts.random_forest, name)?,
            };
            payloads.push((artifact, bytes));
        }

        let manifest = Manifest {
            run_id: run_id.to_string(),
            created_at: Utc::now(),
            vocabulary_size: artifacts.vocabulary.len(),
            vocabulary_hash: artifacts.vocabulary.content_hash(),
            files: payloads
                .iter()
                .map(|(artifact, bytes)| (artifact.file_name().to_string(), sha256_hex(bytes)))
                .collect(),
        };

        for (artifact, bytes) in &payloads {
            self.write_atomic(&self.get_artifact_path(*artifact), bytes)?;
        }
        self.write_atomic(&self.get_manifest_path(), &to_json(&manifest, MANIFEST_FILE)?)?;

        log::info!(
            "Saved training run {} ({} artifacts) to {:?}",
            run_id,
            payloads.len(),
            self.artifacts_dir
        );
        Ok(manifest)
    }

    /// Writes an auxiliary JSON document (such as a training report) next to the artifacts.
    pub fn write_json<T: Serialize>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.artifacts_dir.join(file_name);
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Malformed {
            artifact: file_name.to_string(),
            source,
        })?;
        self.write_atomic(&path, &bytes)?;
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_artifact<T: DeserializeOwned>(
        &self,
        manifest: &Manifest,
        artifact: Artifact,
    ) -> Result<T, ArtifactError> {
        from_json(&self.read_verified(manifest, artifact)?, artifact.file_name())
    }

    /// Loads the whole bundle or nothing.
    ///
    /// Fails if any artifact is missing, differs from the manifest, cannot be
    /// parsed, or disagrees with the others on vocabulary size or class count.
    pub fn load_bundle(&self) -> Result<ClassifierBundle, ArtifactError> {
        log::info!("Loading classifier bundle from {:?}", self.artifacts_dir);
        let manifest = self.read_manifest()?;

        let vocabulary: SymptomVocabulary = self.read_artifact(&manifest, Artifact::Symptoms)?;
        if vocabulary.len() != manifest.vocabulary_size {
            return Err(ClassifierError::DimensionMismatch {
                expected: manifest.vocabulary_size,
                actual: vocabulary.len(),
            }
            .into());
        }

        let artifacts = BundleArtifacts {
            encoder: self.read_artifact(&manifest, Artifact::Encoder)?,
            symptom_map: self.read_artifact(&manifest, Artifact::DiseaseSymptomMap)?,
            svm: self.read_artifact(&manifest, Artifact::SvmModel)?,
            naive_bayes: self.read_artifact(&manifest, Artifact::NaiveBayesModel)?,
            random_forest: self.read_artifact(&manifest, Artifact::RandomForestModel)?,
            vocabulary,
        };

        let bundle = artifacts.assemble(Some(manifest.run_id), Some(manifest.vocabulary_hash))?;
        log::info!("Classifier bundle {} loaded", bundle.run_id().unwrap_or("<unnamed>"));
        Ok(bundle)
    }

    pub fn remove_bundle(&self) -> Result<(), ArtifactError> {
        let manifest_path = self.get_manifest_path();
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }
        for artifact in Artifact::ALL {
            let path = self.get_artifact_path(artifact);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_artifacts_dir() {
        // Test with environment variable
        env::set_var("LIFELINE_ARTIFACTS", "/tmp/test-lifeline/artifacts");
        let path = ArtifactManager::get_default_artifacts_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-lifeline/artifacts"));
        env::remove_var("LIFELINE_ARTIFACTS");

        // Test without environment variable
        let path = ArtifactManager::get_default_artifacts_dir();
        assert!(path.ends_with("lifeline/artifacts"));
    }

    #[test]
    fn test_artifact_file_names_are_distinct() {
        let mut names: Vec<_> = Artifact::ALL.iter().map(|a| a.file_name()).collect();
        names.push(MANIFEST_FILE);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Artifact::ALL.len() + 1);
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        assert!(!manager.is_bundle_present());
        assert!(!manager.verify_bundle().unwrap());
        assert!(matches!(manager.load_bundle(), Err(ArtifactError::NotFound(_))));
    }
}
