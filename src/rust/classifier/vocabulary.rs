use std::collections::{HashMap, HashSet};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ClassifierError;

/// Normalizes a free-form symptom phrase into a vocabulary identifier.
///
/// Surrounding whitespace is dropped, the rest is lower-cased and inner
/// spaces become underscores: `" Skin Rash"` becomes `"skin_rash"`.
pub fn normalize_symptom(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// The ordered set of symptom identifiers that defines the classifiers' feature space.
///
/// Position `i` of every feature vector corresponds to `symptoms()[i]`, so the
/// order is part of the trained model and must never change after training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SymptomVocabulary {
    symptoms: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymptomVocabulary {
    /// Creates a vocabulary from training column names, keeping their order.
    ///
    /// Names are normalized first. Empty names and duplicates after
    /// normalization are rejected because they would make two columns
    /// indistinguishable at serving time.
    pub fn new(symptoms: Vec<impl Into<String>>) -> Result<Self, ClassifierError> {
        let symptoms: Vec<String> = symptoms
            .into_iter()
            .map(|s| normalize_symptom(&s.into()))
            .collect();

        if symptoms.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Symptom vocabulary cannot be empty".into(),
            ));
        }

        let mut index = HashMap::with_capacity(symptoms.len());
        for (i, symptom) in symptoms.iter().enumerate() {
            if symptom.is_empty() {
                return Err(ClassifierError::ValidationError(format!(
                    "Symptom {} has an empty name",
                    i + 1
                )));
            }
            if index.insert(symptom.clone(), i).is_some() {
                return Err(ClassifierError::ValidationError(format!(
                    "Duplicate symptom in vocabulary: {}",
                    symptom
                )));
            }
        }

        Ok(Self { symptoms, index })
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.index.contains_key(symptom)
    }

    pub fn position(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    /// Normalizes a reported symptom list and keeps only known symptoms.
    ///
    /// Input order is preserved and repeated symptoms are kept once.
    pub fn filter<S: AsRef<str>>(&self, reported: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        reported
            .iter()
            .map(|s| normalize_symptom(s.as_ref()))
            .filter(|s| self.contains(s))
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    /// Builds the binary feature vector for an already filtered symptom list.
    ///
    /// Returns an error if any symptom is not part of the vocabulary, so an
    /// unfiltered list can never silently turn into zero columns.
    pub fn feature_vector<S: AsRef<str>>(
        &self,
        filtered: &[S],
    ) -> Result<Array1<f64>, ClassifierError> {
        let mut features = Array1::zeros(self.len());
        for symptom in filtered {
            let symptom = symptom.as_ref();
            let position = self.position(symptom).ok_or_else(|| {
                ClassifierError::ValidationError(format!("Symptom not in vocabulary: {}", symptom))
            })?;
            features[position] = 1.0;
        }
        Ok(features)
    }

    /// Hex encoded SHA-256 over the ordered symptom names.
    ///
    /// Two vocabularies hash equal only if they list the same symptoms in the
    /// same order.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for symptom in &self.symptoms {
            hasher.update(symptom.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl TryFrom<Vec<String>> for SymptomVocabulary {
    type Error = ClassifierError;

    fn try_from(symptoms: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(symptoms)
    }
}

impl From<SymptomVocabulary> for Vec<String> {
    fn from(vocabulary: SymptomVocabulary) -> Self {
        vocabulary.symptoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> SymptomVocabulary {
        SymptomVocabulary::new(vec!["fever", "cough", "fatigue", "rash"]).unwrap()
    }

    #[test]
    fn test_normalize_symptom() {
        assert_eq!(normalize_symptom("Skin Rash"), "skin_rash");
        assert_eq!(normalize_symptom("  FEVER "), "fever");
        assert_eq!(normalize_symptom("already_normal"), "already_normal");
    }

    #[test]
    fn test_filter_drops_unknown_and_normalizes() {
        let vocabulary = vocabulary();
        let filtered = vocabulary.filter(&["Fever", "Cough", "unknown thing"]);
        assert_eq!(filtered, vec!["fever", "cough"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let vocabulary = vocabulary();
        let once = vocabulary.filter(&["Rash", "fever", "Fatigue"]);
        let twice = vocabulary.filter(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_deduplicates() {
        let vocabulary = vocabulary();
        assert_eq!(vocabulary.filter(&["fever", "Fever"]), vec!["fever"]);
    }

    #[test]
    fn test_feature_vector_follows_vocabulary_order() {
        let vocabulary = vocabulary();
        let features = vocabulary.feature_vector(&["cough", "fever"]).unwrap();
        assert_eq!(features.to_vec(), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_feature_vector_rejects_unfiltered_input() {
        let vocabulary = vocabulary();
        assert!(vocabulary.feature_vector(&["sneezing"]).is_err());
    }

    #[test]
    fn test_duplicate_and_empty_vocabulary_rejected() {
        assert!(SymptomVocabulary::new(vec!["fever", "Fever"]).is_err());
        assert!(SymptomVocabulary::new(Vec::<String>::new()).is_err());
        assert!(SymptomVocabulary::new(vec!["fever", " "]).is_err());
    }

    #[test]
    fn test_content_hash_depends_on_order() {
        let a = SymptomVocabulary::new(vec!["fever", "cough"]).unwrap();
        let b = SymptomVocabulary::new(vec!["cough", "fever"]).unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), a.clone().content_hash());
    }

    #[test]
    fn test_serde_rebuilds_index() {
        let vocabulary = vocabulary();
        let json = serde_json::to_string(&vocabulary).unwrap();
        assert_eq!(json, r#"["fever","cough","fatigue","rash"]"#);
        let restored: SymptomVocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.position("rash"), Some(3));
    }

    #[test]
    fn test_persisted_duplicates_rejected() {
        let result = serde_json::from_str::<SymptomVocabulary>(r#"["fever","cough","fever"]"#);
        assert!(result.is_err());
    }
}
