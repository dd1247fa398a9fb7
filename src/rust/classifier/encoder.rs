use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Bijection between disease names and the dense integer codes the classifiers predict.
///
/// Codes are assigned in sorted name order, `0..len()`. The encoder is fitted
/// once per training run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderClasses", into = "EncoderClasses")]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct EncoderClasses {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fits an encoder on every label occurrence of a training set.
    pub fn fit<I, S>(labels: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_string())
            .collect();
        Self::from_classes(classes.into_iter().collect())
    }

    fn from_classes(classes: Vec<String>) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Label encoder needs at least one class".into(),
            ));
        }
        if classes.iter().any(String::is_empty) {
            return Err(ClassifierError::ValidationError(
                "Disease label cannot be empty".into(),
            ));
        }
        if classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ClassifierError::ValidationError(
                "Encoder classes must be sorted and unique".into(),
            ));
        }

        let codes = classes
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect();
        Ok(Self { classes, codes })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, name: &str) -> Result<usize, ClassifierError> {
        self.codes
            .get(name.trim())
            .copied()
            .ok_or_else(|| ClassifierError::UnknownLabel(name.to_string()))
    }

    pub fn decode(&self, code: usize) -> Result<&str, ClassifierError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(ClassifierError::DecodeOutOfRange {
                code,
                classes: self.classes.len(),
            })
    }
}

impl TryFrom<EncoderClasses> for LabelEncoder {
    type Error = ClassifierError;

    fn try_from(value: EncoderClasses) -> Result<Self, Self::Error> {
        Self::from_classes(value.classes)
    }
}

impl From<LabelEncoder> for EncoderClasses {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = LabelEncoder::fit(["flu", "allergy", "flu", "malaria"]).unwrap();
        assert_eq!(encoder.classes(), ["allergy", "flu", "malaria"]);
        assert_eq!(encoder.encode("allergy").unwrap(), 0);
        assert_eq!(encoder.encode("malaria").unwrap(), 2);
    }

    #[test]
    fn test_round_trip() {
        let names = ["Typhoid", "Common Cold", "Dengue", "Migraine"];
        let encoder = LabelEncoder::fit(names).unwrap();
        for name in names {
            let code = encoder.encode(name).unwrap();
            assert_eq!(encoder.decode(code).unwrap(), name);
        }
    }

    #[test]
    fn test_decode_out_of_range() {
        let encoder = LabelEncoder::fit(["flu"]).unwrap();
        let err = encoder.decode(3).unwrap_err();
        assert_eq!(err, ClassifierError::DecodeOutOfRange { code: 3, classes: 1 });
        assert!(err.is_internal_consistency());
    }

    #[test]
    fn test_unknown_label() {
        let encoder = LabelEncoder::fit(["flu"]).unwrap();
        assert!(matches!(
            encoder.encode("measles"),
            Err(ClassifierError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_serialized_classes_are_validated() {
        assert!(serde_json::from_str::<LabelEncoder>(r#"{"classes":["b","a"]}"#).is_err());
        let encoder: LabelEncoder = serde_json::from_str(r#"{"classes":["a","b"]}"#).unwrap();
        assert_eq!(encoder.decode(1).unwrap(), "b");
    }
}
