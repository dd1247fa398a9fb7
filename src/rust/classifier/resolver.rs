//! Majority vote over the ensemble plus rule-based disambiguation.
//!
//! Resolution runs in two steps:
//!
//! 1. The statistical mode of the classifier codes is decoded into the
//!    *base prediction*. When no code wins outright, the lowest code among the
//!    most frequent ones is taken (see [`majority_vote`]).
//! 2. The [`DiseaseSymptomMap`] is scanned for diseases whose recorded symptoms
//!    cover every reported symptom. Exactly one such disease overrides the
//!    base prediction; zero or several leave it unchanged.

use serde::Serialize;

use super::encoder::LabelEncoder;
use super::error::ClassifierError;
use super::symptom_map::DiseaseSymptomMap;

/// Where the final disease of a [`Resolution`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The decoded majority vote
    Vote,
    /// The only disease whose recorded symptoms cover the report
    SymptomMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub disease: String,
    pub base_prediction: String,
    pub winning_code: usize,
    pub source: ResolutionSource,
}

/// Statistical mode of the classifier codes.
///
/// Ties between equally frequent codes, including the case where every
/// classifier disagrees, go to the smallest code. The rule carries no
/// semantic preference; it only makes the outcome reproducible.
///
/// Returns `None` for an empty vote.
pub fn majority_vote(codes: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for &code in codes {
        let count = codes.iter().filter(|&&c| c == code).count();
        best = match best {
            Some((best_code, best_count))
                if best_count > count || (best_count == count && best_code <= code) =>
            {
                Some((best_code, best_count))
            }
            _ => Some((code, count)),
        };
    }
    best.map(|(code, _)| code)
}

/// Combines classifier votes and symptom coverage into one disease.
#[derive(Debug, Clone, Copy)]
pub struct VotingResolver<'a> {
    encoder: &'a LabelEncoder,
    symptom_map: &'a DiseaseSymptomMap,
}

impl<'a> VotingResolver<'a> {
    pub fn new(encoder: &'a LabelEncoder, symptom_map: &'a DiseaseSymptomMap) -> Self {
        Self {
            encoder,
            symptom_map,
        }
    }

    /// Resolves the votes for a non-empty, vocabulary-filtered symptom list.
    pub fn resolve<S: AsRef<str>>(
        &self,
        codes: &[usize],
        filtered_symptoms: &[S],
    ) -> Result<Resolution, ClassifierError> {
        if filtered_symptoms.is_empty() {
            return Err(ClassifierError::NoRecognizableSymptoms);
        }
        let winning_code = majority_vote(codes).ok_or_else(|| {
            ClassifierError::ValidationError("Cannot resolve an empty vote".into())
        })?;
        let base_prediction = self.encoder.decode(winning_code)?.to_string();

        let (disease, source) = match self.symptom_map.unique_match(filtered_symptoms) {
            Some(matched) => (matched.to_string(), ResolutionSource::SymptomMatch),
            None => (base_prediction.clone(), ResolutionSource::Vote),
        };

        Ok(Resolution {
            disease,
            base_prediction,
            winning_code,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> LabelEncoder {
        // allergy=0, cold=1, flu=2, malaria=3, measles=4, typhoid=5
        LabelEncoder::fit(["allergy", "cold", "flu", "malaria", "measles", "typhoid"]).unwrap()
    }

    fn symptom_map() -> DiseaseSymptomMap {
        let mut map = DiseaseSymptomMap::new();
        map.record("flu", ["fever", "cough", "fatigue"]);
        map.record("allergy", ["rash", "sneezing"]);
        map.record("measles", ["rash", "fever"]);
        map
    }

    #[test]
    fn test_majority_vote() {
        assert_eq!(majority_vote(&[2, 2, 5]), Some(2));
        assert_eq!(majority_vote(&[5, 2, 2]), Some(2));
        assert_eq!(majority_vote(&[4, 1, 4]), Some(4));
        assert_eq!(majority_vote(&[3, 3, 3]), Some(3));
        assert_eq!(majority_vote(&[]), None);
    }

    #[test]
    fn test_three_way_disagreement_takes_lowest_code() {
        assert_eq!(majority_vote(&[5, 1, 3]), Some(1));
        assert_eq!(majority_vote(&[3, 5, 1]), Some(1));
        assert_eq!(majority_vote(&[7, 0, 4]), Some(0));
    }

    #[test]
    fn test_majority_wins_regardless_of_third_vote() {
        let encoder = encoder();
        let map = DiseaseSymptomMap::new();
        let resolver = VotingResolver::new(&encoder, &map);
        for third in 0..6 {
            let resolution = resolver.resolve(&[3, third, 3], &["fever"]).unwrap();
            assert_eq!(resolution.base_prediction, "malaria");
        }
    }

    #[test]
    fn test_unique_superset_overrides_vote() {
        let encoder = encoder();
        let map = symptom_map();
        let resolver = VotingResolver::new(&encoder, &map);

        let resolution = resolver.resolve(&[5, 5, 0], &["fever", "cough"]).unwrap();
        assert_eq!(resolution.base_prediction, "typhoid");
        assert_eq!(resolution.disease, "flu");
        assert_eq!(resolution.source, ResolutionSource::SymptomMatch);
    }

    #[test]
    fn test_ambiguous_superset_keeps_vote() {
        let encoder = encoder();
        let map = symptom_map();
        let resolver = VotingResolver::new(&encoder, &map);

        let resolution = resolver.resolve(&[1, 1, 1], &["rash"]).unwrap();
        assert_eq!(resolution.disease, "cold");
        assert_eq!(resolution.source, ResolutionSource::Vote);
    }

    #[test]
    fn test_no_superset_keeps_vote() {
        let encoder = encoder();
        let map = symptom_map();
        let resolver = VotingResolver::new(&encoder, &map);

        let resolution = resolver.resolve(&[2, 2, 2], &["rash", "cough"]).unwrap();
        assert_eq!(resolution.disease, "flu");
        assert_eq!(resolution.source, ResolutionSource::Vote);
    }

    #[test]
    fn test_out_of_range_code_is_consistency_error() {
        let encoder = encoder();
        let map = symptom_map();
        let resolver = VotingResolver::new(&encoder, &map);

        let err = resolver.resolve(&[9, 9, 1], &["fever"]).unwrap_err();
        assert!(err.is_internal_consistency());
    }

    #[test]
    fn test_empty_symptoms_rejected() {
        let encoder = encoder();
        let map = symptom_map();
        let resolver = VotingResolver::new(&encoder, &map);
        let empty: [&str; 0] = [];
        assert_eq!(
            resolver.resolve(&[1, 1, 1], &empty),
            Err(ClassifierError::NoRecognizableSymptoms)
        );
    }
}
