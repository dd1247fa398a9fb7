use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Every symptom ever recorded for each disease in the training data.
///
/// Used only as a disambiguation filter after voting: it is not a diagnostic
/// rule on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiseaseSymptomMap {
    diseases: BTreeMap<String, BTreeSet<String>>,
}

impl DiseaseSymptomMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `symptoms` were observed together with `disease`.
    pub fn record<I, S>(&mut self, disease: &str, symptoms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diseases
            .entry(disease.to_string())
            .or_default()
            .extend(symptoms.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    pub fn symptoms_of(&self, disease: &str) -> Option<&BTreeSet<String>> {
        self.diseases.get(disease)
    }

    pub fn diseases(&self) -> impl Iterator<Item = &str> {
        self.diseases.keys().map(String::as_str)
    }

    /// Diseases whose recorded symptom set contains every reported symptom, in name order.
    pub fn superset_matches<S: AsRef<str>>(&self, reported: &[S]) -> Vec<&str> {
        self.diseases
            .iter()
            .filter(|(_, known)| reported.iter().all(|s| known.contains(s.as_ref())))
            .map(|(disease, _)| disease.as_str())
            .collect()
    }

    /// The single disease covering all reported symptoms, if exactly one does.
    pub fn unique_match<S: AsRef<str>>(&self, reported: &[S]) -> Option<&str> {
        match self.superset_matches(reported).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

impl FromIterator<(String, BTreeSet<String>)> for DiseaseSymptomMap {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (disease, symptoms) in iter {
            map.record(&disease, symptoms);
        }
        map
    }
}
