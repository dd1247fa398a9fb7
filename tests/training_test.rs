use lifeline::training::{train, Dataset, TrainingConfig, TrainingError};
use lifeline::ResolutionSource;

const DISEASES: [&str; 4] = ["Acne", "Dengue", "Jaundice", "Migraine"];
const BAND: usize = 4;

/// Every disease owns a disjoint band of symptoms; each row drops one of them.
fn banded_csv() -> String {
    let n_symptoms = DISEASES.len() * BAND;
    let mut header: Vec<String> = (0..n_symptoms).map(|s| format!("symptom {}", s)).collect();
    header.push("prognosis".to_string());

    let mut lines = vec![header.join(",")];
    for (d, disease) in DISEASES.iter().enumerate() {
        for r in 0..12 {
            let mut cells: Vec<String> = (0..n_symptoms)
                .map(|s| {
                    let in_band = s / BAND == d && s % BAND != r % BAND;
                    if in_band { "1" } else { "0" }.to_string()
                })
                .collect();
            cells.push(disease.to_string());
            lines.push(cells.join(","));
        }
    }
    lines.join("\n")
}

fn band(d: usize) -> Vec<String> {
    (0..BAND).map(|k| format!("Symptom {}", d * BAND + k)).collect()
}

#[test]
fn test_training_learns_separable_diseases() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Dataset::from_csv_reader(banded_csv().as_bytes(), "prognosis")?;
    assert_eq!(dataset.symptoms[0], "symptom_0");

    let outcome = train(&dataset, &TrainingConfig::default(), "banded")?;
    let report = &outcome.report;
    assert_eq!(report.raw_samples, 48);
    // every class has 12 rows and is oversampled to 30
    assert_eq!(report.balanced_samples, 120);
    assert!(report.balanced_distribution.values().all(|&count| count == 30));
    assert_eq!(report.models.len(), 3);
    assert!(report.models.iter().all(|m| m.cv_scores.len() == 5));
    assert!(report.ensemble_test_accuracy.unwrap_or(0.0) >= 0.75);

    let bundle = outcome.artifacts.into_bundle(Some("banded".into()))?;
    for (d, disease) in DISEASES.iter().enumerate() {
        let prediction = bundle.predict(&band(d))?;
        assert_eq!(prediction.disease, *disease);
        assert_eq!(prediction.source, ResolutionSource::SymptomMatch);
    }
    Ok(())
}

#[test]
fn test_training_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Dataset::from_csv_reader(banded_csv().as_bytes(), "prognosis")?;
    let mut config = TrainingConfig::default();
    config.cv_folds = 2;
    config.random_forest.n_trees = 10;

    let first = train(&dataset, &config, "a")?.artifacts.into_bundle(None)?;
    let second = train(&dataset, &config, "b")?.artifacts.into_bundle(None)?;

    let report = ["symptom_0", "symptom_5", "symptom_9"];
    assert_eq!(first.predict(&report)?, second.predict(&report)?);
    Ok(())
}

#[test]
fn test_repeated_symptom_header_trains() -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = vec!["fever,cough,fever,rash,prognosis".to_string()];
    for _ in 0..5 {
        lines.push("1,0,0,0,Malaria".to_string());
        lines.push("0,0,1,0,Malaria".to_string());
        lines.push("0,1,0,0,Bronchitis".to_string());
        lines.push("0,0,0,1,Measles".to_string());
    }
    let dataset = Dataset::from_csv_reader(lines.join("\n").as_bytes(), "prognosis")?;
    assert_eq!(dataset.symptoms, vec!["fever", "cough", "rash"]);

    let mut config = TrainingConfig::default();
    config.cv_folds = 0;
    config.random_forest.n_trees = 5;
    let bundle = train(&dataset, &config, "dup")?.artifacts.into_bundle(None)?;
    assert_eq!(bundle.vocabulary().len(), 3);
    assert_eq!(bundle.predict(&["fever"])?.disease, "Malaria");
    Ok(())
}

#[test]
fn test_missing_file() {
    let result = Dataset::from_csv_path("/nonexistent/Training.csv", "prognosis");
    assert!(matches!(result, Err(TrainingError::Io(_))));
}
