use std::fs;

use lifeline::artifact_manager::{Artifact, ArtifactError, ArtifactManager, BundleArtifacts};
use lifeline::training::{train, Dataset, TrainingConfig, REPORT_FILE};
use lifeline::train_and_save;

const CSV: &str = "\
itching,skin_rash,high_fever,chills,cough,prognosis
1,1,0,0,0,Fungal infection
1,0,0,0,0,Fungal infection
0,1,0,0,0,Fungal infection
0,0,1,1,0,Malaria
0,0,1,0,0,Malaria
0,0,0,1,0,Malaria
0,0,1,0,1,Bronchitis
0,0,0,0,1,Bronchitis
";

fn config() -> TrainingConfig {
    let mut config = TrainingConfig::default();
    config.balance.min_samples = 4;
    config.balance.max_samples = 8;
    config.cv_folds = 0;
    config.random_forest.n_trees = 7;
    config
}

fn artifacts(csv: &str, seed: u64) -> BundleArtifacts {
    let dataset = Dataset::from_csv_reader(csv.as_bytes(), "prognosis").unwrap();
    train(&dataset, &config().with_seed(seed), "test").unwrap().artifacts
}

#[test]
fn test_save_and_load_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ArtifactManager::new(dir.path())?;
    let artifacts = artifacts(CSV, 42);

    let manifest = manager.save(&artifacts, "run-1")?;
    assert_eq!(manifest.vocabulary_size, 5);
    assert_eq!(manifest.files.len(), Artifact::ALL.len());
    assert!(manager.is_bundle_present());
    assert!(manager.verify_bundle()?);

    let expected = artifacts.into_bundle(None)?;
    let loaded = manager.load_bundle()?;
    assert_eq!(loaded.run_id(), Some("run-1"));
    assert_eq!(loaded.info().vocabulary_hash, expected.info().vocabulary_hash);
    assert_eq!(loaded.info().class_labels, vec!["Bronchitis", "Fungal infection", "Malaria"]);

    for report in [
        vec!["itching"],
        vec!["high fever", "chills"],
        vec!["cough", "high_fever"],
        vec!["skin rash", "chills", "cough"],
    ] {
        assert_eq!(loaded.predict(&report)?, expected.predict(&report)?);
    }
    Ok(())
}

#[test]
fn test_tampered_artifact_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ArtifactManager::new(dir.path())?;
    manager.save(&artifacts(CSV, 42), "run-1")?;

    let path = manager.get_artifact_path(Artifact::NaiveBayesModel);
    let value: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    fs::write(&path, serde_json::to_vec_pretty(&value)?)?;

    assert!(!manager.verify_bundle()?);
    assert!(matches!(
        manager.load_bundle(),
        Err(ArtifactError::HashMismatch { ref artifact, .. }) if artifact == "nb_model.json"
    ));
    Ok(())
}

#[test]
fn test_mixed_runs_are_detected() -> Result<(), Box<dyn std::error::Error>> {
    let first_dir = tempfile::tempdir()?;
    let second_dir = tempfile::tempdir()?;
    let first = ArtifactManager::new(first_dir.path())?;
    let second = ArtifactManager::new(second_dir.path())?;

    let other_csv = CSV.replace("Bronchitis", "Common cold");
    first.save(&artifacts(CSV, 42), "run-1")?;
    second.save(&artifacts(&other_csv, 7), "run-2")?;

    fs::copy(
        second.get_artifact_path(Artifact::Encoder),
        first.get_artifact_path(Artifact::Encoder),
    )?;
    assert!(matches!(first.load_bundle(), Err(ArtifactError::HashMismatch { .. })));
    Ok(())
}

#[test]
fn test_missing_artifact_and_removal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ArtifactManager::new(dir.path())?;
    manager.save(&artifacts(CSV, 42), "run-1")?;

    fs::remove_file(manager.get_artifact_path(Artifact::SvmModel))?;
    assert!(!manager.is_bundle_present());
    assert!(!manager.verify_bundle()?);
    assert!(matches!(manager.load_bundle(), Err(ArtifactError::NotFound(_))));

    manager.remove_bundle()?;
    assert!(!manager.get_manifest_path().exists());
    assert!(Artifact::ALL.iter().all(|a| !manager.get_artifact_path(*a).exists()));
    Ok(())
}

#[test]
fn test_train_and_save_writes_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("Training.csv");
    fs::write(&csv_path, CSV)?;
    let manager = ArtifactManager::new(dir.path().join("artifacts"))?;

    let report = train_and_save(&csv_path, &manager, &config())?;
    assert_eq!(report.raw_samples, 8);
    assert_eq!(report.num_classes, 3);
    assert!(manager.artifacts_dir().join(REPORT_FILE).exists());

    let bundle = manager.load_bundle()?;
    assert_eq!(bundle.run_id(), Some(report.run_id.as_str()));
    assert_eq!(bundle.vocabulary().len(), 5);
    Ok(())
}
