use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lifeline::{train_and_save, AppState, ArtifactManager, ServiceConfig, TrainingConfig};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP prediction service
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        host: Option<String>,
        /// Directory holding the trained artifacts
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// JSON file for prediction history (in memory if omitted)
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Train the classifiers from a labeled CSV file
    Train {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// Reseed every random step
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Predict a disease from symptoms using the stored artifacts
    Predict {
        #[arg(long)]
        artifacts: Option<PathBuf>,
        #[arg(required = true)]
        symptoms: Vec<String>,
    },
}

fn artifact_manager(dir: Option<PathBuf>) -> anyhow::Result<ArtifactManager> {
    let dir = dir.unwrap_or_else(ArtifactManager::get_default_artifacts_dir);
    ArtifactManager::new(&dir).with_context(|| format!("cannot open artifacts directory {:?}", dir))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lifeline::init_logger();
    let args = Args::parse();

    match args.command {
        Command::Serve {
            port,
            host,
            artifacts,
            history,
        } => {
            let mut config = ServiceConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(artifacts) = artifacts {
                config.artifacts_dir = artifacts;
            }
            if history.is_some() {
                config.history_path = history;
            }

            let state = AppState::from_config(&config).context("cannot open prediction history")?;
            lifeline::server::serve(state, &config.bind_address())
                .await
                .with_context(|| format!("server on {} failed", config.bind_address()))?;
        }
        Command::Train { data, artifacts, seed } => {
            let manager = artifact_manager(artifacts)?;
            let mut config = TrainingConfig::default();
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            let start_time = Instant::now();
            info!("=== Training from {:?} ===", data);
            let report = train_and_save(&data, &manager, &config).context("training failed")?;
            info!(
                "=== Training run {} finished (took {:.2?}) ===",
                report.run_id,
                start_time.elapsed()
            );

            for model in &report.models {
                println!(
                    "{:<14} cv {:>6}  train {:>6}  test {:>6}",
                    model.classifier,
                    percent(model.cv_mean),
                    percent(model.train_accuracy),
                    percent(model.test_accuracy)
                );
            }
            println!("{:<14} test {:>6}", "ensemble", percent(report.ensemble_test_accuracy));
        }
        Command::Predict { artifacts, symptoms } => {
            let bundle = artifact_manager(artifacts)?
                .load_bundle()
                .context("cannot load classifier bundle")?;
            let prediction = bundle.predict(&symptoms)?;

            println!("Predicted disease: {}", prediction.disease);
            println!("Majority vote: {}", prediction.base_prediction);
            for vote in &prediction.votes {
                let disease = bundle.encoder().decode(vote.code).unwrap_or("<unknown>");
                println!("  {:<14} {}", vote.classifier, disease);
            }
            println!("Resolved by: {:?}", prediction.source);
            println!("Symptoms used: {}", prediction.symptoms.join(", "));
        }
    }

    Ok(())
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}
