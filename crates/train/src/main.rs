use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use spamfr_core::config;
use spamfr_core::dataset;
use spamfr_core::storage::ArtifactPaths;
use spamfr_core::training::{run_training, TrainingOptions};
use spamfr_core::SpamDetector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spamfr-train",
    about = "Filter, train and try out the French spam classifier"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Keep only the rows of one language from the raw multilingual dataset
    Filter {
        /// Raw CSV with `text`, `labels` and `lang` columns
        #[arg(long, default_value = config::DEFAULT_RAW_DATASET_PATH)]
        input: PathBuf,

        /// Filtered CSV with `text` and `labels` columns
        #[arg(long, default_value = config::DEFAULT_DATASET_PATH)]
        output: PathBuf,

        /// Value of the `lang` column to keep
        #[arg(long, default_value = config::DEFAULT_LANGUAGE)]
        language: String,
    },
    /// Fit the vectorizer and classifier, evaluate, and persist the artifacts
    Train {
        /// Filtered CSV with `text` and `labels` columns
        #[arg(long, default_value = config::DEFAULT_DATASET_PATH)]
        dataset: PathBuf,

        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Train/test split seed
        #[arg(long, default_value_t = config::RANDOM_STATE)]
        seed: u64,

        /// Write the training report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Score messages with the persisted artifacts and print the results as JSON
    Predict {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Messages to classify
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

#[derive(Args)]
struct ArtifactArgs {
    /// Path to the fitted classifier artifact
    #[arg(long, env = "SPAMFR_MODEL_PATH", default_value = config::DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Path to the fitted vectorizer artifact
    #[arg(long, env = "SPAMFR_VECTORIZER_PATH", default_value = config::DEFAULT_VECTORIZER_PATH)]
    vectorizer_path: PathBuf,
}

impl ArtifactArgs {
    fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_path, &self.vectorizer_path)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("spamfr_train=info".parse()?)
                .add_directive("spamfr_core=info".parse()?),
        )
        .init();

    match Cli::parse().command {
        Command::Filter {
            input,
            output,
            language,
        } => {
            let report = dataset::filter_language(&input, &output, &language)
                .with_context(|| format!("filtering {:?}", input))?;
            tracing::info!("Wrote {} of {} rows to {:?}", report.kept, report.total, output);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Train {
            dataset,
            artifacts,
            seed,
            report,
        } => {
            let options = TrainingOptions {
                seed,
                ..TrainingOptions::default()
            };
            let summary = run_training(&dataset, &artifacts.paths(), &options)
                .with_context(|| format!("training on {:?}", dataset))?;
            let json = serde_json::to_string_pretty(&summary)?;
            if let Some(path) = report {
                std::fs::write(&path, &json)
                    .with_context(|| format!("writing report to {:?}", path))?;
                tracing::info!("Report written to {:?}", path);
            }
            println!("{json}");
        }
        Command::Predict { artifacts, texts } => {
            let detector = SpamDetector::load(&artifacts.paths());
            if !detector.is_loaded() {
                bail!(
                    "cannot load artifacts: {}",
                    detector.load_error().unwrap_or("unknown error")
                );
            }
            let predictions = detector.batch_predict(&texts);
            println!("{}", serde_json::to_string_pretty(&predictions)?);
        }
    }
    Ok(())
}
