//! `emotion`: serve the emotion API, classify text locally, or fit model artifacts.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use emotion_ai::training::{self, ClassifierKind, TrainingParams};
use emotion_ai::{EmotionModel, VectorizerParams};

mod display;
mod serve;

#[derive(Parser)]
#[command(name = "emotion")]
#[command(about = "Emotion recognition API and model tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(serve::ServeArgs),

    /// Classify one piece of text with a local model
    Predict {
        /// Directory holding the model artifacts
        #[arg(short, long, env = "EMOTION_MODEL_DIR", default_value = ".")]
        model_dir: PathBuf,

        /// Text to classify
        text: String,
    },

    /// Fit model artifacts from a labelled dataset
    Train {
        /// JSON lines of {"text", "emotion"} records, or a .csv with a text
        /// column and one score column per emotion from the fourth column on
        #[arg(short, long)]
        data: PathBuf,

        /// Where to write the artifacts
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Vocabulary size cap
        #[arg(long, default_value = "5000")]
        max_features: usize,

        /// Longest word n-gram
        #[arg(long, default_value = "2")]
        max_ngram: usize,

        /// Naive Bayes smoothing
        #[arg(long, default_value = "0.5")]
        alpha: f64,

        #[arg(long, value_enum, default_value_t = ClassifierArg::NaiveBayes)]
        classifier: ClassifierArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ClassifierArg {
    NaiveBayes,
    NearestCentroid,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::NaiveBayes => ClassifierKind::NaiveBayes,
            ClassifierArg::NearestCentroid => ClassifierKind::NearestCentroid,
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Predict { model_dir, text } => {
            let model = EmotionModel::load(&model_dir)
                .with_context(|| format!("loading model from {}", model_dir.display()))?;
            let prediction = model.predict(&text).context("classifying text")?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
            Ok(())
        }
        Commands::Train {
            data,
            output_dir,
            max_features,
            max_ngram,
            alpha,
            classifier,
        } => {
            let params = TrainingParams {
                vectorizer: VectorizerParams {
                    min_n: 1,
                    max_n: max_ngram,
                    max_features: Some(max_features),
                },
                alpha,
                classifier: classifier.into(),
            };
            run_train(&data, &output_dir, &params)
        }
    }
}

fn run_train(data: &Path, output_dir: &Path, params: &TrainingParams) -> anyhow::Result<()> {
    let samples = training::load_samples(data)
        .with_context(|| format!("reading {}", data.display()))?;
    eprintln!("  Read {} samples from {}", samples.len(), data.display());

    let trained = training::train(&samples, params).context("fitting model")?;
    trained
        .model
        .save(output_dir)
        .with_context(|| format!("writing artifacts to {}", output_dir.display()))?;

    display::print_report(&trained.report, trained.model.classifier().kind());
    display::print_samples(&trained.model).context("classifying sample sentences")?;
    eprintln!("  Artifacts written to {}", output_dir.display());
    Ok(())
}
