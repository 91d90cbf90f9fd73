// Gaitfold command line entry point
// Parses flags over an optional JSON config and runs the experiment sweep

use std::path::PathBuf;

use clap::Parser;
use gaitfold_lib::channels::{LateralityMode, Modality, ModalitySet};
use gaitfold_lib::classify::ClassifierKind;
use gaitfold_lib::events::LabelScheme;
use gaitfold_lib::features::Representation;
use gaitfold_lib::state::{self, storage};
use gaitfold_lib::{run_sweep, DatasetSource, ExperimentConfig};

#[derive(Parser, Debug)]
#[command(name = "gaitfold", about = "Cross-validated locomotion-mode classification from gait trials")]
struct Cli {
    /// Classifier strategy: lda or svm
    #[arg(long)]
    classifier: Option<ClassifierKind>,

    /// Sensor modalities to use (imu, emg, goin)
    #[arg(long, num_args = 1..)]
    sensors: Option<Vec<Modality>>,

    /// Evaluate every non-empty subset of the sensor set
    #[arg(long)]
    all_comb: bool,

    /// Channel laterality: bilateral, ipsilateral or contralateral
    #[arg(long)]
    laterality: Option<LateralityMode>,

    /// Load the saved example checkpoint instead of rebuilding from trials
    #[arg(long)]
    data_skip: bool,

    /// JSON experiment config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the subject trial directories
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Root for results, checkpoints and the run ledger
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of cross-validation folds
    #[arg(long)]
    folds: Option<usize>,

    /// Seed for fold shuffling and SVM sample order
    #[arg(long)]
    seed: Option<u64>,

    /// Use raw time-series windows instead of mel spectrograms
    #[arg(long)]
    time_series: bool,

    /// Label scheme: terminal (6 classes) or prior-terminal (36 classes)
    #[arg(long, value_parser = parse_label_scheme)]
    label_scheme: Option<LabelScheme>,
}

fn parse_label_scheme(s: &str) -> Result<LabelScheme, String> {
    LabelScheme::from_string(s).ok_or_else(|| format!("unknown label scheme: {}", s))
}

impl Cli {
    fn apply(&self, config: &mut ExperimentConfig) {
        if let Some(classifier) = self.classifier {
            config.evaluation.classifier = classifier;
        }
        if let Some(sensors) = &self.sensors {
            config.dataset.modalities = ModalitySet::new(sensors.iter().copied());
        }
        if let Some(laterality) = self.laterality {
            config.dataset.laterality = laterality;
        }
        if let Some(dir) = &self.data_dir {
            config.dataset.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(folds) = self.folds {
            config.evaluation.folds = folds;
        }
        if let Some(seed) = self.seed {
            config.evaluation.seed = seed;
        }
        if self.time_series {
            config.dataset.representation = Representation::TimeSeries;
        }
        if let Some(scheme) = self.label_scheme {
            config.dataset.label_scheme = scheme;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaitfold=info".into()),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let root = storage::output_root(config.output_dir.as_deref())?;
    let db = state::init_db(&storage::ledger_path(&root))?;
    config.output_dir = Some(root);

    let source = if cli.data_skip {
        DatasetSource::LoadCheckpoint
    } else {
        DatasetSource::Rebuild
    };

    log::info!("gaitfold v{} starting", env!("CARGO_PKG_VERSION"));
    let outcomes = run_sweep(&config, source, &db, cli.all_comb)?;

    for outcome in &outcomes {
        log::info!(
            "{}: {} examples, report at {}",
            outcome.stem,
            outcome.example_count,
            outcome.report_path.display()
        );
    }

    Ok(())
}
