//! lumpcheck CLI - classifies breast-lump measurements with a fitted
//! scaler and ONNX model.
//!
//! Usage:
//!   lumpcheck predict --model model.onnx --scaler scaler.json --set "radius_mean=18.0" --set "area_mean=1000"
//!   lumpcheck batch --model model.onnx --scaler scaler.json --input lumps.csv --output predictions.csv
//!   lumpcheck batch --model model.onnx --scaler scaler.json --input lumps.xlsx --threshold 0.5 --flag-borderline --format json
//!   lumpcheck features --scaler scaler.json
//!   lumpcheck guide

mod logging;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use lumpcheck_core::features::display_label;
use lumpcheck_core::guide;
use lumpcheck_core::report::{render_batch, render_prediction, OutputFormat};
use lumpcheck_core::{
    FeatureSchema, ModelIo, Predictor, PredictorConfig, StandardScaler, Table, Threshold,
};

#[derive(Parser)]
#[command(name = "lumpcheck")]
#[command(version)]
#[command(about = "Benign/malignant breast-lump classification from diagnostic measurements")]
struct Cli {
    /// Verbose logging (overridden by LUMPCHECK_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one lump from manually entered measurements
    Predict {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Measurement as name=value; repeat per feature, unset features are 0.0
        #[arg(short = 's', long = "set", value_parser = parse_entry)]
        entries: Vec<(String, f64)>,

        /// Malignancy threshold (0.0-1.0)
        #[arg(short, long, default_value = "0.40")]
        threshold: Threshold,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Include benign/malignant findings in the text report
        #[arg(long)]
        guide: bool,
    },

    /// Classify every row of a CSV, TSV or spreadsheet file
    Batch {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Input table
        #[arg(short, long)]
        input: PathBuf,

        /// Write the input plus prediction columns to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Malignancy threshold (0.0-1.0)
        #[arg(short, long, default_value = "0.40")]
        threshold: Threshold,

        /// Add a Borderline column for rows with 55-85% malignant probability
        #[arg(long)]
        flag_borderline: bool,

        /// Output format for the summary
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the features the scaler was fitted with
    Features {
        /// Path to the scaler JSON artifact
        #[arg(long)]
        scaler: PathBuf,
    },

    /// Print the benign/malignant reference guide
    Guide,
}

#[derive(Args, Debug, Clone)]
struct ArtifactArgs {
    /// Path to the ONNX model file
    #[arg(short, long)]
    model: PathBuf,

    /// Path to the scaler JSON artifact
    #[arg(long)]
    scaler: PathBuf,

    /// Name of the model's input tensor
    #[arg(long, default_value = "float_input")]
    input_name: String,

    /// Name of the label output tensor
    #[arg(long, default_value = "output_label")]
    label_output: String,

    /// Name of the probability output tensor
    #[arg(long, default_value = "output_probability")]
    probability_output: String,

    /// The model only predicts labels; skip the threshold decision
    #[arg(long)]
    label_only: bool,
}

impl ArtifactArgs {
    fn config(&self) -> PredictorConfig {
        let io = ModelIo {
            input: self.input_name.clone(),
            label_output: self.label_output.clone(),
            probability_output: Some(self.probability_output.clone()),
        };
        PredictorConfig {
            model_path: self.model.clone(),
            scaler_path: self.scaler.clone(),
            io: if self.label_only { io.label_only() } else { io },
        }
    }

    /// Load both artifacts; failure stops the process before any request.
    fn load(&self) -> Result<Predictor> {
        info!(model = %self.model.display(), scaler = %self.scaler.display(), "loading artifacts");
        Predictor::load(&self.config()).context("startup aborted")
    }
}

/// Parse a `name=value` measurement. The name may contain spaces.
fn parse_entry(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{s}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{}' is not a finite number", value.trim()))?;
    Ok((name.to_string(), value))
}

/// Reject names outside the schema so typos don't silently become 0.0.
fn collect_entries(
    schema: &FeatureSchema,
    entries: Vec<(String, f64)>,
) -> Result<BTreeMap<String, f64>> {
    let unknown: Vec<&str> = entries
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| !schema.contains(name))
        .collect();
    if !unknown.is_empty() {
        bail!(
            "unknown feature(s): {}. Run `lumpcheck features --scaler <path>` for the list.",
            unknown.join(", ")
        );
    }
    Ok(entries.into_iter().collect())
}

fn run_predict(
    artifacts: &ArtifactArgs,
    entries: Vec<(String, f64)>,
    threshold: Threshold,
    format: OutputFormat,
    with_guide: bool,
) -> Result<()> {
    let predictor = artifacts.load()?;
    let entries = collect_entries(predictor.schema(), entries)?;

    let prediction = predictor.predict_manual(&entries, threshold)?;
    println!("{}", render_prediction(&prediction, format, with_guide));
    Ok(())
}

fn run_batch(
    artifacts: &ArtifactArgs,
    input: &Path,
    output: Option<&Path>,
    threshold: Threshold,
    flag_borderline: bool,
    format: OutputFormat,
) -> Result<()> {
    let predictor = artifacts.load()?;

    info!(input = %input.display(), "reading table");
    let table = Table::read_path(input)?;
    let outcome = predictor.run_batch(&table, threshold)?;

    if let Some(path) = output {
        outcome.to_table(flag_borderline)?.write_path(path)?;
        info!(output = %path.display(), rows = table.len(), "predictions written");
    }

    println!("{}", render_batch(&outcome, format));
    Ok(())
}

fn run_features(scaler: &Path) -> Result<()> {
    let scaler = StandardScaler::load(scaler)?;
    println!("Required features ({}):", scaler.n_features());
    for (i, name) in scaler.schema().names().iter().enumerate() {
        println!("  {:>2}. {:<28} {}", i + 1, name, display_label(name));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error_line(&err));
            ExitCode::FAILURE
        }
    }
}

/// One line, outermost context first: `error: startup aborted: cannot load ...`.
fn error_line(err: &anyhow::Error) -> String {
    format!("error: {err:#}")
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Predict {
            artifacts,
            entries,
            threshold,
            format,
            guide,
        } => run_predict(&artifacts, entries, threshold, format, guide),
        Commands::Batch {
            artifacts,
            input,
            output,
            threshold,
            flag_borderline,
            format,
        } => run_batch(
            &artifacts,
            &input,
            output.as_deref(),
            threshold,
            flag_borderline,
            format,
        ),
        Commands::Features { scaler } => run_features(&scaler),
        Commands::Guide => {
            println!("{}", guide::full_text());
            Ok(())
        }
    }
}
