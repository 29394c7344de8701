//! Churn pipeline CLI
//!
//! Runs the whole batch job or any single stage, and prints stored
//! predictions.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::inference::PredictionBatch;
use crate::pipeline::Pipeline;
use crate::training::TrainingOutcome;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churn-pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch customer churn prediction pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Overrides applied on top of the config file
#[derive(Args, Debug, Default)]
pub struct PathArgs {
    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Labelled customer CSV read by ingest
    #[arg(long, global = true)]
    pub raw_data: Option<PathBuf>,

    /// Unlabelled customer CSV scored by predict
    #[arg(long, global = true)]
    pub new_customers: Option<PathBuf>,

    /// Root directory of the artifact store
    #[arg(long, global = true)]
    pub artifact_root: Option<PathBuf>,
}

impl PathArgs {
    /// Defaults, then the config file, then the flags
    pub fn resolve(&self) -> crate::error::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(path) = &self.raw_data {
            config.raw_data_path = path.clone();
        }
        if let Some(path) = &self.new_customers {
            config.new_customers_path = path.clone();
        }
        if let Some(root) = &self.artifact_root {
            config.artifact_root = root.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run ingest, transform, train and predict in order (default)
    Run,

    /// Load the raw customer table into the store
    Ingest,

    /// Fit the feature transform and encode the raw data
    Transform,

    /// Train the candidate classifiers and keep the best
    Train,

    /// Score new customers and append to the prediction history
    Predict,

    /// Show stored predictions, newest first
    History {
        /// Maximum rows to print
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(config: PipelineConfig) -> anyhow::Result<()> {
    section("Run");
    let pipeline = Pipeline::new(config);

    let start = Instant::now();
    let report = pipeline.run()?;

    for (stage, secs) in &report.stage_timings {
        println!("  {} {:<12} {}", ok("✓"), stage.to_string(), dim(&format!("{:.2}s", secs)));
    }
    print_outcome(&report.training);
    print_batch(&report.predictions);
    kv("Rows ingested", &report.ingested_rows.to_string());
    kv("Features", &report.n_features.to_string());
    kv("Total", &format!("{:.2}s", start.elapsed().as_secs_f64()));
    println!();
    Ok(())
}

pub fn cmd_ingest(config: PipelineConfig) -> anyhow::Result<()> {
    section("Ingest");
    let pipeline = Pipeline::new(config);

    step_run(&format!("Reading {}", pipeline.config().raw_data_path.display()));
    let raw = pipeline.ingest()?;
    step_done(&format!("{} rows × {} cols", raw.frame.height(), raw.frame.width()));
    println!();
    Ok(())
}

pub fn cmd_transform(config: PipelineConfig) -> anyhow::Result<()> {
    section("Transform");
    let pipeline = Pipeline::new(config);

    step_run("Fitting feature transform");
    let start = Instant::now();
    let (dataset, fitted) = pipeline.transform()?;
    step_done(&format!("{:?}", start.elapsed()));

    kv("Rows", &fitted.fitted_rows().to_string());
    kv(
        "Features",
        &format!(
            "{} ({} indicators)",
            dataset.n_features(),
            fitted.encoder().total_width()
        ),
    );
    kv("Categorical", &fitted.categorical_columns().join(", "));
    kv("Numeric", &fitted.numeric_columns().join(", "));
    kv("Scaler", &format!("{:?}", fitted.scaler().scaler_type()));
    kv("Churners", &dataset.positives().to_string());
    println!();
    Ok(())
}

pub fn cmd_train(config: PipelineConfig) -> anyhow::Result<()> {
    section("Train");
    let pipeline = Pipeline::new(config);

    step_run("Training candidates");
    let start = Instant::now();
    let outcome = pipeline.train()?;
    step_done(&format!("{:?}", start.elapsed()));

    print_outcome(&outcome);
    println!();
    Ok(())
}

pub fn cmd_predict(config: PipelineConfig) -> anyhow::Result<()> {
    section("Predict");
    let pipeline = Pipeline::new(config);

    step_run(&format!("Scoring {}", pipeline.config().new_customers_path.display()));
    let batch = pipeline.predict()?;
    step_done(&format!("{} rows appended", batch.len()));

    print_batch(&batch);
    println!();
    Ok(())
}

pub fn cmd_history(config: PipelineConfig, limit: usize) -> anyhow::Result<()> {
    section("Prediction history");
    let history = Pipeline::new(config).prediction_history()?;

    println!(
        "  {:<20} {:>5} {:>11}  {}",
        muted("customer"),
        muted("label"),
        muted("probability"),
        muted("date")
    );
    for row in history.latest_first().into_iter().take(limit) {
        println!(
            "  {:<20} {:>5} {:>11.4}  {}",
            row.customer_id,
            row.predicted_label,
            row.probability,
            dim(&row.prediction_date)
        );
    }
    println!();
    kv("Stored rows", &history.len().to_string());
    println!();
    Ok(())
}

fn print_outcome(outcome: &TrainingOutcome) {
    println!();
    println!(
        "  {:<22} {:>9} {:>9} {:>9} {:>9}",
        muted("candidate"),
        muted("accuracy"),
        muted("f1"),
        muted("auc"),
        muted("time")
    );
    let selected = outcome.selected.kind().name();
    for eval in &outcome.evaluations {
        let marker = if eval.candidate == selected { ok("●") } else { dim("○") };
        println!(
            "  {} {:<20} {:>9.4} {:>9.4} {:>9.4} {:>8.2}s",
            marker, eval.candidate, eval.accuracy, eval.f1, eval.auc, eval.training_time_secs
        );
    }
    for failure in &outcome.failures {
        println!("  {} {}", "✗".red(), dim(failure));
    }
    println!();
    kv("Selected", &selected.cyan().to_string());
}

fn print_batch(batch: &PredictionBatch) {
    println!();
    for row in batch.rows().iter().take(5) {
        println!(
            "  {:<20} {} {}",
            row.customer_id,
            if row.predicted_label == 1 { "churn".yellow() } else { "stay ".green() },
            dim(&format!("{:.4}", row.probability))
        );
    }
    if batch.len() > 5 {
        println!("  {}", dim(&format!("… {} more", batch.len() - 5)));
    }
    println!();
    kv("Predicted", &batch.len().to_string());
    kv("Churners", &batch.churners().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "churn-pipeline",
            "--artifact-root",
            "/tmp/store",
            "history",
            "--limit",
            "3",
        ]);
        let config = cli.paths.resolve().unwrap();
        assert_eq!(config.artifact_root, PathBuf::from("/tmp/store"));
        assert_eq!(config.raw_data_path, PathBuf::from("data/raw/churn.csv"));
        assert!(matches!(cli.command, Some(Commands::History { limit: 3 })));
    }

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::parse_from(["churn-pipeline"]);
        assert!(cli.command.is_none());
    }
}
