//! Churn pipeline entry point

use churn_pipeline::cli::{
    cmd_history, cmd_ingest, cmd_predict, cmd_run, cmd_train, cmd_transform, Cli, Commands,
};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_pipeline=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.paths.resolve()?;

    match cli.command {
        None | Some(Commands::Run) => cmd_run(config)?,
        Some(Commands::Ingest) => cmd_ingest(config)?,
        Some(Commands::Transform) => cmd_transform(config)?,
        Some(Commands::Train) => cmd_train(config)?,
        Some(Commands::Predict) => cmd_predict(config)?,
        Some(Commands::History { limit }) => cmd_history(config, limit)?,
    }

    Ok(())
}
