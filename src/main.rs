use anyhow::Result;
use clap::Parser;
use tracing::error;

use competitor_overlap::cli::{Cli, Commands};
use competitor_overlap::commands::{self, AppContext};
use competitor_overlap::infrastructure::AppConfig;
use competitor_overlap::infrastructure::logging::{init_logging_with_config, log_system_info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    init_logging_with_config(config.logging.clone())?;
    log_system_info();

    let ctx = AppContext::build(config).await?;

    let outcome = match cli.command {
        Commands::Run { inputs, email, job_id } => commands::run_jobs(&ctx, inputs, email, job_id).await,
        Commands::Status { job_id } => commands::show_status(&ctx, &job_id).await,
        Commands::CacheStats => commands::cache_stats(&ctx).await,
        Commands::CacheCleanup => commands::cache_cleanup(&ctx).await,
        Commands::Compare { client, competitor } => commands::compare_sites(&ctx, &client, &competitor).await,
        Commands::JobStats { job_id } => commands::job_stats(&ctx, &job_id).await,
    };

    if let Err(e) = &outcome {
        error!("{:#}", e);
    }
    outcome
}
