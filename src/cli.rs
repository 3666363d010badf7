use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "competitor-overlap")]
#[command(about = "Classify client/competitor site pairs by shared product categories", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file layered over config/default and the built-in defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one or more spreadsheets and print each job's terminal status
    Run {
        /// Spreadsheets with client_site / competitors_site columns
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Address for the completion notice
        #[arg(short, long)]
        email: Option<String>,

        /// Explicit job id (single input only)
        #[arg(long)]
        job_id: Option<String>,
    },

    /// Print the stored status of a job
    Status {
        job_id: String,
    },

    /// Print category cache counts
    CacheStats,

    /// Remove expired cache entries once
    CacheCleanup,

    /// Scrape two sites and print the ranked matches and classification
    Compare {
        #[arg(long)]
        client: String,

        #[arg(long)]
        competitor: String,
    },

    /// Outcome counts for a processed job
    JobStats {
        job_id: String,
    },
}
