use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "nodepool",
    about = "nodepool: worker pool reconciliation against a simulated backend",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Directory holding the status store and the backend snapshot
    #[arg(long, global = true, default_value = ".nodepool")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a request file scaffold
    Init {
        #[arg(long)]
        owner: String,
        #[arg(long, default_value = "eu01")]
        region: String,
        #[arg(short, long, default_value = "worker.toml")]
        output: PathBuf,
    },
    /// Run one reconciliation pass and print the plan.
    ///
    /// The status is persisted even when the pass fails, so the next pass
    /// picks up where this one stopped.
    Reconcile {
        #[arg(short, long, default_value = "worker.toml")]
        config: PathBuf,
        /// Do not persist status or backend changes
        #[arg(long)]
        dry_run: bool,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Delete every affinity group the owner holds and drop its status
    Delete {
        #[arg(long)]
        owner: String,
    },
    /// Print the persisted status of an owner (or list owners)
    Status {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Resolve the machine image of one pool
    ResolveImage {
        #[arg(short, long, default_value = "worker.toml")]
        config: PathBuf,
        #[arg(long)]
        pool: String,
    },
    /// Select the floating pool for a name or pattern
    FloatingPool {
        #[arg(short, long, default_value = "worker.toml")]
        config: PathBuf,
        /// Overrides the request's floating pool name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        domain: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nodepool=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Init { owner, region, output } => {
            commands::init::init(&owner, &region, &output)
        }
        Commands::Reconcile { config, dry_run, format } => {
            commands::reconcile::reconcile(&data_dir, &config, dry_run, &format)
        }
        Commands::Delete { owner } => {
            commands::reconcile::delete(&data_dir, &owner)
        }
        Commands::Status { owner } => {
            commands::reconcile::status(&data_dir, owner.as_deref())
        }
        Commands::ResolveImage { config, pool } => {
            commands::inspect::resolve_image(&data_dir, &config, &pool)
        }
        Commands::FloatingPool { config, name, domain } => {
            commands::inspect::floating_pool(&config, name, domain)
        }
    }
}
