use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "slotgrid",
    about = "Slotgrid — value-maximizing time slot allocation",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to slotgrid.toml
    #[arg(short, long, global = true, default_value = "slotgrid.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a slotgrid.toml scaffold with one occurrence
    Init {
        /// Occurrence date (YYYY-MM-DD)
        #[arg(short, long)]
        date: chrono::NaiveDate,
        /// Enable the secondary list for leftovers
        #[arg(long)]
        dual_list: bool,
    },
    /// Register (or re-register) a requester for an occurrence
    Register {
        #[arg(short, long)]
        occurrence: String,
        #[arg(short, long)]
        requester: String,
        /// Declared value; zero registers without competing
        #[arg(short, long)]
        weight: u32,
        /// Comma-separated candidate slots, e.g. 2025-12-04T08:00:00Z,2025-12-04T08:30:00Z
        #[arg(short, long, value_delimiter = ',')]
        slots: Vec<String>,
        /// Register into the secondary list
        #[arg(long)]
        secondary: bool,
    },
    /// Run the occurrence's allocation now, ignoring its ready gate
    Run {
        #[arg(short, long)]
        occurrence: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Run every configured occurrence whose ready time has passed
    Tick,
    /// Show registrations, reservations, and selection state
    Status {
        #[arg(short, long)]
        occurrence: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Compare optimal matching with the greedy baseline (no writes)
    Simulate {
        #[arg(short, long)]
        occurrence: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slotgrid=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { date, dual_list } => commands::init::init(&cli.config, date, dual_list),
        Commands::Register {
            occurrence,
            requester,
            weight,
            slots,
            secondary,
        } => {
            commands::register::register(
                &cli.config,
                &occurrence,
                &requester,
                weight,
                slots,
                secondary,
            )
            .await
        }
        Commands::Run { occurrence, format } => {
            commands::run::run(&cli.config, &occurrence, &format).await
        }
        Commands::Tick => commands::run::tick(&cli.config).await,
        Commands::Status { occurrence, format } => {
            commands::status::status(&cli.config, &occurrence, &format)
        }
        Commands::Simulate { occurrence, format } => {
            commands::simulate::simulate(&cli.config, &occurrence, &format)
        }
    }
}
