//! WooCommerce migration CLI - Upload exported orders to Shopify.
//!
//! # Usage
//!
//! ```bash
//! # Interactive menu (test upload, full upload, resume, clear progress)
//! woo-migrate
//!
//! # Upload a handful of anonymized test orders
//! woo-migrate test
//!
//! # Full upload, continuing from the progress file without prompting
//! woo-migrate upload --resume --yes
//!
//! # Forget which orders were already uploaded
//! woo-migrate clear-progress
//! ```
//!
//! # Environment Variables
//!
//! See `woo_migrate_uploader::config` for the full list. `RUST_LOG`
//! overrides the default `woo_migrate=info` filter and `LOG_FORMAT=json`
//! switches logs to JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CliError, Session, UploadMode};

#[derive(Parser)]
#[command(name = "woo-migrate")]
#[command(author, version, about = "WooCommerce to Shopify order migration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload anonymized copies of the first few orders
    Test,
    /// Upload every order in the export
    Upload {
        /// Skip orders recorded in the progress file
        #[arg(long, conflicts_with = "fresh")]
        resume: bool,

        /// Clear the progress file and upload everything
        #[arg(long)]
        fresh: bool,
    },
    /// Delete the progress file
    ClearProgress,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "woo_migrate=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let session = Session::start(cli.yes)?;

    match cli.command {
        None => commands::menu::run(&session).await,
        Some(Commands::Test) => {
            let report = commands::upload::test_upload(&session).await?;
            report.map_or(Ok(()), CliError::check_complete)
        }
        Some(Commands::Upload { resume, fresh }) => {
            let mode = if resume {
                Some(UploadMode::Resume)
            } else if fresh {
                Some(UploadMode::Fresh)
            } else {
                None
            };
            let report = commands::upload::full_upload_with_choice(&session, mode).await?;
            report.map_or(Ok(()), CliError::check_complete)
        }
        Some(Commands::ClearProgress) => commands::progress::clear(&session),
    }
}
