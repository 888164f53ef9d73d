use anyhow::Context;
use clap::{Parser, Subcommand};

use bookstore_kernel::settings::Settings;

/// Operate the bookstore service
#[derive(Debug, Parser)]
#[command(name = "bookstore-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Create missing tables and exit
    Migrate,
    /// Print the resolved configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;

    match cli.command {
        Command::Serve => {
            bookstore_telemetry::init(&settings.telemetry)?;
            bookstore_app::run(&settings).await
        }
        Command::Migrate => {
            bookstore_telemetry::init(&settings.telemetry)?;
            bookstore_app::migrate(&settings).await?;
            tracing::info!("migration complete");
            Ok(())
        }
        Command::Config => {
            let mut shown = settings.clone();
            shown.database.url = bookstore_db::redact(&settings.database.url);
            let rendered = serde_json::to_string_pretty(&shown)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
