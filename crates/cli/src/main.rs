use anyhow::Context;
use biblio_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Book catalog service and maintenance commands
#[derive(Debug, Parser)]
#[command(name = "biblio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the REST service until Ctrl+C / SIGTERM
    Serve,
    /// Print the effective configuration as JSON
    Config,
    /// Check that the configured document store is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load biblio settings")?;

    match cli.command {
        Command::Serve => {
            biblio_telemetry::init(&settings.telemetry)?;
            biblio_app::run(settings).await
        }
        Command::Config => {
            settings.database.uri = settings.database.redacted_uri();
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Ping => {
            biblio_telemetry::init(&settings.telemetry)?;
            let store = biblio_db::connect(&settings.database)
                .await
                .context("failed to open document store")?;
            let outcome = store.ping().await;
            store.close().await.context("failed to close document store")?;
            outcome.with_context(|| {
                format!("{} store is not reachable", store.backend())
            })?;

            tracing::info!(backend = store.backend(), "document store reachable");
            println!("ok: {} store reachable", store.backend());
            Ok(())
        }
    }
}
