use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Book catalogue service")]
struct Cli {
    /// Override the database URL from configuration
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations and serve the HTTP API
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    if let Some(url) = cli.database_url {
        settings.database.url = url;
    }

    bookshelf_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        command = ?cli.command,
        "bookshelf CLI starting"
    );

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookshelf_app::app::run(settings).await
        }
        Command::Migrate => {
            bookshelf_app::app::migrate(settings).await?;
            tracing::info!("migrations applied");
            Ok(())
        }
    }
}
