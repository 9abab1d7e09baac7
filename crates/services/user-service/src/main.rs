//! `user-service` binary: `serve` runs the users API, `migrate` manages the schema.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use user_service_lib::{run_migrations, run_server, MigrateAction};

#[derive(Parser)]
#[command(name = "user-service", version, about = "User registration and search over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the users API
    Serve {
        #[arg(long, env = "USER_SERVICE_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "USER_SERVICE_PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Apply or inspect schema migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

/// `RUST_LOG` wins; otherwise `info`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    match Cli::parse().command {
        Command::Serve { host, port } => run_server(&host, port).await,
        Command::Migrate { action } => run_migrations(action).await,
    }
}
