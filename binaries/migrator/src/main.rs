use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use database_traits::{GetDatabaseScope, MigrationHistory};
use seeders::MigrationState;
use sql_connection::{
    MigrationCatalog, PostgresDbConfig, SqlConnect, build_pool,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "migrator")]
#[command(about = "Applies and inspects SQL migrations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, help = "Database URL (or use DATABASE_URL env var)")]
    database_url: Option<String>,

    #[arg(
        long,
        default_value = "migrations",
        help = "Directory holding the *.sql migration files"
    )]
    migrations: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every pending migration
    Up,
    /// Show known, applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.database_url {
        Some(uri) => PostgresDbConfig::new(uri),
        None => PostgresDbConfig::from_env()
            .context("Pass --database-url or set DATABASE_URL")?,
    };

    let catalog = MigrationCatalog::from_dir(&cli.migrations).with_context(|| {
        format!("Failed to load migrations from {}", cli.migrations.display())
    })?;
    info!(
        "Loaded {} migrations from {}",
        catalog.len(),
        cli.migrations.display()
    );

    let pool = build_pool(&config)?;
    let connect = SqlConnect::new(pool, catalog);
    let mut scope = connect.get_scope().await?;
    info!("Connected to database successfully");

    match cli.command {
        Commands::Up => {
            info!("Running all pending migrations...");
            let applied = scope.apply_pending_migrations().await?;
            if applied.is_empty() {
                info!("Database is already up to date");
            }
            else {
                for migration in &applied {
                    info!("  ✓ {}", migration);
                }
                info!("✓ {} migrations completed successfully", applied.len());
            }
        }
        Commands::Status => {
            let state = MigrationState::load(&mut scope).await?;
            if state.applied().is_empty() {
                info!("No migrations have been applied");
            }
            else {
                info!("Applied migrations:");
                for migration in state.applied() {
                    info!("  ✓ {}", migration);
                }
            }

            let pending = state.pending();
            if pending.is_empty() {
                info!("No pending migrations");
            }
            else {
                info!("Pending migrations:");
                for migration in pending {
                    info!("  · {}", migration);
                }
            }
        }
    }

    Ok(())
}
