//! Default seed script - wipes the board tables and reloads them from JSON
//!
//! Run with:
//! ```
//! cargo run -p seed-data --bin seed
//! ```

use board::store::PgStore;
use seed_data::config::SeedConfig;
use seed_data::db::Seeder;
use seed_data::sources::JsonDirSource;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SeedConfig::from_env();

    let store = PgStore::connect(&config.database_url, config.max_connections).await?;

    tracing::info!("Connected to database");

    let source = JsonDirSource::new(&config.data_dir);
    tracing::info!("Reading seed data from {}", source.dir().display());

    let seeder = Seeder::from_config(source, &config);

    match seeder.run_to_completion(&store).await {
        Ok(report) => {
            // Summary output
            tracing::info!("Seed completed!");
            for (kind, count) in &report.counts {
                tracing::info!("  {}: {}", kind, count);
            }
            Ok(())
        }
        Err(e) => {
            match e.kind() {
                Some(kind) => tracing::error!(%kind, "Seed failed: {e}"),
                None => tracing::error!("Seed failed: {e}"),
            }
            Err(e.into())
        }
    }
}
