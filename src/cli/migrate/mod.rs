//! Migrate command - applies or reverts the PostgreSQL account schema

use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{Migrator, PostgresMigrator};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,
}

/// Run migrations against `database.url`
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let pool = crate::connect_postgres(&config.database).await?;
    let migrator = PostgresMigrator::new(pool);

    if args.revert {
        migrator.revert().await?;
    } else {
        migrator.run().await?;
    }

    let version = migrator.version().await?;
    info!(version = ?version, "Schema migrations complete");

    Ok(())
}
