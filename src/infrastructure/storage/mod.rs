//! Storage infrastructure - PostgreSQL pool and schema

pub mod migrations;
mod postgres;

pub use migrations::{account_migrations, Migration, Migrator, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig};
