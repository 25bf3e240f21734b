//! Database migrations for the account schema

use async_trait::async_trait;
use sqlx::Executor;
use sqlx::postgres::PgPool;

use crate::domain::DomainError;

/// Trait for running database migrations
#[async_trait]
pub trait Migrator: Send + Sync {
    /// Runs all pending migrations
    async fn run(&self) -> Result<(), DomainError>;

    /// Reverts the last applied migration
    async fn revert(&self) -> Result<(), DomainError>;

    /// Returns the current migration version
    async fn version(&self) -> Result<Option<i64>, DomainError>;
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL applied on upgrade; may hold several statements
    pub up: String,
    /// SQL applied on revert
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
    migrations: Vec<Migration>,
}

impl PostgresMigrator {
    /// Migrator over the embedded account schema
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, account_migrations())
    }

    pub fn with_migrations(pool: PgPool, migrations: Vec<Migration>) -> Self {
        Self { pool, migrations }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Applies a single migration and records it in one transaction
    pub async fn run_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.step(migration, Direction::Up).await
    }

    /// Reverts a single migration and forgets it in one transaction
    pub async fn revert_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.step(migration, Direction::Down).await
    }

    async fn step(&self, migration: &Migration, direction: Direction) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        let applied = self.is_applied(migration.version).await?;
        let (sql, bookkeeping) = match direction {
            Direction::Up if !applied => (
                &migration.up,
                "INSERT INTO _migrations (version, description) VALUES ($1, $2)",
            ),
            Direction::Down if applied => {
                (&migration.down, "DELETE FROM _migrations WHERE version = $1")
            }
            _ => return Ok(()),
        };

        let failed = |stage: &str, e: sqlx::Error| {
            DomainError::storage(format!(
                "Migration {} ({}) failed to {}: {}",
                migration.version,
                direction.as_str(),
                stage,
                e
            ))
        };

        let mut tx = self.pool.begin().await.map_err(|e| failed("begin", e))?;

        (&mut *tx)
            .execute(sqlx::raw_sql(sql))
            .await
            .map_err(|e| failed("execute", e))?;

        let mut record = sqlx::query(bookkeeping).bind(migration.version);
        if let Direction::Up = direction {
            record = record.bind(&migration.description);
        }

        record
            .execute(&mut *tx)
            .await
            .map_err(|e| failed("record", e))?;

        tx.commit().await.map_err(|e| failed("commit", e))?;

        tracing::info!(
            version = migration.version,
            description = %migration.description,
            direction = direction.as_str(),
            "Migration step finished"
        );

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[async_trait]
impl Migrator for PostgresMigrator {
    async fn run(&self) -> Result<(), DomainError> {
        for migration in &self.migrations {
            self.run_migration(migration).await?;
        }

        Ok(())
    }

    async fn revert(&self) -> Result<(), DomainError> {
        let Some(current) = self.version().await? else {
            return Ok(());
        };

        match self.migrations.iter().find(|m| m.version == current) {
            Some(migration) => self.revert_migration(migration).await,
            None => Err(DomainError::storage(format!(
                "Applied migration {} is unknown to this build",
                current
            ))),
        }
    }

    async fn version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations WHERE success = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// Embedded account schema
pub fn account_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create accounts table",
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY,
                username VARCHAR(254) NOT NULL,
                email VARCHAR(254) NOT NULL,
                role VARCHAR(64) NOT NULL DEFAULT '',
                account_type VARCHAR(16) NOT NULL DEFAULT 'none',
                status VARCHAR(16) NOT NULL DEFAULT 'none',
                first_name VARCHAR(100) NOT NULL DEFAULT '',
                last_name VARCHAR(100) NOT NULL DEFAULT '',
                tags JSONB NOT NULL DEFAULT '[]'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT accounts_username_key UNIQUE (username),
                CONSTRAINT accounts_email_key UNIQUE (email)
            );
            CREATE INDEX IF NOT EXISTS idx_accounts_created_at ON accounts(created_at);
            "#,
            r#"
            DROP TABLE IF EXISTS accounts;
            "#,
        ),
        Migration::new(
            2,
            "Create credentials table",
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                id UUID PRIMARY KEY,
                account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                password_hash TEXT NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'none',
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_credentials_account_id ON credentials(account_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_credentials_one_active
                ON credentials(account_id) WHERE status = 'active';
            "#,
            r#"
            DROP TABLE IF EXISTS credentials;
            "#,
        ),
    ]
}
