//! PostgreSQL account store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::account::{
    Account, AccountConflict, AccountFilter, AccountId, AccountResultSet, AccountStatus,
    AccountStore, AccountType,
};
use crate::domain::credential::{Credential, CredentialId, CredentialStatus};
use crate::domain::DomainError;

const ACCOUNT_COLUMNS: &str = "id, username, email, role, account_type, status, first_name, \
                               last_name, tags, created_at, updated_at";

const USERNAME_CONSTRAINT: &str = "accounts_username_key";
const EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// PostgreSQL implementation of AccountStore
///
/// Uniqueness of username and email is backed by table constraints; a
/// violation surfaces as the same conflict the service pre-flight reports.
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &AccountFilter) {
    query.push(" WHERE TRUE");

    if let Some(id) = filter.id {
        query.push(" AND id = ").push_bind(*id.as_uuid());
    }
    if let Some(username) = &filter.username {
        query.push(" AND username = ").push_bind(username.clone());
    }
    if let Some(email) = &filter.email {
        query.push(" AND email = ").push_bind(email.clone());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(account_type) = filter.account_type {
        query.push(" AND account_type = ").push_bind(account_type.as_str());
    }
    if let Some(role) = &filter.role {
        query.push(" AND role = ").push_bind(role.clone());
    }
}

/// Map a unique constraint name to the conflict it represents
fn conflict_for_constraint(constraint: &str) -> Option<AccountConflict> {
    match constraint {
        USERNAME_CONSTRAINT => Some(AccountConflict::UsernameAlreadyExists),
        EMAIL_CONSTRAINT => Some(AccountConflict::EmailAlreadyExists),
        _ => None,
    }
}

fn map_write_error(e: sqlx::Error, context: &str) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(conflict) = db_err.constraint().and_then(conflict_for_constraint) {
                return DomainError::Conflict(conflict);
            }
        }

        if db_err.is_foreign_key_violation() {
            return DomainError::not_found(format!("{}: account does not exist", context));
        }
    }

    DomainError::storage(format!("{}: {}", context, e))
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn find_by_filter(&self, filter: &AccountFilter) -> Result<AccountResultSet, DomainError> {
        if filter.is_unconstrained() {
            return Err(DomainError::precondition(
                "Account filter must set at least one field or match all",
            ));
        }

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filter(&mut count, filter);

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count accounts: {}", e)))?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS));
        push_filter(&mut select, filter);
        select.push(" ORDER BY created_at, id");

        if let Some(limit) = filter.limit {
            select.push(" LIMIT ").push_bind(limit as i64);
        }
        select.push(" OFFSET ").push_bind(filter.offset as i64);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to find accounts: {}", e)))?;

        let accounts = rows
            .iter()
            .map(row_to_account)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AccountResultSet::new(accounts, total as usize))
    }

    async fn save(&self, mut account: Account) -> Result<Account, DomainError> {
        if account.id().is_nil() {
            account.set_id(AccountId::generate());
        }
        account.touch();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts (id, username, email, role, account_type, status,
                                  first_name, last_name, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username, email = EXCLUDED.email, role = EXCLUDED.role,
                account_type = EXCLUDED.account_type, status = EXCLUDED.status,
                first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name,
                tags = EXCLUDED.tags, updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(*account.id().as_uuid())
        .bind(account.username())
        .bind(account.email())
        .bind(account.role())
        .bind(account.account_type().as_str())
        .bind(account.status().as_str())
        .bind(account.first_name())
        .bind(account.last_name())
        .bind(Json(account.tags()))
        .bind(account.created_at())
        .bind(account.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to save account"))?;

        row_to_account(&row)
    }

    async fn delete(&self, id: &AccountId) -> Result<Account, DomainError> {
        let row = sqlx::query(&format!(
            "DELETE FROM accounts WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete account: {}", e)))?;

        match row {
            Some(row) => row_to_account(&row),
            None => Err(DomainError::not_found(format!("Account '{}' not found", id))),
        }
    }

    async fn get_active_credential(
        &self,
        account_id: &AccountId,
    ) -> Result<Credential, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, password_hash, status, updated_at
            FROM credentials
            WHERE account_id = $1 AND status = 'active'
            "#,
        )
        .bind(*account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get credential: {}", e)))?;

        match row {
            Some(row) => row_to_credential(&row),
            None => Err(DomainError::not_found(format!(
                "No active credential for account '{}'",
                account_id
            ))),
        }
    }

    async fn save_credential(&self, credential: Credential) -> Result<Credential, DomainError> {
        let mut credential = credential.with_updated_at(Utc::now());
        if credential.id().is_nil() {
            credential.set_id(CredentialId::generate());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query("DELETE FROM credentials WHERE account_id = $1")
            .bind(*credential.account_id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to replace credential: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO credentials (id, account_id, password_hash, status, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*credential.id().as_uuid())
        .bind(*credential.account_id().as_uuid())
        .bind(credential.password_hash())
        .bind(credential.status().as_str())
        .bind(credential.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to save credential"))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit credential: {}", e)))?;

        Ok(credential)
    }

    async fn delete_credential(&self, account_id: &AccountId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM credentials WHERE account_id = $1")
            .bind(*account_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete credential: {}", e)))?;

        Ok(())
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, DomainError> {
    let id: Uuid = row.get("id");
    let username: String = row.get("username");
    let email: String = row.get("email");
    let role: String = row.get("role");
    let account_type: String = row.get("account_type");
    let status: String = row.get("status");
    let first_name: String = row.get("first_name");
    let last_name: String = row.get("last_name");
    let tags: Json<Vec<String>> = row.get("tags");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let account_type = AccountType::parse(&account_type).ok_or_else(|| {
        DomainError::storage(format!("Invalid account type in database: {}", account_type))
    })?;
    let status = AccountStatus::parse(&status)
        .ok_or_else(|| DomainError::storage(format!("Invalid account status in database: {}", status)))?;

    Ok(Account::new(username, email)
        .with_id(AccountId::from(id))
        .with_role(role)
        .with_account_type(account_type)
        .with_status(status)
        .with_names(first_name, last_name)
        .with_tags(tags.0)
        .with_timestamps(created_at, updated_at))
}

fn row_to_credential(row: &PgRow) -> Result<Credential, DomainError> {
    let id: Uuid = row.get("id");
    let account_id: Uuid = row.get("account_id");
    let password_hash: String = row.get("password_hash");
    let status: String = row.get("status");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let status = CredentialStatus::parse(&status).ok_or_else(|| {
        DomainError::storage(format!("Invalid credential status in database: {}", status))
    })?;

    Ok(Credential::new(AccountId::from(account_id), password_hash)
        .with_id(CredentialId::from(id))
        .with_status(status)
        .with_updated_at(updated_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::{connect_pool, Migrator, PostgresConfig, PostgresMigrator};

    #[test]
    fn test_conflict_for_constraint() {
        assert_eq!(
            conflict_for_constraint("accounts_username_key"),
            Some(AccountConflict::UsernameAlreadyExists)
        );
        assert_eq!(
            conflict_for_constraint("accounts_email_key"),
            Some(AccountConflict::EmailAlreadyExists)
        );
        assert_eq!(conflict_for_constraint("accounts_pkey"), None);
    }

    #[test]
    fn test_filter_sql() {
        let filter = AccountFilter::by_username("john.doe1").with_status(AccountStatus::Active);
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filter(&mut query, &filter);

        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM accounts WHERE TRUE AND username = $1 AND status = $2"
        );
    }

    #[test]
    fn test_match_all_filter_sql_has_no_predicates() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filter(&mut query, &AccountFilter::all());

        assert_eq!(query.sql(), "SELECT COUNT(*) FROM accounts WHERE TRUE");
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_round_trip_against_database() {
        let pool = connect_pool(&PostgresConfig::new("postgres://localhost/accounts_test"))
            .await
            .unwrap();
        PostgresMigrator::new(pool.clone()).run().await.unwrap();

        let store = PostgresAccountStore::new(pool);
        let username = format!("pg.user{}", &Uuid::new_v4().simple().to_string()[..8]);
        let email = format!("{}@example.com", username);

        let saved = store.save(Account::new(&username, &email)).await.unwrap();
        let duplicate = store.save(Account::new("other.user1", &email)).await;
        assert!(matches!(
            duplicate,
            Err(DomainError::Conflict(AccountConflict::EmailAlreadyExists))
        ));

        store
            .save_credential(
                Credential::new(*saved.id(), "digest").with_status(CredentialStatus::Active),
            )
            .await
            .unwrap();
        assert!(store.get_active_credential(saved.id()).await.is_ok());

        store.delete(saved.id()).await.unwrap();
        assert!(store.get_active_credential(saved.id()).await.is_err());
    }
}
