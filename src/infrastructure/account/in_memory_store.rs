//! In-memory account store implementation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::account::{
    Account, AccountConflict, AccountFilter, AccountId, AccountResultSet, AccountStore,
};
use crate::domain::credential::{Credential, CredentialId};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct StoreState {
    accounts: HashMap<AccountId, Account>,
    /// At most one credential per account
    credentials: HashMap<AccountId, Credential>,
}

/// In-memory implementation of AccountStore
///
/// Enforces the same uniqueness rules as the relational schema so the
/// service can be exercised without a database.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    state: RwLock<StoreState>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(state: &StoreState, account: &Account) -> Result<(), AccountConflict> {
    for existing in state.accounts.values() {
        if existing.id() == account.id() {
            continue;
        }

        if existing.email() == account.email() {
            return Err(AccountConflict::EmailAlreadyExists);
        }

        if existing.username() == account.username() {
            return Err(AccountConflict::UsernameAlreadyExists);
        }
    }

    Ok(())
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_filter(&self, filter: &AccountFilter) -> Result<AccountResultSet, DomainError> {
        if filter.is_unconstrained() {
            return Err(DomainError::precondition(
                "Account filter must set at least one field or match all",
            ));
        }

        let state = self.state.read().await;

        let mut matched: Vec<&Account> = state
            .accounts
            .values()
            .filter(|account| filter.is_match_all() || filter.matches(account))
            .collect();

        matched.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(AccountResultSet::new(page, total))
    }

    async fn save(&self, mut account: Account) -> Result<Account, DomainError> {
        let mut state = self.state.write().await;

        if account.id().is_nil() {
            account.set_id(AccountId::generate());
        }

        check_unique(&state, &account)?;

        account.touch();
        state.accounts.insert(*account.id(), account.clone());

        Ok(account)
    }

    async fn delete(&self, id: &AccountId) -> Result<Account, DomainError> {
        let mut state = self.state.write().await;

        let removed = state
            .accounts
            .remove(id)
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", id)))?;

        state.credentials.remove(id);

        Ok(removed)
    }

    async fn get_active_credential(
        &self,
        account_id: &AccountId,
    ) -> Result<Credential, DomainError> {
        let state = self.state.read().await;

        state
            .credentials
            .get(account_id)
            .filter(|credential| credential.is_active())
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "No active credential for account '{}'",
                    account_id
                ))
            })
    }

    async fn save_credential(&self, credential: Credential) -> Result<Credential, DomainError> {
        let mut state = self.state.write().await;

        if !state.accounts.contains_key(credential.account_id()) {
            return Err(DomainError::not_found(format!(
                "Account '{}' not found",
                credential.account_id()
            )));
        }

        let mut credential = credential.with_updated_at(Utc::now());
        if credential.id().is_nil() {
            credential.set_id(CredentialId::generate());
        }

        state
            .credentials
            .insert(*credential.account_id(), credential.clone());

        Ok(credential)
    }

    async fn delete_credential(&self, account_id: &AccountId) -> Result<(), DomainError> {
        self.state.write().await.credentials.remove(account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountStatus, AccountType};
    use crate::domain::credential::CredentialStatus;

    async fn saved(store: &InMemoryAccountStore, username: &str, email: &str) -> Account {
        store.save(Account::new(username, email)).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_id() {
        let store = InMemoryAccountStore::new();

        let account = saved(&store, "john.doe1", "john@example.com").await;

        assert!(!account.id().is_nil());
        let found = store
            .find_by_filter(&AccountFilter::by_id(*account.id()))
            .await
            .unwrap();
        assert_eq!(found.total, 1);
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_email_and_username() {
        let store = InMemoryAccountStore::new();
        saved(&store, "john.doe1", "john@example.com").await;

        let email = store
            .save(Account::new("jane.doe1", "john@example.com"))
            .await;
        assert!(matches!(
            email,
            Err(DomainError::Conflict(AccountConflict::EmailAlreadyExists))
        ));

        let username = store
            .save(Account::new("john.doe1", "jane@example.com"))
            .await;
        assert!(matches!(
            username,
            Err(DomainError::Conflict(AccountConflict::UsernameAlreadyExists))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_own_identity_fields() {
        let store = InMemoryAccountStore::new();
        let mut account = saved(&store, "john.doe1", "john@example.com").await;

        account.set_status(AccountStatus::Suspended);
        let updated = store.save(account.clone()).await.unwrap();

        assert_eq!(updated.id(), account.id());
        assert_eq!(updated.status(), AccountStatus::Suspended);
    }

    #[tokio::test]
    async fn test_unconstrained_filter_is_rejected() {
        let store = InMemoryAccountStore::new();

        let result = store.find_by_filter(&AccountFilter::default()).await;
        assert!(matches!(result, Err(DomainError::Precondition { .. })));
    }

    #[tokio::test]
    async fn test_find_all_with_paging() {
        let store = InMemoryAccountStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let created = base + chrono::Duration::seconds(i);
            store
                .save(
                    Account::new(format!("user.name{}", i), format!("u{}@example.com", i))
                        .with_timestamps(created, created),
                )
                .await
                .unwrap();
        }

        let page = store
            .find_by_filter(&AccountFilter::all().with_offset(1).with_limit(2))
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.accounts.len(), 2);
        assert_eq!(page.accounts[0].username(), "user.name1");
    }

    #[tokio::test]
    async fn test_find_by_type() {
        let store = InMemoryAccountStore::new();
        store
            .save(Account::new("admin.user1", "admin@example.com").with_account_type(AccountType::Admin))
            .await
            .unwrap();
        saved(&store, "john.doe1", "john@example.com").await;

        let admins = store
            .find_by_filter(&AccountFilter::default().with_account_type(AccountType::Admin))
            .await
            .unwrap();

        assert_eq!(admins.total, 1);
        assert_eq!(admins.accounts[0].username(), "admin.user1");
    }

    #[tokio::test]
    async fn test_delete_missing_account() {
        let store = InMemoryAccountStore::new();

        let result = store.delete(&AccountId::generate()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_credential_replaced_wholesale() {
        let store = InMemoryAccountStore::new();
        let account = saved(&store, "john.doe1", "john@example.com").await;

        store
            .save_credential(Credential::new(*account.id(), "first").with_status(CredentialStatus::Active))
            .await
            .unwrap();
        store
            .save_credential(Credential::new(*account.id(), "second").with_status(CredentialStatus::Active))
            .await
            .unwrap();

        let active = store.get_active_credential(account.id()).await.unwrap();
        assert_eq!(active.password_hash(), "second");
        assert!(!active.id().is_nil());
    }

    #[tokio::test]
    async fn test_inactive_credential_is_not_found() {
        let store = InMemoryAccountStore::new();
        let account = saved(&store, "john.doe1", "john@example.com").await;

        store
            .save_credential(Credential::new(*account.id(), "digest").with_status(CredentialStatus::Inactive))
            .await
            .unwrap();

        let result = store.get_active_credential(account.id()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_credential_for_unknown_account() {
        let store = InMemoryAccountStore::new();

        let result = store
            .save_credential(Credential::new(AccountId::generate(), "digest"))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_credential_is_idempotent() {
        let store = InMemoryAccountStore::new();
        let account = saved(&store, "john.doe1", "john@example.com").await;

        assert!(store.delete_credential(account.id()).await.is_ok());
        assert!(store.delete_credential(account.id()).await.is_ok());
    }
}
