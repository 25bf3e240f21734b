//! Durable account store trait

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::entity::{Account, AccountId};
use super::filter::{AccountFilter, AccountResultSet};
use crate::domain::credential::Credential;
use crate::domain::DomainError;

/// Durable store for accounts and their credentials
///
/// Implementations must back username and email uniqueness with a real
/// constraint; the service-level checks are only a pre-flight.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find accounts matching the filter, ordered by creation time
    ///
    /// An unconstrained filter is rejected with a precondition error.
    async fn find_by_filter(&self, filter: &AccountFilter) -> Result<AccountResultSet, DomainError>;

    /// Insert (nil id) or update an account, returning the stored record
    async fn save(&self, account: Account) -> Result<Account, DomainError>;

    /// Delete an account, returning the removed record
    async fn delete(&self, id: &AccountId) -> Result<Account, DomainError>;

    /// Get the active credential of an account, `NotFound` if there is none
    async fn get_active_credential(&self, account_id: &AccountId)
        -> Result<Credential, DomainError>;

    /// Replace the account's credential wholesale; prior digests are discarded
    async fn save_credential(&self, credential: Credential) -> Result<Credential, DomainError>;

    /// Delete every credential of an account; none present is not an error
    async fn delete_credential(&self, account_id: &AccountId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_account_store() {
        let mut mock = MockAccountStore::new();

        mock.expect_find_by_filter()
            .returning(|_| Ok(AccountResultSet::empty()));

        let result = mock
            .find_by_filter(&AccountFilter::by_username("john.doe1"))
            .await;
        assert!(result.unwrap().is_empty());
    }
}
