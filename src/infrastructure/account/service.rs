//! Account service composing validation, uniqueness checks, storage and
//! credential handling

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::domain::account::{
    validate_account_structure, validate_email, validate_password, validate_password_structure,
    validate_username, Account, AccountConflict, AccountFilter, AccountId, AccountMatch,
    AccountResultSet, AccountStatus, AccountStore,
};
use crate::domain::audit::{ActorId, AuditRecord, AuditSink};
use crate::domain::credential::{Credential, CredentialCache, CredentialStatus};
use crate::domain::DomainError;
use crate::infrastructure::credential::CredentialCacheAside;
use crate::infrastructure::deadline::with_deadline;
use crate::infrastructure::observability::{
    record_account_operation, record_authentication, Outcome,
};

use super::password::CredentialHasher;

/// Hashed once per service and verified against for unknown identities
const DECOY_PLAINTEXT: &str = "decoy-credential-never-issued";

/// Replacement base profile fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountBasePatch {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// New account status
#[derive(Debug, Clone, Deserialize)]
pub struct AccountStatusPatch {
    pub status: AccountStatus,
}

/// New account role
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRolePatch {
    pub role: String,
}

/// Plaintext password for an account; never printed
#[derive(Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("password", &"***")
            .finish()
    }
}

/// Identity supplied at login; empty strings count as absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityHint {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl IdentityHint {
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: None,
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            username: None,
            email: Some(email.into()),
        }
    }

    fn resolve_filter(&self) -> Option<AccountFilter> {
        let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_string);

        match (present(&self.username), present(&self.email)) {
            (Some(username), _) => Some(AccountFilter::by_username(username)),
            (None, Some(email)) => Some(AccountFilter::by_email(email)),
            (None, None) => None,
        }
    }
}

/// Specific reason behind a generic authentication failure
#[derive(Debug)]
enum AuthFailure {
    MissingIdentity,
    UnknownIdentity,
    AmbiguousIdentity(usize),
    LookupFailed(DomainError),
    CredentialUnavailable(DomainError),
    CredentialInactive(CredentialStatus),
    PasswordMismatch,
    HashingFailed(DomainError),
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "username and email are empty"),
            Self::UnknownIdentity => write!(f, "no account matches the supplied identity"),
            Self::AmbiguousIdentity(n) => {
                write!(f, "{} accounts match a uniqueness-guaranteed identity", n)
            }
            Self::LookupFailed(e) => write!(f, "account lookup failed: {}", e),
            Self::CredentialUnavailable(e) => write!(f, "credential unavailable: {}", e),
            Self::CredentialInactive(status) => {
                write!(f, "credential is not active (status {})", status.as_str())
            }
            Self::PasswordMismatch => write!(f, "password does not match"),
            Self::HashingFailed(e) => write!(f, "password verification failed: {}", e),
        }
    }
}

/// Account service
///
/// Holds no mutable state of its own; every operation takes the acting
/// identity explicitly and records one audit entry on failure.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    credentials: CredentialCacheAside,
    hasher: Arc<dyn CredentialHasher>,
    audit: Arc<dyn AuditSink>,
    call_timeout: Duration,
    decoy_digest: OnceCell<String>,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("credentials", &self.credentials)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        cache: Arc<dyn CredentialCache>,
        hasher: Arc<dyn CredentialHasher>,
        audit: Arc<dyn AuditSink>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            credentials: CredentialCacheAside::new(store.clone(), cache, call_timeout),
            store,
            hasher,
            audit,
            call_timeout,
            decoy_digest: OnceCell::new(),
        }
    }

    /// Create an account from a draft
    ///
    /// Any caller-supplied id is discarded. Email conflicts are reported
    /// before username conflicts.
    pub async fn create_account(
        &self,
        actor: &ActorId,
        draft: Account,
    ) -> Result<Account, DomainError> {
        let result = self.try_create_account(draft).await;
        self.finish("create_account", actor, result)
    }

    async fn try_create_account(&self, mut draft: Account) -> Result<Account, DomainError> {
        draft.clear_id();

        validate_account_structure(&draft)?;
        validate_username(draft.username())?;
        validate_email(draft.email())?;

        if !self.find(AccountFilter::by_email(draft.email())).await?.is_empty() {
            return Err(AccountConflict::EmailAlreadyExists.into());
        }

        if !self
            .find(AccountFilter::by_username(draft.username()))
            .await?
            .is_empty()
        {
            return Err(AccountConflict::UsernameAlreadyExists.into());
        }

        if draft.status() == AccountStatus::None {
            draft.set_status(AccountStatus::Active);
        }

        let account = self.save(draft).await?;

        tracing::info!(account_id = %account.id(), username = %account.username(), "Account created");

        Ok(account)
    }

    /// Replace tags, first name and last name
    pub async fn update_account_base(
        &self,
        actor: &ActorId,
        id: AccountId,
        patch: AccountBasePatch,
    ) -> Result<Account, DomainError> {
        let result = self
            .update_with("update_account_base", id, move |account| {
                account.set_base(patch.tags, patch.first_name, patch.last_name)
            })
            .await;
        self.finish("update_account_base", actor, result)
    }

    pub async fn update_account_status(
        &self,
        actor: &ActorId,
        id: AccountId,
        patch: AccountStatusPatch,
    ) -> Result<Account, DomainError> {
        let result = self
            .update_with("update_account_status", id, move |account| {
                account.set_status(patch.status)
            })
            .await;
        self.finish("update_account_status", actor, result)
    }

    pub async fn update_account_role(
        &self,
        actor: &ActorId,
        id: AccountId,
        patch: AccountRolePatch,
    ) -> Result<Account, DomainError> {
        let result = self
            .update_with("update_account_role", id, move |account| {
                account.set_role(patch.role)
            })
            .await;
        self.finish("update_account_role", actor, result)
    }

    /// Re-read, apply one field group, re-validate and persist
    ///
    /// Username and email are never touched here, so uniqueness is not
    /// re-checked.
    async fn update_with<F>(
        &self,
        operation: &'static str,
        id: AccountId,
        apply: F,
    ) -> Result<Account, DomainError>
    where
        F: FnOnce(&mut Account),
    {
        require_id(operation, &id)?;

        let mut account = self.load_one(id).await?;
        apply(&mut account);
        validate_account_structure(&account)?;

        self.save(account).await
    }

    /// Delete an account, its credential and the cached credential
    ///
    /// Once the account row is gone the cache entry is always evicted, even
    /// when the credential delete fails. The first failure is returned.
    pub async fn delete_account(
        &self,
        actor: &ActorId,
        id: AccountId,
    ) -> Result<Account, DomainError> {
        let result = self.try_delete_account(id).await;
        self.finish("delete_account", actor, result)
    }

    async fn try_delete_account(&self, id: AccountId) -> Result<Account, DomainError> {
        require_id("delete_account", &id)?;

        let deleted = with_deadline("store.delete", self.call_timeout, self.store.delete(&id)).await?;

        let credential_deleted = with_deadline(
            "store.delete_credential",
            self.call_timeout,
            self.store.delete_credential(&id),
        )
        .await;
        let evicted = self.credentials.evict(&id).await;

        credential_deleted?;
        evicted?;

        tracing::info!(account_id = %id, "Account deleted");

        Ok(deleted)
    }

    /// Hash and store a new active credential, replacing any previous one
    pub async fn change_password(
        &self,
        actor: &ActorId,
        account_id: AccountId,
        request: ChangePasswordRequest,
    ) -> Result<(), DomainError> {
        let result = self.try_change_password(account_id, request).await;
        self.finish("change_password", actor, result)
    }

    async fn try_change_password(
        &self,
        account_id: AccountId,
        request: ChangePasswordRequest,
    ) -> Result<(), DomainError> {
        require_id("change_password", &account_id)?;

        validate_password_structure(&request.password)?;
        validate_password(&request.password)?;

        let digest = self.hash(request.password).await?;
        let credential =
            Credential::new(account_id, digest).with_status(CredentialStatus::Active);

        self.credentials.set_credential(credential).await?;

        tracing::info!(account_id = %account_id, "Password changed");

        Ok(())
    }

    /// Resolve an identity and verify its password
    ///
    /// Resolves by username when one is given, otherwise by email. Every
    /// failure is reported as `AuthenticationFailed`; the real reason is
    /// only logged and audited.
    pub async fn authenticate(
        &self,
        actor: &ActorId,
        hint: &IdentityHint,
        password: &str,
    ) -> Result<Account, DomainError> {
        match self.try_authenticate(hint, password).await {
            Ok(account) => {
                record_authentication(Outcome::Success);
                tracing::info!(account_id = %account.id(), "Authentication succeeded");
                Ok(account)
            }
            Err(failure) => {
                record_authentication(Outcome::Failure);

                match &failure {
                    AuthFailure::AmbiguousIdentity(_) => {
                        tracing::error!(actor_id = %actor, reason = %failure, "Authentication failed on inconsistent account data")
                    }
                    _ => tracing::warn!(actor_id = %actor, reason = %failure, "Authentication failed"),
                }

                self.audit
                    .record(AuditRecord::error("authenticate", actor, failure.to_string()));

                Err(DomainError::AuthenticationFailed)
            }
        }
    }

    async fn try_authenticate(
        &self,
        hint: &IdentityHint,
        password: &str,
    ) -> Result<Account, AuthFailure> {
        let filter = hint.resolve_filter().ok_or(AuthFailure::MissingIdentity)?;

        let account = match self.find(filter).await.map_err(AuthFailure::LookupFailed)?.into_match() {
            AccountMatch::One(account) => account,
            AccountMatch::None => {
                self.verify_decoy(password).await;
                return Err(AuthFailure::UnknownIdentity);
            }
            AccountMatch::Many(n) => return Err(AuthFailure::AmbiguousIdentity(n)),
        };

        let credential = self
            .credentials
            .get_active_credential(account.id())
            .await
            .map_err(AuthFailure::CredentialUnavailable)?;

        if !credential.is_active() {
            return Err(AuthFailure::CredentialInactive(credential.status()));
        }

        let verified = self
            .verify(credential.password_hash().to_string(), password.to_string())
            .await
            .map_err(AuthFailure::HashingFailed)?;

        if !verified {
            return Err(AuthFailure::PasswordMismatch);
        }

        Ok(account)
    }

    /// Query accounts; an unconstrained filter is rejected
    pub async fn find_accounts(
        &self,
        actor: &ActorId,
        filter: AccountFilter,
    ) -> Result<AccountResultSet, DomainError> {
        let result = if filter.is_unconstrained() {
            Err(DomainError::precondition(
                "Account filter must set at least one field or match all",
            ))
        } else {
            self.find(filter).await
        };

        self.finish("find_accounts", actor, result)
    }

    /// Read the active credential of an account through the cache
    pub async fn get_active_credential(
        &self,
        actor: &ActorId,
        account_id: AccountId,
    ) -> Result<Credential, DomainError> {
        let result = match require_id("get_active_credential", &account_id) {
            Ok(()) => self.credentials.get_active_credential(&account_id).await,
            Err(e) => Err(e),
        };

        self.finish("get_active_credential", actor, result)
    }

    /// Probe the store and the cache
    pub async fn check_dependencies(&self) -> Result<(), DomainError> {
        self.check_store().await?;
        self.check_cache().await
    }

    /// One bounded read against the durable store
    pub async fn check_store(&self) -> Result<(), DomainError> {
        self.find(AccountFilter::all().with_limit(1)).await.map(|_| ())
    }

    pub async fn check_cache(&self) -> Result<(), DomainError> {
        self.credentials.ping().await
    }

    async fn find(&self, filter: AccountFilter) -> Result<AccountResultSet, DomainError> {
        with_deadline(
            "store.find_by_filter",
            self.call_timeout,
            self.store.find_by_filter(&filter),
        )
        .await
    }

    async fn save(&self, account: Account) -> Result<Account, DomainError> {
        with_deadline("store.save", self.call_timeout, self.store.save(account)).await
    }

    async fn load_one(&self, id: AccountId) -> Result<Account, DomainError> {
        match self.find(AccountFilter::by_id(id)).await?.into_match() {
            AccountMatch::One(account) => Ok(account),
            AccountMatch::None => Err(DomainError::not_found(format!("Account '{}' not found", id))),
            AccountMatch::Many(n) => {
                tracing::error!(account_id = %id, matches = n, "Account id resolved to multiple records");
                Err(DomainError::internal_consistency(format!(
                    "Account id '{}' matched {} records",
                    id, n
                )))
            }
        }
    }

    async fn hash(&self, plaintext: String) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();

        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| DomainError::internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify(&self, digest: String, plaintext: String) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();

        tokio::task::spawn_blocking(move || hasher.verify(&digest, &plaintext))
            .await
            .map_err(|e| DomainError::internal(format!("Verification task failed: {}", e)))
    }

    /// Pay for one verification so unknown identities cost as much as known ones
    async fn verify_decoy(&self, password: &str) {
        let digest = match self
            .decoy_digest
            .get_or_try_init(|| self.hash(DECOY_PLAINTEXT.to_string()))
            .await
        {
            Ok(digest) => digest.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to prepare decoy digest");
                return;
            }
        };

        if let Err(e) = self.verify(digest, password.to_string()).await {
            tracing::warn!(error = %e, "Decoy verification failed");
        }
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        actor: &ActorId,
        result: Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        record_account_operation(operation, Outcome::from_result(&result));

        if let Err(e) = &result {
            tracing::debug!(operation, actor_id = %actor, error = %e, "Account operation failed");
            self.audit
                .record(AuditRecord::error(operation, actor, e.to_string()));
        }

        result
    }
}

fn require_id(operation: &'static str, id: &AccountId) -> Result<(), DomainError> {
    if id.is_nil() {
        tracing::warn!(operation, "Rejected request without account id");
        return Err(DomainError::precondition("Account id is required"));
    }

    Ok(())
}
