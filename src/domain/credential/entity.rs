//! Credential entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::AccountId;

/// Credential record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(Uuid);

impl CredentialId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CredentialId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    #[default]
    None,
    Active,
    Inactive,
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Password digest owned by exactly one account
///
/// Only the digest is ever held here; plaintext never reaches this type.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    id: CredentialId,
    account_id: AccountId,
    password_hash: String,
    status: CredentialStatus,
    updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(account_id: AccountId, password_hash: impl Into<String>) -> Self {
        Self {
            id: CredentialId::nil(),
            account_id,
            password_hash: password_hash.into(),
            status: CredentialStatus::None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: CredentialId) -> Self {
        self.id = id;
        self
    }

    pub fn with_status(mut self, status: CredentialStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn id(&self) -> &CredentialId {
        &self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn status(&self) -> CredentialStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Only active credentials may ever pass verification
    pub fn is_active(&self) -> bool {
        self.status == CredentialStatus::Active
    }

    pub fn set_id(&mut self, id: CredentialId) {
        self.id = id;
    }

    pub fn set_status(&mut self, status: CredentialStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("password_hash", &"***")
            .field("status", &self.status)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
