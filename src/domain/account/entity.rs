//! Account entity and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Account identifier, nil until the durable store assigns one
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The "not yet persisted" identifier
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

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::precondition(format!("Invalid account id '{}': {}", s, e)))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    None,
    Admin,
    User,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Unset; defaulted to `Active` on creation
    #[default]
    None,
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// User account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    username: String,
    email: String,
    role: String,
    account_type: AccountType,
    status: AccountStatus,
    first_name: String,
    last_name: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Create an unsaved account draft
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: AccountId::nil(),
            username: username.into(),
            email: email.into(),
            role: String::new(),
            account_type: AccountType::None,
            status: AccountStatus::None,
            first_name: String::new(),
            last_name: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // Builders

    pub fn with_id(mut self, id: AccountId) -> Self {
        self.id = id;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Restore persisted timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    // Getters

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Drop any caller-supplied identity so the store assigns a new one
    pub fn clear_id(&mut self) {
        self.id = AccountId::nil();
    }

    pub fn set_id(&mut self, id: AccountId) {
        self.id = id;
    }

    /// Replace the base profile fields
    pub fn set_base(&mut self, tags: Vec<String>, first_name: String, last_name: String) {
        self.tags = tags;
        self.first_name = first_name;
        self.last_name = last_name;
        self.touch();
    }

    pub fn set_status(&mut self, status: AccountStatus) {
        self.status = status;
        self.touch();
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = role.into();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_unsaved() {
        let account = Account::new("john.doe1", "john@example.com");

        assert!(account.id().is_nil());
        assert_eq!(account.status(), AccountStatus::None);
        assert_eq!(account.account_type(), AccountType::None);
        assert_eq!(account.created_at(), account.updated_at());
    }

    #[test]
    fn test_clear_id() {
        let mut account =
            Account::new("john.doe1", "john@example.com").with_id(AccountId::generate());
        assert!(!account.id().is_nil());

        account.clear_id();
        assert!(account.id().is_nil());
    }

    #[test]
    fn test_mutators_touch_updated_at() {
        let mut account = Account::new("john.doe1", "john@example.com");
        let original_updated = account.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(10));

        account.set_role("editor");
        assert_eq!(account.role(), "editor");
        assert!(account.updated_at() > original_updated);
    }

    #[test]
    fn test_set_base_replaces_profile_fields() {
        let mut account = Account::new("john.doe1", "john@example.com")
            .with_names("John", "Doe")
            .with_tags(vec!["old".to_string()]);

        account.set_base(vec!["new".to_string()], "Jane".to_string(), String::new());

        assert_eq!(account.tags(), ["new".to_string()]);
        assert_eq!(account.first_name(), "Jane");
        assert_eq!(account.last_name(), "");
        assert_eq!(account.username(), "john.doe1");
    }

    #[test]
    fn test_account_id_parse() {
        let id = AccountId::generate();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        assert!("not-a-uuid".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_account_id_serializes_as_canonical_string() {
        let id = AccountId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_status_and_type_strings() {
        assert_eq!(AccountStatus::parse("suspended"), Some(AccountStatus::Suspended));
        assert_eq!(AccountStatus::Active.as_str(), "active");
        assert_eq!(AccountStatus::parse("unknown"), None);
        assert_eq!(AccountType::parse("admin"), Some(AccountType::Admin));
        assert_eq!(AccountType::User.as_str(), "user");
    }

    #[test]
    fn test_timestamps_serialize_as_instants() {
        let account = Account::new("john.doe1", "john@example.com");
        let json = serde_json::to_value(&account).unwrap();

        assert!(json["created_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["status"], "none");
    }
}
