//! Account domain
//!
//! This module provides the account entity, the query descriptor used for
//! lookups and uniqueness checks, the validation rules, and the durable
//! store trait.

mod entity;
mod filter;
mod repository;
mod validation;

use thiserror::Error;

pub use entity::{Account, AccountId, AccountStatus, AccountType};
pub use filter::{AccountFilter, AccountMatch, AccountResultSet};
pub use repository::AccountStore;
pub use validation::{
    validate_account_structure, validate_email, validate_password, validate_password_structure,
    validate_username, AccountValidationError,
};

#[cfg(test)]
pub use repository::MockAccountStore;

/// Uniqueness conflicts reported on account creation
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccountConflict {
    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already exists")]
    UsernameAlreadyExists,
}

impl AccountConflict {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmailAlreadyExists => "email",
            Self::UsernameAlreadyExists => "username",
        }
    }
}
