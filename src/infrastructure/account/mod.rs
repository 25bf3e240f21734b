//! Account infrastructure - Stores, hashing and the account service

mod in_memory_store;
mod password;
mod postgres_store;
mod service;

pub use in_memory_store::InMemoryAccountStore;
pub use password::{Argon2Hasher, CredentialHasher};
pub use postgres_store::PostgresAccountStore;
pub use service::{
    AccountBasePatch, AccountRolePatch, AccountService, AccountStatusPatch,
    ChangePasswordRequest, IdentityHint,
};

#[cfg(test)]
pub use password::MockCredentialHasher;
