//! Domain layer - Accounts, credentials and the contracts of their collaborators

pub mod account;
pub mod audit;
pub mod cache;
pub mod credential;
pub mod error;

pub use error::DomainError;
