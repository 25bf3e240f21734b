//! Infrastructure layer - Stores, caches, hashing and the account service

pub mod account;
pub mod audit;
pub mod cache;
pub mod credential;
pub mod deadline;
pub mod logging;
pub mod observability;
pub mod storage;
