//! Credential infrastructure - Cache-aside coordination

mod coordinator;

pub use coordinator::CredentialCacheAside;
