//! API middleware components

pub mod actor;

pub use actor::{Actor, ACTOR_ID_HEADER};
