//! Request and response envelope types

pub mod error;
pub mod json;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
