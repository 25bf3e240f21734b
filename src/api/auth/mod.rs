//! Authentication endpoint
//!
//! Verifies a password against the active credential of the account named
//! by username or email. No session or token is issued.

use std::fmt;

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;

use crate::api::accounts::AccountResponse;
use crate::api::middleware::Actor;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::account::IdentityHint;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Login request; username wins over email when both are set
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// POST /auth/login
///
/// Returns the authenticated account. Every failure is a 401 with the same
/// message.
pub async fn login(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let hint = IdentityHint {
        username: request.username,
        email: request.email,
    };

    let account = state
        .account_service
        .authenticate(&actor, &hint, &request.password)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_hides_password() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"jane@example.com","password":"s3cretpass"}"#)
                .unwrap();

        let printed = format!("{:?}", request);
        assert!(!printed.contains("s3cretpass"));
        assert!(printed.contains("jane@example.com"));
        assert!(request.username.is_none());
    }
}
