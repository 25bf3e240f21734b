//! Account management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::Actor;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::account::{Account, AccountFilter, AccountId, AccountStatus, AccountType};
use crate::infrastructure::account::{
    AccountBasePatch, AccountRolePatch, AccountStatusPatch, ChangePasswordRequest,
};

/// Create the account router
pub fn create_accounts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(find_accounts).post(create_account))
        .route("/{account_id}", delete(delete_account))
        .route("/{account_id}/base", put(update_account_base))
        .route("/{account_id}/status", put(update_account_status))
        .route("/{account_id}/role", put(update_account_role))
        .route("/{account_id}/password", put(change_password))
}

/// Request to create an account
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateAccountRequest {
    fn into_draft(self) -> Account {
        Account::new(self.username, self.email)
            .with_role(self.role)
            .with_account_type(self.account_type)
            .with_status(self.status)
            .with_names(self.first_name, self.last_name)
            .with_tags(self.tags)
    }
}

/// Account as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub account_type: AccountType,
    pub status: AccountStatus,
    pub first_name: String,
    pub last_name: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            username: account.username().to_string(),
            email: account.email().to_string(),
            role: account.role().to_string(),
            account_type: account.account_type(),
            status: account.status(),
            first_name: account.first_name().to_string(),
            last_name: account.last_name().to_string(),
            tags: account.tags().to_vec(),
            created_at: account.created_at().to_rfc3339(),
            updated_at: account.updated_at().to_rfc3339(),
        }
    }
}

/// Query string accepted by `GET /accounts`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindAccountsQuery {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub account_type: Option<String>,
    pub role: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    /// List every account when no other field is set
    #[serde(default)]
    pub all: bool,
}

impl FindAccountsQuery {
    fn into_filter(self) -> Result<AccountFilter, ApiError> {
        let mut filter = if self.all {
            AccountFilter::all()
        } else {
            AccountFilter::default()
        };

        if let Some(id) = self.id {
            filter.id = Some(parse_account_id(&id)?);
        }

        if let Some(status) = self.status {
            filter.status = Some(AccountStatus::parse(&status).ok_or_else(|| {
                ApiError::bad_request(format!("Unknown account status '{}'", status))
                    .with_param("status")
            })?);
        }

        if let Some(account_type) = self.account_type {
            filter.account_type = Some(AccountType::parse(&account_type).ok_or_else(|| {
                ApiError::bad_request(format!("Unknown account type '{}'", account_type))
                    .with_param("account_type")
            })?);
        }

        filter.username = self.username;
        filter.email = self.email;
        filter.role = self.role;
        filter.limit = self.limit;
        filter.offset = self.offset;

        Ok(filter)
    }
}

/// Page of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAccountsResponse {
    pub accounts: Vec<AccountResponse>,
    pub total: usize,
}

fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse::<AccountId>()
        .map_err(|e| ApiError::from(e).with_param("account_id"))
}

/// POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    debug!(actor = %actor, username = %request.username, "Creating account");

    let account = state
        .account_service
        .create_account(&actor, request.into_draft())
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// GET /accounts
pub async fn find_accounts(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<FindAccountsQuery>,
) -> Result<Json<ListAccountsResponse>, ApiError> {
    let filter = query.into_filter()?;
    debug!(actor = %actor, ?filter, "Finding accounts");

    let result = state.account_service.find_accounts(&actor, filter).await?;

    Ok(Json(ListAccountsResponse {
        accounts: result.accounts.iter().map(AccountResponse::from).collect(),
        total: result.total,
    }))
}

/// PUT /accounts/{account_id}/base
pub async fn update_account_base(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(account_id): Path<String>,
    Json(patch): Json<AccountBasePatch>,
) -> Result<Json<AccountResponse>, ApiError> {
    let id = parse_account_id(&account_id)?;
    debug!(actor = %actor, account_id = %id, "Updating account base fields");

    let account = state
        .account_service
        .update_account_base(&actor, id, patch)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /accounts/{account_id}/status
pub async fn update_account_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(account_id): Path<String>,
    Json(patch): Json<AccountStatusPatch>,
) -> Result<Json<AccountResponse>, ApiError> {
    let id = parse_account_id(&account_id)?;
    debug!(actor = %actor, account_id = %id, status = patch.status.as_str(), "Updating account status");

    let account = state
        .account_service
        .update_account_status(&actor, id, patch)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /accounts/{account_id}/role
pub async fn update_account_role(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(account_id): Path<String>,
    Json(patch): Json<AccountRolePatch>,
) -> Result<Json<AccountResponse>, ApiError> {
    let id = parse_account_id(&account_id)?;
    debug!(actor = %actor, account_id = %id, role = %patch.role, "Updating account role");

    let account = state
        .account_service
        .update_account_role(&actor, id, patch)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

/// DELETE /accounts/{account_id}
pub async fn delete_account(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let id = parse_account_id(&account_id)?;
    debug!(actor = %actor, account_id = %id, "Deleting account");

    let account = state.account_service.delete_account(&actor, id).await?;

    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /accounts/{account_id}/password
pub async fn change_password(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(account_id): Path<String>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_account_id(&account_id)?;
    debug!(actor = %actor, account_id = %id, "Changing account password");

    state
        .account_service
        .change_password(&actor, id, request)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
