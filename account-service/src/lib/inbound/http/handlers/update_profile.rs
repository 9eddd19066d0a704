use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::account::errors::AccountError;
use crate::account::models::AvatarUrl;
use crate::account::models::UpdateProfileCommand;
use crate::account::models::Username;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::handlers::AccountResponseData;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedAccount;
use crate::inbound::http::router::AppState;

/// HTTP request body for updating a profile (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub avatar_url: Option<String>,
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, AccountError> {
        let username = Username::new(self.username)?;

        // An empty string leaves the current avatar untouched
        let avatar_url = self
            .avatar_url
            .filter(|avatar_url| !avatar_url.is_empty())
            .map(AvatarUrl::new)
            .transpose()?;

        Ok(UpdateProfileCommand {
            username,
            avatar_url,
        })
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedAccount>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<AccountResponseData>, ApiError> {
    let command = req.try_into_command()?;

    state
        .account_service
        .update_profile(&authenticated.account_id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}
