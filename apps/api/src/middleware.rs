use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use campora_core::{AppError, UserId, UserIdentity};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Shared-secret header checked on every protected route.
pub const API_TOKEN_HEADER: &str = "x-api-token";
/// Authenticated principal id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Display name of the authenticated principal.
pub const USER_NAME_HEADER: &str = "x-user-name";
/// Email of the authenticated principal.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Requires the shared API token and the authenticated principal headers
/// set by the upstream gateway, and injects the resulting identity as a
/// request extension.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let headers = request.headers();

    let token = header_value(headers, API_TOKEN_HEADER)?
        .ok_or_else(|| AppError::Unauthorized("missing API token".to_owned()))?;
    if token != state.api_token {
        return Err(AppError::Unauthorized("invalid API token".to_owned()).into());
    }

    let user_id = header_value(headers, USER_ID_HEADER)?
        .ok_or_else(|| AppError::Unauthorized("missing authenticated user id".to_owned()))?;
    let user_id = Uuid::parse_str(user_id)
        .map(UserId::from_uuid)
        .map_err(|error| AppError::Unauthorized(format!("invalid user id header: {error}")))?;

    let display_name = header_value(headers, USER_NAME_HEADER)?
        .unwrap_or_default()
        .to_owned();
    let email = header_value(headers, USER_EMAIL_HEADER)?.map(ToOwned::to_owned);

    let identity = UserIdentity::new(user_id, display_name, email);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_| {
                ApiError(AppError::Unauthorized(format!(
                    "header '{name}' is not valid UTF-8"
                )))
            })
        })
        .transpose()
}
