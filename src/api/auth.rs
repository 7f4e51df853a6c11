use crate::api::AppState;
use crate::api::middleware::JsonBody;
use crate::api::schemas::auth::SignInRequest;
use crate::domain::user::SignInEvent;
use crate::error::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

/// Sign-in callback from the authentication provider.
///
/// Reconciliation of the user's records runs before responding but its outcome
/// never changes the response.
///
/// # Errors
/// Returns `AppError::BadRequest` if the body is unreadable or carries no uid.
pub async fn sign_in(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignInRequest>,
) -> Result<impl IntoResponse> {
    let event = SignInEvent::from(payload).validate()?;
    state.user_migration_service.reconcile(event).await;
    Ok(StatusCode::NO_CONTENT)
}
