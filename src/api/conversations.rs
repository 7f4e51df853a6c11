use crate::api::AppState;
use crate::api::middleware::JsonBody;
use crate::api::schemas::conversations::{CleanupFailureBody, CleanupRequest, CleanupResponse};
use crate::config::OrphanedMessagePolicy;
use crate::error::AppError;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Any top-level failure of the cleanup trigger, reported as `{ success: false, error }`.
#[derive(Debug)]
pub struct CleanupFailure(AppError);

impl From<AppError> for CleanupFailure {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl IntoResponse for CleanupFailure {
    fn into_response(self) -> Response {
        match &self.0 {
            AppError::NotAuthenticated | AppError::BadRequest(_) => {
                tracing::debug!(error = %self.0, "Duplicate cleanup rejected");
            }
            e => tracing::error!(error = %e, "Duplicate cleanup failed"),
        }

        let body = CleanupFailureBody { success: false, error: self.0.public_message() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Removes duplicate conversations for the calling user.
///
/// Responds 200 whenever the scan succeeds, even if some deletions failed; the
/// body carries per-group detail and the failure count.
///
/// An unreadable body carries no usable caller identity and is treated like a
/// missing one.
///
/// # Errors
/// Returns `CleanupFailure` when the caller identity is missing or the scan fails.
pub async fn cleanup_duplicates(
    State(state): State<AppState>,
    payload: Result<JsonBody<CleanupRequest>, AppError>,
) -> Result<Json<CleanupResponse>, CleanupFailure> {
    let JsonBody(payload) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable cleanup request");
        AppError::NotAuthenticated
    })?;
    let user_id = payload.user_id.ok_or(AppError::NotAuthenticated)?;

    let mut options = state.duplicate_resolver.default_options();
    options.dry_run = payload.dry_run;
    if let Some(reassign) = payload.reassign_messages {
        options.orphaned_messages =
            if reassign { OrphanedMessagePolicy::Reassign } else { OrphanedMessagePolicy::Retain };
    }

    let report = state.duplicate_resolver.resolve(&user_id, options).await?;

    Ok(Json(report.into()))
}
