//! Subscription handlers.

use axum::extract::{Path, State};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::AuthUser;
use crate::models::{ApiResponse, SubscriptionToggle};

/// POST /api/v1/subscriptions/c/:channel_id: subscribe, or unsubscribe if already subscribed.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Path(channel_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<ApiResponse<SubscriptionToggle>, AppError> {
    let toggle = state.subscriptions().toggle(user_id, channel_id).await?;
    let message = if toggle.subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(toggle, message))
}
