//! Profile handlers: current user, account details, images, channel page.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::media::{StagedFile, UploadStaging};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{ApiResponse, ChannelProfile, ProfileImage, PublicUser};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(max = 255))]
    pub full_name: String,
    #[validate(length(max = 255))]
    pub email: String,
}

/// GET /api/v1/users/current-user
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = state.profiles().current_user(user_id).await?;
    Ok(ApiResponse::ok(user, "User fetched successfully"))
}

/// PATCH /api/v1/users/update-account
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<UpdateAccountRequest>, AppError>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    body.validate()?;
    let user = state
        .profiles()
        .update_account(user_id, &body.full_name, &body.email)
        .await?;
    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

/// PATCH /api/v1/users/avatar (multipart `avatar`)
pub async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    update_image(&state, user_id, ProfileImage::Avatar, multipart).await
}

/// PATCH /api/v1/users/cover-image (multipart `coverImage`)
pub async fn update_cover_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    update_image(&state, user_id, ProfileImage::CoverImage, multipart).await
}

async fn update_image(
    state: &AppState,
    user_id: uuid::Uuid,
    slot: ProfileImage,
    multipart: Multipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let file = stage_named_file(state.staging(), multipart, slot.field_name()).await?;
    let user = state.profiles().update_image(user_id, slot, file).await?;
    Ok(ApiResponse::ok(
        user,
        format!("{} updated successfully", slot.label()),
    ))
}

/// Stage the first field called `name`; other fields are skipped.
async fn stage_named_file(
    staging: &UploadStaging,
    mut multipart: Multipart,
    name: &str,
) -> Result<Option<StagedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some(name) {
            return Ok(Some(staging.stage_field(field).await?));
        }
    }
    Ok(None)
}

/// GET /api/v1/users/c/:username
pub async fn channel_profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    WithRejection(Path(username), _): WithRejection<Path<String>, AppError>,
) -> Result<ApiResponse<ChannelProfile>, AppError> {
    let profile = state.profiles().channel_profile(&username, viewer).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}
