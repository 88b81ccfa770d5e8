//! Auth HTTP handlers: register, login, logout, refresh-token, change-password.

use axum::{
    extract::{Multipart, State},
    Json,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::auth::{clear_session_cookies, set_session_cookies, TokenPair, REFRESH_TOKEN_COOKIE};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::{ApiResponse, PublicUser};
use crate::services::{Credentials, Registration};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 255))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(max = 128))]
    pub old_password: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub new_password: String,
}

/// POST /api/v1/users/register (multipart)
pub async fn register(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let mut form = Registration::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "avatar" => form.avatar = Some(state.staging().stage_field(field).await?),
            "coverImage" => form.cover_image = Some(state.staging().stage_field(field).await?),
            "fullName" | "fullname" | "email" | "username" | "password" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
                match name.as_str() {
                    "email" => form.email = value,
                    "username" => form.username = value,
                    "password" => form.password = value,
                    _ => form.full_name = value,
                }
            }
            _ => {}
        }
    }

    let user = state.auth().register(form).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    body.validate()?;

    let outcome = state
        .auth()
        .login(Credentials {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    let jar = set_session_cookies(jar, &outcome.tokens);
    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: outcome.user,
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// POST /api/v1/users/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>), AppError> {
    state.auth().logout(user_id).await?;
    Ok((
        clear_session_cookies(jar),
        ApiResponse::ok(json!({}), "User logged out"),
    ))
}

/// POST /api/v1/users/refresh-token: token from the cookie, else from the JSON body.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<TokenPair>), AppError> {
    let incoming = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token));

    let pair = state.auth().refresh(incoming.as_deref()).await?;
    let jar = set_session_cookies(jar, &pair);
    Ok((jar, ApiResponse::ok(pair, "Access token refreshed")))
}

/// POST /api/v1/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<ChangePasswordRequest>, AppError>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    body.validate()?;
    state
        .auth()
        .change_password(user_id, &body.old_password, &body.new_password)
        .await?;
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}
