//! Access-token extractors: `accessToken` cookie or `Authorization: Bearer`.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::ACCESS_TOKEN_COOKIE;
use crate::error::AppError;
use crate::handlers::http::AppState;

/// Authenticated user ID from a verified access token whose user still exists.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Uuid);

/// Like [`AuthUser`], but anonymous requests (or bad tokens) yield `None`.
#[derive(Clone, Copy, Debug)]
pub struct MaybeAuthUser(pub Option<Uuid>);

async fn access_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }
    TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = access_token(parts, state)
            .await
            .ok_or_else(|| AppError::Auth("Unauthorized request".to_string()))?;

        let claims = state.tokens().verify_access(&token).map_err(|e| {
            debug!(expired = e.is_expired(), "access token rejected");
            AppError::Auth("Invalid access token".to_string())
        })?;

        if state.users().find_by_id(claims.sub).await?.is_none() {
            return Err(AppError::Auth("Invalid access token".to_string()));
        }
        Ok(AuthUser(claims.sub))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(id)) => Ok(MaybeAuthUser(Some(id))),
            Err(AppError::Auth(_)) => Ok(MaybeAuthUser(None)),
            Err(e) => Err(e),
        }
    }
}
