//! Shared application state and the health check.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::TokenService;
use crate::db::{CredentialStore, SubscriptionStore};
use crate::media::{MediaHost, UploadStaging};
use crate::services::{AuthFlowService, ProfileService, SubscriptionService};

/// Shared application state for every route.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub auth: AuthFlowService,
    pub profiles: ProfileService,
    pub subscriptions: SubscriptionService,
    pub staging: UploadStaging,
}

impl AppState {
    /// Wire the services over the given stores and media host.
    pub fn new(
        users: Arc<dyn CredentialStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        media: Arc<dyn MediaHost>,
        tokens: TokenService,
        staging: UploadStaging,
    ) -> Self {
        Self {
            auth: AuthFlowService::new(users.clone(), media.clone(), tokens.clone()),
            profiles: ProfileService::new(users.clone(), subscriptions.clone(), media),
            subscriptions: SubscriptionService::new(users.clone(), subscriptions),
            users,
            tokens,
            staging,
        }
    }

    pub fn users(&self) -> &dyn CredentialStore {
        self.users.as_ref()
    }
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
    pub fn auth(&self) -> &AuthFlowService {
        &self.auth
    }
    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }
    pub fn subscriptions(&self) -> &SubscriptionService {
        &self.subscriptions
    }
    pub fn staging(&self) -> &UploadStaging {
        &self.staging
    }
}

/// GET /api/v1/healthcheck: liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "statusCode": 200,
            "data": { "status": "ok", "service": "vidtube" },
            "message": "OK",
            "success": true
        })),
    )
}
