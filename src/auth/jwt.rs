//! JWT issue and validation for access and refresh tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserRecord;

/// Secrets and lifetimes for both token classes.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

/// Claims of a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// Claims of a refresh token: subject only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime out of range")]
    Lifetime,
}

impl TokenError {
    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            TokenError::Invalid(e) if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature)
        )
    }
}

/// Access + refresh pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            config,
        }
    }

    pub fn issue_access_token(&self, user: &UserRecord) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            fullname: user.full_name.clone(),
            iat: now.timestamp(),
            exp: expires_at(now, self.config.access_ttl)?,
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.access_encoding).map_err(TokenError::Sign)
    }

    pub fn issue_refresh_token(&self, user: &UserRecord) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user.id,
            iat: now.timestamp(),
            exp: expires_at(now, self.config.refresh_ttl)?,
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(TokenError::Sign)
    }

    pub fn issue_pair(&self, user: &UserRecord) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_decoding)
    }
}

fn expires_at(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or(TokenError::Lifetime)
}

/// Signature and expiry check against one key.
pub fn verify<C: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<C, TokenError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;
    decode::<C>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig {
            access_secret: "access-secret-for-tests".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            refresh_ttl: Duration::days(10),
        }
    }

    fn user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            email: "ada@x.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
            avatar: "https://cdn.example.com/a.png".to_string(),
            cover_image: None,
            password_hash: "hash".to_string(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_carries_identity() {
        let svc = TokenService::new(config());
        let u = user();
        let token = svc.issue_access_token(&u).unwrap();
        let claims = svc.verify_access(&token).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.email, "ada@x.com");
        assert_eq!(claims.fullname, "Ada Lovelace");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn refresh_token_only_verifies_with_refresh_secret() {
        let svc = TokenService::new(config());
        let u = user();
        let refresh = svc.issue_refresh_token(&u).unwrap();
        assert_eq!(svc.verify_refresh(&refresh).unwrap().sub, u.id);
        assert!(svc.verify_access(&refresh).is_err());

        let access = svc.issue_access_token(&u).unwrap();
        assert!(svc.verify_refresh(&access).is_err());
    }

    #[test]
    fn tokens_from_other_secret_are_rejected() {
        let svc = TokenService::new(config());
        let mut other = config();
        other.refresh_secret = "someone-else".to_string();
        let foreign = TokenService::new(other).issue_refresh_token(&user()).unwrap();
        assert!(svc.verify_refresh(&foreign).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut cfg = config();
        cfg.refresh_ttl = Duration::seconds(-60);
        let svc = TokenService::new(cfg);
        let token = svc.issue_refresh_token(&user()).unwrap();
        let err = svc.verify_refresh(&token).unwrap_err();
        assert!(err.is_expired());
    }

    #[test]
    fn consecutive_refresh_tokens_differ() {
        let svc = TokenService::new(config());
        let u = user();
        let a = svc.issue_refresh_token(&u).unwrap();
        let b = svc.issue_refresh_token(&u).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn overflowing_lifetime_is_an_error() {
        let mut cfg = config();
        cfg.refresh_ttl = Duration::days(365_000_000);
        let svc = TokenService::new(cfg);
        let err = svc.issue_refresh_token(&user()).unwrap_err();
        assert!(matches!(err, TokenError::Lifetime));
        assert!(svc.issue_pair(&user()).is_err());
        assert!(svc.issue_access_token(&user()).is_ok());
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = TokenService::new(config());
        let err = svc.verify_access("not.a.jwt").unwrap_err();
        assert!(!err.is_expired());
    }
}
