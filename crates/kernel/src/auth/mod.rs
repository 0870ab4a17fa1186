//! Bearer-token identity.
//!
//! Requests carry `Authorization: Bearer <jwt>` signed with HS256. The token
//! subject is the stable user id; `email` and `name` become the profile's
//! main email and default display name.

mod middleware;

pub use middleware::authenticate_bearer_token;

use anyhow::{Context, Result};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Lifetime of tokens minted by [`AuthService::issue_token`] (24 hours).
pub const TOKEN_LIFETIME_SECS: i64 = 86_400;

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,
    /// Subject (user id).
    pub sub: String,
    /// User email.
    pub email: String,
    /// Optional nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Authenticated caller, set in request extensions by the bearer middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub nickname: String,
}

impl AuthUser {
    fn from_claims(claims: TokenClaims) -> Self {
        let nickname = claims
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| nickname_from_email(&claims.email));
        Self {
            user_id: claims.sub,
            email: claims.email,
            nickname,
        }
    }
}

/// Local part of an email address.
fn nickname_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// HS256 token verification.
pub struct AuthService {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Verify a token and resolve the caller.
    ///
    /// Validates signature, expiry and `iss`; there is no audience.
    pub fn verify(&self, token: &str) -> Result<AuthUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .context("invalid token")?;

        if data.claims.sub.is_empty() {
            anyhow::bail!("token has an empty subject");
        }

        Ok(AuthUser::from_claims(data.claims))
    }

    /// Mint a token for a user.
    pub fn issue_token(&self, user_id: &str, email: &str, name: Option<&str>) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to encode token")
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .finish()
    }
}
