//! Access tokens.
//!
//! Shoppers and sellers authenticate with an identity service that lives outside this server. It issues HS256-signed
//! JWTs carrying a [`JwtClaims`] payload, signed with the secret in [`AuthConfig`]. This module validates those tokens,
//! and can also issue them (used by the CLI tooling and tests).
use std::{fmt::Display, time::Duration};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    prelude::*,
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Shopper,
    Seller,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Shopper => write!(f, "shopper"),
            Role::Seller => write!(f, "seller"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The shopper or seller id, as assigned by the identity service.
    pub user_id: String,
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(user_id: S, roles: &[Role]) -> Self {
        Self { user_id: user_id.into(), roles: roles.to_vec(), email: None }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Lets route handlers take the validated claims as an argument. The JWT middleware inserts them into the request
/// extensions; a route that is reachable without the middleware will answer 401.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

fn signing_key(config: &AuthConfig) -> Hs256Key {
    Hs256Key::new(config.jwt_secret.reveal().as_bytes())
}

/// Checks the token's signature and expiry, and returns its claims.
pub fn validate_access_token(key: &Hs256Key, token: &str) -> Result<JwtClaims, AuthError> {
    let untrusted_token = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token: Token<JwtClaims> =
        Hs256.validator(key).validate(&untrusted_token).map_err(|e| AuthError::ValidationError(e.to_string()))?;
    let time_options = TimeOptions::default();
    token.claims().validate_expiration(&time_options).map_err(|e| AuthError::ValidationError(e.to_string()))?;
    let (_, claims) = token.into_parts();
    trace!("🔐️ Access token for {} validated", claims.custom.user_id);
    Ok(claims.custom)
}

/// Validates access tokens against the configured secret. Cheap to clone; one instance is shared by every worker.
#[derive(Clone)]
pub struct TokenValidator {
    key: Hs256Key,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: signing_key(config) }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        validate_access_token(&self.key, token)
    }
}

pub struct TokenIssuer {
    key: Hs256Key,
    default_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: signing_key(config), default_lifetime: config.token_lifetime }
    }

    /// Issue a new access token carrying `claims`.
    /// This method DOES NOT check that the claims are legitimate. That must be done prior to calling `issue_token`.
    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or(self.default_lifetime);
        let duration =
            chrono::Duration::from_std(duration).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        let time_options = TimeOptions::default();
        let claims = Claims::new(claims).set_duration_and_issuance(&time_options, duration);
        let header = Header::empty().with_token_type("JWT");
        let token = Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        debug!("🔐️ Issued access token for {}", claims.custom.user_id);
        Ok(token)
    }
}
