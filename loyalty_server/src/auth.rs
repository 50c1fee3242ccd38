//! Access token verification.
//!
//! Users sign up and log in through the identity system, which issues HS256 JWTs signed with the shared
//! `LPG_TOKEN_SECRET`. This server only verifies them. The claims carry the owner id in `sub` and the expiry in
//! `exp`; see [`AccessClaims`].
//!
//! Tokens are read from the `Authorization: Bearer <token>` header, or from the `lpg_access_token` header.
use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use loyalty_engine::db_types::OwnerId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "lpg_access_token";
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The owner the token was issued to.
    pub sub: OwnerId,
    /// Expiry, as a unix timestamp in seconds.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenIssuer(HS256)")
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.token_secret.reveal().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a new access token for `owner_id`, valid for `duration` (24 hours by default).
    ///
    /// This is the minting helper for the identity system's login flow (which shares the secret) and for the tests.
    /// Nothing here checks that the owner exists.
    pub fn issue_token(&self, owner_id: &OwnerId, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let lifetime = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        let claims = AccessClaims { sub: owner_id.clone(), exp: Utc::now().timestamp().saturating_add(lifetime) };
        self.sign(&claims)
    }

    /// Signs the given claims as they are.
    pub fn sign(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Could not sign token. {e}")))
    }

    /// Checks the token signature and expiry, and returns the claims it carries.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<AccessClaims>(token.trim(), &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::ValidationError(e.to_string()),
                _ => AuthError::PoorlyFormattedToken(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }
}

fn token_from_request(req: &HttpRequest) -> Option<&str> {
    let headers = req.headers();
    headers
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()))
}

impl FromRequest for AccessClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match (req.app_data::<web::Data<TokenIssuer>>(), token_from_request(req)) {
            (None, _) => {
                error!("💻️ No token issuer has been configured. All authenticated requests will fail.");
                Err(ServerError::ConfigurationError("No token issuer is available".into()))
            },
            (Some(_), None) => Err(AuthError::MissingToken.into()),
            (Some(issuer), Some(token)) => issuer.verify(token).map_err(|e| {
                debug!("💻️ Rejected access token. {e}");
                ServerError::from(e)
            }),
        };
        ready(result)
    }
}
