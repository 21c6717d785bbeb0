use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use wtg_common::Secret;

use crate::{config::AuthConfig, errors::AuthError, errors::ServerError};

type HmacSha256 = Hmac<Sha256>;

/// The header clients present their session token in.
pub const SESSION_HEADER: &str = "wtg-session";

const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 24;

/// The claims carried by a session token. The signature covers the serialized claims, so neither the user id nor the
/// expiry can be tampered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates session tokens.
///
/// A token is `base64url(claims_json).base64url(hmac_sha256(secret, claims_json))`. It is not a full JWT; the server
/// is the only party that ever signs or verifies these, so there is no need for headers or algorithm agility.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Secret<String>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.session_secret.clone() }
    }

    pub fn issue_token(&self, user_id: i64, lifetime: Option<Duration>) -> Result<String, AuthError> {
        let lifetime = lifetime.unwrap_or_else(|| Duration::hours(DEFAULT_SESSION_LIFETIME_HOURS));
        let claims = SessionClaims { user_id, expires_at: Utc::now() + lifetime };
        let payload = serde_json::to_vec(&claims).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let sig = self.sign(&payload)?;
        let token = format!(
            "{}.{}",
            base64::encode_config(&payload, base64::URL_SAFE_NO_PAD),
            base64::encode_config(sig, base64::URL_SAFE_NO_PAD)
        );
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let (payload, sig) = token
            .split_once('.')
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Missing signature separator".to_string()))?;
        let payload = base64::decode_config(payload, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let sig = base64::decode_config(sig, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(&payload);
        mac.verify_slice(&sig).map_err(|_| AuthError::ValidationError("Signature mismatch".to_string()))?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        if claims.expires_at < Utc::now() {
            return Err(AuthError::ValidationError("Session has expired".to_string()));
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<SessionClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("TokenIssuer is not registered on the app".to_string()))?;
    let token = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServerError::CouldNotDeserializeSessionToken)?;
    let claims = issuer.validate_token(token).map_err(|e| {
        debug!("💻️ Session token rejected. {e}");
        ServerError::AuthenticationError(e)
    })?;
    Ok(claims)
}

impl FromRequest for SessionClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

/// An extractor for routes that accept, but do not require, a session. Magic-link credentials are handled by the
/// route itself; an absent or invalid session simply resolves to `None` here.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionClaims>);

impl MaybeSession {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|c| c.user_id)
    }
}

impl FromRequest for MaybeSession {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeSession(claims_from_request(req).ok())))
    }
}
