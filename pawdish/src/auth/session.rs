//! HS256 session tokens.
//!
//! A token names the user and when it expires, nothing more. Role and active flag are read from
//! the database on every request, so demoting or deactivating an account takes effect before its
//! tokens run out.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{api::models::users::CurrentUser, config::Config, errors::Error, types::UserId};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(user_id: UserId, config: &Config) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + config.auth.security.jwt_expiry).timestamp(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&[u8], Error> {
    config
        .secret_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .map(str::as_bytes)
        .ok_or_else(|| Error::Internal {
            operation: "sign session: secret_key is not configured".to_string(),
        })
}

/// Anything wrong with the token itself is the caller's problem; key and crypto failures are ours.
fn is_server_side(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::RsaFailedSigning
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm
            | ErrorKind::Crypto(_)
    )
}

pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let key = EncodingKey::from_secret(secret_key(config)?);
    encode(&Header::default(), &SessionClaims::new(user.id, config), &key).map_err(|e| Error::Internal {
        operation: format!("sign session: {e}"),
    })
}

/// Decode a token and check its signature and expiry.
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?);
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            if is_server_side(e.kind()) {
                Error::Internal {
                    operation: format!("verify session: {e}"),
                }
            } else {
                Error::Unauthenticated { message: None }
            }
        })
}
