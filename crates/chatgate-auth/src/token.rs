use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claim set carried by every bearer token. `sub` is the decimal user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// The caller resolved from a validated token. Handlers receive this from the
/// auth middleware and compare ids on the numeric value only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: String,
}

impl Identity {
    pub fn owns(&self, owner_id: i64) -> bool {
        self.user_id == owner_id
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl: Duration,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token malformed: {0}")]
    Malformed(String),
    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer,
            ttl: config.ttl,
        }
    }

    pub fn issue(&self, user_id: i64, role: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, role: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Check signature, issuer and expiry, then resolve the subject to a
    /// numeric user id. The signature is verified before any claim is read.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        let user_id = data
            .claims
            .sub
            .trim()
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed(format!("non-numeric subject '{}'", data.claims.sub)))?;

        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }
}
