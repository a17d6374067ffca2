pub mod password;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::database::{DatabaseError, UserRepository};

/// Which endpoint family a token is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Signed claim set. `sub` and `type` are optional on decode so their
/// absence maps to a precise error instead of a generic parse failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Could not validate credentials")]
    Malformed,

    #[error("Invalid token type")]
    WrongType,

    #[error("Token has no subject")]
    MissingSubject,

    #[error("User not found")]
    UnknownSubject,

    #[error("JWT generation error: {0}")]
    Signing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Response body for every endpoint that hands out credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Issues and validates access/refresh JWTs (HS256)
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    users: Arc<dyn UserRepository>,
}

impl TokenService {
    pub fn new(config: &SecurityConfig, users: Arc<dyn UserRepository>) -> Self {
        let secret = config.jwt_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl: Duration::seconds(config.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_secs),
            users,
        }
    }

    pub fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        self.sign(subject, TokenKind::Access, Utc::now() + self.access_ttl)
    }

    pub fn issue_refresh(&self, subject: &str) -> Result<String, TokenError> {
        self.sign(subject, TokenKind::Refresh, Utc::now() + self.refresh_ttl)
    }

    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject)?,
            refresh_token: self.issue_refresh(subject)?,
            token_type: "bearer".to_string(),
        })
    }

    /// Verify signature, expiry and kind; returns the subject (user email)
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        if claims.token_type.as_deref() != Some(expected.as_str()) {
            return Err(TokenError::WrongType);
        }

        match claims.sub {
            Some(sub) if !sub.is_empty() => Ok(sub),
            _ => Err(TokenError::MissingSubject),
        }
    }

    /// Exchange a refresh token for a fresh pair. The presented token stays
    /// valid until it expires; there is no revocation list.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let subject = self.validate(refresh_token, TokenKind::Refresh)?;

        if self.users.find_by_email(&subject).await?.is_none() {
            tracing::warn!("Refresh rejected: subject '{}' no longer exists", subject);
            return Err(TokenError::UnknownSubject);
        }

        self.issue_pair(&subject)
    }

    fn sign(&self, subject: &str, kind: TokenKind, expires_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: Some(subject.to_string()),
            token_type: Some(kind.as_str().to_string()),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}
