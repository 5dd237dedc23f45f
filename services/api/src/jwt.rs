//! JWT service for token generation and validation
//!
//! Two kinds of tokens are signed with the same HS256 secret:
//! access tokens (subject = username, carrying the role) and invite tokens
//! (subject = parent account id) used once to register a dependent.
//! The `type` claim keeps one kind from being accepted as the other.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret_key: String,
    /// Access token expiration time in seconds (default: 24 hours)
    pub access_token_expiry: u64,
    /// Invite token expiration time in seconds (default: 24 hours)
    pub invite_token_expiry: u64,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username for access tokens, parent id for invite tokens
    pub sub: String,
    /// Account role, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Bearer token for API calls
    Access,
    /// Dependent invitation
    Invite,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("unexpected token type")]
    WrongType,

    #[error("malformed token subject")]
    MalformedSubject,

    #[error("failed to read system clock")]
    Clock,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    fn now() -> Result<u64, TokenError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|_| TokenError::Clock)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Self::now()?;
        let claims = Claims {
            sub: user.username.clone(),
            role: Some(user.role.to_string()),
            iat: now,
            exp: now + self.config.access_token_expiry,
            token_type: TokenType::Access,
        };
        self.sign(&claims)
    }

    /// Generate an invite token on behalf of a parent account
    pub fn generate_invite_token(&self, parent_id: i64) -> Result<String, TokenError> {
        let now = Self::now()?;
        let claims = Claims {
            sub: parent_id.to_string(),
            role: None,
            iat: now,
            exp: now + self.config.invite_token_expiry,
            token_type: TokenType::Invite,
        };
        self.sign(&claims)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate an access token, returning its claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Validate an invite token, returning the inviting parent's id
    pub fn validate_invite_token(&self, token: &str) -> Result<i64, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Invite {
            return Err(TokenError::WrongType);
        }
        claims
            .sub
            .parse()
            .map_err(|_| TokenError::MalformedSubject)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the invite token expiry time
    pub fn invite_token_expiry(&self) -> u64 {
        self.config.invite_token_expiry
    }
}
