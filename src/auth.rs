// ABOUTME: Bearer token authentication producing the caller's identity
// ABOUTME: HS256 JWT validation with claims for user id, name, timezone, and locale
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Authentication
//!
//! Session issuance lives outside this service. Requests carry a JWT signed
//! with a shared HS256 secret; [`AuthManager`] validates it and yields the
//! [`UserIdentity`] every orchestrator call is scoped by.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Locale used when the token carries none
pub const DEFAULT_LOCALE: &str = "en";

/// JWT claims understood by the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID` (UUID)
    pub sub: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// IANA timezone, e.g. `Europe/Rome`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    /// BCP 47 locale, e.g. `it-IT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (who the token is intended for)
    pub aud: String,
}

/// The authenticated caller of an orchestrator operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Owner id carried into every store and tool call
    pub user_id: Uuid,
    /// Name shown in the prompt
    pub display_name: Option<String>,
    /// IANA timezone name
    pub timezone: Option<String>,
    /// Preferred locale
    pub locale: Option<String>,
}

impl UserIdentity {
    /// Identity with only an id
    #[must_use]
    pub const fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            display_name: None,
            timezone: None,
            locale: None,
        }
    }

    /// Locale or [`DEFAULT_LOCALE`]
    #[must_use]
    pub fn locale_or_default(&self) -> &str {
        self.locale
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCALE)
    }
}

impl TryFrom<Claims> for UserIdentity {
    type Error = JwtValidationError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|e| JwtValidationError::TokenInvalid {
            reason: format!("Subject is not a valid user id: {e}"),
        })?;
        Ok(Self {
            user_id,
            display_name: claims.name,
            timezone: claims.tz,
            locale: claims.locale,
        })
    }
}

/// Why a token was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtValidationError {
    /// Token expired
    #[error("JWT token expired")]
    TokenExpired,
    /// Signature, audience, or claims rejected
    #[error("JWT token invalid: {reason}")]
    TokenInvalid {
        /// Details
        reason: String,
    },
    /// Token could not be decoded
    #[error("JWT token malformed: {details}")]
    TokenMalformed {
        /// Details
        details: String,
    },
}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match error {
            JwtValidationError::TokenExpired => Self::auth_expired(),
            other => Self::auth_invalid(other.to_string()),
        }
    }
}

/// Validates (and, for tooling, issues) assistant tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Manager for the given HS256 secret and audience
    #[must_use]
    pub fn new(secret: &[u8], audience: impl Into<String>, token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            audience: audience.into(),
            token_expiry_hours,
        }
    }

    /// Issue a token for `identity`
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be encoded.
    pub fn generate_token(&self, identity: &UserIdentity) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            name: identity.display_name.clone(),
            tz: identity.timezone.clone(),
            locale: identity.locale.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_expiry_hours)).timestamp(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }

    /// Validate a raw token
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing why the token was rejected.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[self.audience.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Authenticate the value of an `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no bearer token is present and
    /// `AuthInvalid`/`AuthExpired` when it does not validate.
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<UserIdentity> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(AppError::auth_required)?;

        let identity = UserIdentity::try_from(self.validate_token(token)?)?;
        debug!(user_id = %identity.user_id, "Authenticated request");
        Ok(identity)
    }

    fn convert_jwt_error(e: &JwtError) -> JwtValidationError {
        warn!(error = ?e, "JWT token validation failed");
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtValidationError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                JwtValidationError::TokenMalformed {
                    details: e.to_string(),
                }
            }
            _ => JwtValidationError::TokenInvalid {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::errors::ErrorCode;

    fn manager() -> AuthManager {
        AuthManager::new(b"test-secret-test-secret-test-secret", "agenda-assistant", 1)
    }

    #[test]
    fn test_round_trip_identity() {
        let auth = manager();
        let identity = UserIdentity {
            user_id: Uuid::new_v4(),
            display_name: Some("Marco".to_owned()),
            timezone: Some("Europe/Rome".to_owned()),
            locale: Some("it-IT".to_owned()),
        };
        let token = auth.generate_token(&identity).unwrap();
        let header = format!("Bearer {token}");

        assert_eq!(auth.authenticate(Some(&header)).unwrap(), identity);
    }

    #[test]
    fn test_missing_header_requires_auth() {
        let err = manager().authenticate(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);

        let err = manager().authenticate(Some("Basic abc")).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = AuthManager::new(b"another-secret-another-secret-xx", "agenda-assistant", 1);
        let token = other.generate_token(&UserIdentity::new(Uuid::new_v4())).unwrap();
        let header = format!("Bearer {token}");

        let err = manager().authenticate(Some(&header)).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let err = manager().authenticate(Some("Bearer not-a-jwt")).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
    }
}
