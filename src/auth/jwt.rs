//! JWT token management
//!
//! Handles creation and validation of bearer tokens. The signing secret
//! comes from [`AuthConfig`]; there is no global key state.

use crate::auth::Role;
use crate::config::AuthConfig;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// JWT claims embedded in every issued token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i32,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Create a signed, time-limited token for a user
pub fn create_token(
    user_id: i32,
    email: &str,
    role: Role,
    auth: &AuthConfig,
) -> Result<String, AppError> {
    let now = Utc::now();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(auth.token_ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

/// Decode and verify a bearer token.
///
/// The precise failure reason (expired, bad signature, malformed) is logged
/// for operators; the client always receives the same generic message.
pub fn decode_token(token: &str, auth: &AuthConfig) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                warn!("Rejected bearer token: expired");
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                warn!("Rejected bearer token: invalid signature");
            }
            other => {
                warn!("Rejected bearer token: {:?}", other);
            }
        }
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            token_ttl_hours: 24,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = test_config();
        let token = create_token(42, "prof@example.edu", Role::Faculty, &config).unwrap();
        let claims = decode_token(&token, &config).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "prof@example.edu");
        assert_eq!(claims.role, Role::Faculty);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(1, "a@x.edu", Role::Public, &test_config()).unwrap();
        let other = AuthConfig {
            jwt_secret: "a-different-secret".to_string(),
            token_ttl_hours: 24,
        };
        assert!(matches!(
            decode_token(&token, &other),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(decode_token("not-a-token", &test_config()).is_err());
    }
}
