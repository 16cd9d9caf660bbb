//! JWT token management
//!
//! Signing keys come from configuration; tokens carry the planeswalker's id,
//! user name and role.

use crate::auth::Role;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token lifetime
const ACCESS_TOKEN_MINUTES: i64 = 15;

/// Refresh token lifetime
const REFRESH_TOKEN_DAYS: i64 = 7;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Planeswalker id
    pub sub: Uuid,
    pub user_name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token pair response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Encoding and decoding keys derived from one HMAC secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign {:?} token: {}", claims.token_type, e)))
    }

    /// Issue an access and refresh token for a planeswalker
    pub fn create_tokens(&self, user_id: Uuid, user_name: &str, role: Role) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let claims = |token_type, lifetime: Duration| Claims {
            sub: user_id,
            user_name: user_name.to_string(),
            role,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            token_type,
        };

        let access_token = self.sign(&claims(TokenType::Access, Duration::minutes(ACCESS_TOKEN_MINUTES)))?;
        let refresh_token = self.sign(&claims(TokenType::Refresh, Duration::days(REFRESH_TOKEN_DAYS)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_MINUTES * 60,
        })
    }

    /// Decode and validate a token
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::Unauthorized("Invalid token".to_string())
                }
                _ => AppError::Unauthorized(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(data.claims)
    }

    /// Decode a token and require it to be of the given type
    pub fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if claims.token_type != expected {
            return Err(AppError::Unauthorized(format!(
                "Expected {:?} token, got {:?}",
                expected, claims.token_type
            )));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_carry_identity() {
        let keys = JwtKeys::new("test-secret");
        let id = Uuid::new_v4();
        let pair = keys.create_tokens(id, "jace", Role::Moderator).unwrap();

        let claims = keys.decode_as(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.user_name, "jace");
        assert_eq!(claims.role, Role::Moderator);
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let keys = JwtKeys::new("test-secret");
        let pair = keys.create_tokens(Uuid::new_v4(), "jace", Role::Planeswalker).unwrap();

        let err = keys.decode_as(&pair.access_token, TokenType::Refresh).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let pair = JwtKeys::new("one")
            .create_tokens(Uuid::new_v4(), "jace", Role::Planeswalker)
            .unwrap();
        assert!(JwtKeys::new("two").decode_token(&pair.access_token).is_err());
    }
}
