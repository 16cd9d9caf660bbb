//! Authentication provider
//!
//! Registers planeswalkers and exchanges credentials for tokens.

use crate::auth::{Claims, JwtKeys, TokenPair, TokenType};
use crate::auth::password::{default_cost, hash_password, password_matches};
use crate::change::check;
use crate::error::AppError;
use crate::models::{Planeswalker, Profile};
use crate::repository::Repository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Registration payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[validate(length(min = 3, max = 32, message = "User name must be 3 to 32 characters"))]
    pub user_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

/// A signed-in planeswalker
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub planeswalker: Profile,
    pub tokens: TokenPair,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn register(&self, registration: Registration) -> Result<Session, AppError>;
    async fn authenticate(&self, credentials: Credentials) -> Result<Session, AppError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError>;
    /// Validate an access token
    fn decode(&self, access_token: &str) -> Result<Claims, AppError>;
}

/// Provider backed by the planeswalker repository and local JWT keys
pub struct LocalAuthProvider {
    repository: Arc<dyn Repository>,
    keys: JwtKeys,
    cost: u32,
}

impl LocalAuthProvider {
    pub fn new(repository: Arc<dyn Repository>, jwt_secret: &str) -> Self {
        Self {
            repository,
            keys: JwtKeys::new(jwt_secret),
            cost: default_cost(),
        }
    }

    /// Override the bcrypt cost (tests use the minimum)
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    fn session(&self, walker: &Planeswalker) -> Result<Session, AppError> {
        Ok(Session {
            planeswalker: Profile::from(walker),
            tokens: self.keys.create_tokens(walker.id, &walker.user_name, walker.role)?,
        })
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn register(&self, registration: Registration) -> Result<Session, AppError> {
        check(&registration).map_err(AppError::InvalidChange)?;

        if self.repository.find_planeswalker(&registration.user_name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User name '{}' is taken",
                registration.user_name
            )));
        }

        let password_hash = hash_password(&registration.password, self.cost)?;
        let walker = Planeswalker::new(registration.user_name, registration.email, password_hash);
        let walker = self.repository.add_planeswalker(walker).await?;

        info!(user_name = %walker.user_name, "Registered planeswalker");
        self.session(&walker)
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<Session, AppError> {
        let rejected = || AppError::Unauthorized("Invalid user name or password".to_string());

        let walker = self
            .repository
            .find_planeswalker(&credentials.user_name)
            .await?
            .ok_or_else(rejected)?;

        if !password_matches(&credentials.password, &walker.password_hash) {
            warn!(user_name = %credentials.user_name, "Failed login");
            return Err(rejected());
        }

        self.session(&walker)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.keys.decode_as(refresh_token, TokenType::Refresh)?;

        // Re-read so role changes and removals take effect on refresh
        let walker = self
            .repository
            .get_planeswalker(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Planeswalker no longer exists".to_string()))?;

        self.keys.create_tokens(walker.id, &walker.user_name, walker.role)
    }

    fn decode(&self, access_token: &str) -> Result<Claims, AppError> {
        self.keys.decode_as(access_token, TokenType::Access)
    }
}
