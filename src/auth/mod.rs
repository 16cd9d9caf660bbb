//! Authentication and authorization module
//!
//! Planeswalkers sign in with a user name and password and receive a JWT pair.
//! Moderators review change requests; admins additionally manage roles.

mod jwt;
mod middleware;
mod password;
mod provider;

pub use jwt::{Claims, JwtKeys, TokenPair, TokenType};
pub use middleware::{auth_middleware, require_role, BearerToken};
pub use provider::{AuthProvider, Credentials, LocalAuthProvider, Registration, Session};

use serde::{Deserialize, Serialize};

/// Planeswalker roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can propose changes and manage their own collection
    #[default]
    Planeswalker,
    /// Can accept fields and change request statuses
    Moderator,
    /// Moderator who can also assign roles
    Admin,
}

impl Role {
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this role grants everything `required` does
    pub fn satisfies(&self, required: Role) -> bool {
        match required {
            Role::Planeswalker => true,
            Role::Moderator => self.can_moderate(),
            Role::Admin => self.can_administer(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Planeswalker => write!(f, "planeswalker"),
            Role::Moderator => write!(f, "moderator"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
