use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod jwt;
pub mod middleware;
pub mod roles;

pub use roles::Role;

/// User claims for JWT tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub sub: Uuid,           // Subject (user ID)
    pub username: String,    // Username
    pub roles: Vec<Role>,    // Granted roles
    pub exp: i64,            // Expiration time
    pub iat: i64,            // Issued at
    pub iss: String,         // Issuer
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, roles: Vec<Role>, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        let exp = now + chrono::Duration::seconds(ttl_seconds);

        Self {
            sub: user_id,
            username,
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: jwt::ISSUER.to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn has_role(&self, required_role: Role) -> bool {
        self.roles.contains(&required_role)
    }
}
