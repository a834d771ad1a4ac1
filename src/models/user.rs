use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Claims, Role};

/// An authenticated principal as seen by the consultation workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(id: Uuid, user_name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id,
            user_name: user_name.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Two principals are the same user when their ids match; profile fields
    /// may drift between tokens.
    pub fn is_same_user(&self, other: &User) -> bool {
        self.id == other.id
    }
}

impl From<&Claims> for User {
    fn from(claims: &Claims) -> Self {
        User::new(claims.sub, claims.username.clone(), claims.roles.clone())
    }
}
