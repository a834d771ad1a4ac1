//! Roles recognised by the triage platform.
//!
//! A caller's token carries a set of roles; each consultation route declares
//! the single role it requires and the guard in [`super::middleware`] checks
//! membership before the handler runs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role held by an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Tester,
    Doctor,
    GovernmentAuthority,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Tester => "tester",
            Role::Doctor => "doctor",
            Role::GovernmentAuthority => "government_authority",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
