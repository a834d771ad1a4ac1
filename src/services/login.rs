use async_trait::async_trait;

use crate::auth::Claims;
use crate::models::User;
use crate::services::traits::{ServiceError, ServiceResult, UserLoggedInService};

/// Resolves the current user straight from verified token claims.
#[derive(Debug, Clone, Default)]
pub struct ClaimsUserLoggedInService;

#[async_trait]
impl UserLoggedInService for ClaimsUserLoggedInService {
    async fn logged_in_user(&self, claims: &Claims) -> ServiceResult<User> {
        if claims.is_expired() {
            return Err(ServiceError::Unauthenticated("Token expired".to_string()));
        }
        Ok(User::from(claims))
    }
}
