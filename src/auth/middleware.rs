use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::auth::{Claims, Role};
use crate::error::{ApiError, ErrorCode};
use crate::middleware::metrics::track_auth_failure;

/// JWT Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        Some(token) => token.trim().to_string(),
        None => {
            track_auth_failure("missing_token");
            return ApiError::with_code(
                ErrorCode::TokenMissing,
                "Missing or invalid Authorization header",
            )
            .into_response();
        }
    };

    match state.jwt_service.decode_token(&token) {
        Ok(claims) => {
            debug!(user_id = %claims.sub, roles = ?claims.roles, "Authenticated request");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            track_auth_failure("invalid_token");
            e.into_response()
        }
    }
}

/// Role guard composed in front of a route group. The required role is the
/// middleware state, so one function serves every role-gated router:
///
/// ```ignore
/// router.route_layer(from_fn_with_state(Role::Doctor, require_role))
/// ```
pub async fn require_role(
    State(required): State<Role>,
    AuthenticatedUser(claims): AuthenticatedUser,
    request: Request<Body>,
    next: Next,
) -> Response {
    if claims.has_role(required) {
        return next.run(request).await;
    }

    warn!(
        user_id = %claims.sub,
        roles = ?claims.roles,
        required = %required,
        "Role check failed"
    );
    track_auth_failure("role_not_authorized");
    ApiError::with_code(
        ErrorCode::RoleNotAuthorized,
        format!("Access denied. Required role: {}", required),
    )
    .into_response()
}

/// Extractor for authenticated user claims
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("No authentication found".to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}
