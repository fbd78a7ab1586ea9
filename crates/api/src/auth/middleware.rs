//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::jwt::{JwtError, JwtManager};
use crate::error::ErrorResponse;

/// Cookie checked when no Authorization header is sent
const AUTH_COOKIE: &str = "rollcall_auth_token";

/// Caller identity extracted from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub tenant_id: String,
    pub role: String,
}

/// State needed for authentication
#[derive(Clone)]
pub struct AuthState {
    pub jwt_manager: JwtManager,
}

fn extract_token_from_cookie(request: &Request) -> Option<String> {
    request
        .headers()
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                cookie
                    .trim()
                    .strip_prefix(AUTH_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
                    .map(String::from)
            })
        })
}

/// Bearer token from the Authorization header, falling back to the auth cookie.
///
/// An Authorization header with any other scheme is an error rather than a
/// reason to look at cookies.
fn extract_bearer_token(request: &Request) -> Result<String, AuthError> {
    if let Some(header) = request.headers().get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidAuthFormat)?;
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .ok_or(AuthError::InvalidAuthFormat);
    }

    extract_token_from_cookie(request).ok_or(AuthError::MissingAuth)
}

fn authenticate_jwt(auth_state: &AuthState, token: &str) -> Result<AuthUser, AuthError> {
    let claims = auth_state
        .jwt_manager
        .validate_access_token(token)
        .map_err(|e| match e {
            JwtError::Expired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

    if claims.sub.trim().is_empty() {
        return Err(AuthError::InvalidToken);
    }
    if claims.tenant_id.trim().is_empty() {
        return Err(AuthError::MissingTenant);
    }

    Ok(AuthUser {
        user_id: claims.sub,
        tenant_id: claims.tenant_id,
        role: claims.role,
    })
}

/// Middleware that requires authentication
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let auth_result =
        extract_bearer_token(&request).and_then(|token| authenticate_jwt(&auth_state, &token));

    match auth_result {
        Ok(auth_user) => {
            tracing::debug!(
                path = %path,
                user_id = %auth_user.user_id,
                tenant_id = %auth_user.tenant_id,
                role = %auth_user.role,
                "require_auth: authentication successful"
            );
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %path, error = ?err, "require_auth: authentication failed");
            err.into_response()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid authentication format")]
    InvalidAuthFormat,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token has no tenant")]
    MissingTenant,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingAuth => "Authentication required",
            AuthError::InvalidAuthFormat => "Invalid authentication format",
            AuthError::InvalidToken | AuthError::TokenExpired => "Invalid or expired token",
            AuthError::MissingTenant => "Token is not bound to a tenant",
        };

        let body = Json(ErrorResponse {
            success: false,
            error: "UNAUTHORIZED",
            message: message.to_string(),
        });

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
