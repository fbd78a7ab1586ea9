//! Unit tests for authentication middleware
//!
//! Tests cover:
//! - Bearer token extraction (header, cookie fallback, wrong scheme)
//! - JWT validation (valid, expired, wrong secret, missing tenant)
//! - 401 response envelope

#[cfg(test)]
mod tests {
    use super::super::jwt::{Claims, JwtManager};
    use super::super::middleware::*;
    use axum::{
        body::Body,
        extract::Extension,
        http::{header, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;
    use tower::ServiceExt;

    const SECRET: &str = "test-jwt-secret-key-for-testing-only";

    fn auth_state() -> AuthState {
        AuthState {
            jwt_manager: JwtManager::new(SECRET, 24),
        }
    }

    /// Router with one protected route echoing the caller identity
    fn app() -> Router {
        async fn whoami(Extension(user): Extension<AuthUser>) -> String {
            format!("{}@{}:{}", user.user_id, user.tenant_id, user.role)
        }

        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(auth_state(), require_auth))
    }

    async fn call(request: Request<Body>) -> (StatusCode, String) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn with_auth(value: &str) -> Request<Body> {
        Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    fn signed(claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn assert_unauthorized_envelope(status: StatusCode, body: &str) {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "UNAUTHORIZED");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let token = auth_state()
            .jwt_manager
            .generate_access_token("user-1", "tenant-1", "admin")
            .unwrap();

        let (status, body) = call(with_auth(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-1@tenant-1:admin");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(request).await;
        assert_unauthorized_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_wrong_scheme() {
        let (status, body) = call(with_auth("Basic dXNlcjpwYXNz")).await;
        assert_unauthorized_envelope(status, &body);

        let (status, _) = call(with_auth("Bearer ")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cookie_fallback() {
        let token = auth_state()
            .jwt_manager
            .generate_access_token("user-2", "tenant-9", "member")
            .unwrap();

        let request = Request::builder()
            .uri("/whoami")
            .header(
                header::COOKIE,
                format!("theme=dark; rollcall_auth_token={}", token),
            )
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-2@tenant-9:member");
    }

    #[tokio::test]
    async fn test_token_from_other_secret() {
        let token = JwtManager::new("some-other-secret", 24)
            .generate_access_token("user-1", "tenant-1", "admin")
            .unwrap();

        let (status, body) = call(with_auth(&format!("Bearer {}", token))).await;
        assert_unauthorized_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = signed(&Claims {
            sub: "user-1".into(),
            tenant_id: "tenant-1".into(),
            role: "admin".into(),
            iat: now - 7200,
            exp: now - 60,
        });

        let (status, body) = call(with_auth(&format!("Bearer {}", token))).await;
        assert_unauthorized_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_token_without_tenant() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = signed(&Claims {
            sub: "user-1".into(),
            tenant_id: "".into(),
            role: "admin".into(),
            iat: now,
            exp: now + 3600,
        });

        let (status, body) = call(with_auth(&format!("Bearer {}", token))).await;
        assert_unauthorized_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_token_missing_claims() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = encode(
            &Header::default(),
            &serde_json::json!({ "sub": "user-1", "exp": now + 3600 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let (status, _) = call(with_auth(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
