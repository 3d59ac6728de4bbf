//! Authentication Middleware
//!
//! Bearer token authentication, response security headers, and client
//! metadata extraction.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        HeaderMap, HeaderName, HeaderValue,
    },
    middleware::Next,
    response::Response,
};

use crate::models::{ClientInfo, UserContext};
use crate::service::{JwtError, JwtService};
use crate::utils::error::AppError;
use crate::utils::security::SecurityHeaders;

/// Extension type for storing authenticated user context in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserContext);

/// Authentication middleware that validates JWT tokens and extracts user context
///
/// Expects `Authorization: Bearer <access token>`. On success the caller's
/// [`UserContext`] is stored as an [`AuthUser`] request extension; anything
/// else is answered with 401.
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Invalid Authorization header format".into()))?;

    let user_context = jwt_service
        .validate_access_token(token)
        .await
        .map_err(|err| match err {
            JwtError::Storage(_) => AppError::from(err),
            _ => AppError::Authentication("Invalid or expired token".into()),
        })?;

    request.extensions_mut().insert(AuthUser(user_context));

    Ok(next.run(request).await)
}

/// Adds the standard security headers to every response
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in SecurityHeaders::standard() {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    response
}

/// Helper function to extract authenticated user from request extensions
pub fn extract_auth_user(request: &Request) -> Result<&UserContext, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .map(|auth_user| &auth_user.0)
        .ok_or_else(|| {
            AppError::Authentication("User context not found in request extensions".into())
        })
}

/// Client metadata recorded with a new session
///
/// The IP comes from `X-Forwarded-For` (first hop) or `X-Real-IP` and is kept
/// only when it parses as an address.
pub fn client_info_from_headers(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .or_else(|| header("x-real-ip"))
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string());

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.chars().take(512).collect());

    ClientInfo {
        user_agent,
        ip_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, UserStore};
    use crate::models::{NewUser, Plan, User};
    use axum::{
        body::Body,
        http::{Method, StatusCode},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Router,
    };
    use chrono::{Duration, Utc};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn create_test_jwt_service(store: Arc<MemoryStore>) -> Arc<JwtService> {
        Arc::new(JwtService::new(
            store,
            "test_access_secret_key".to_string(),
            "test_refresh_secret_key".to_string(),
        ))
    }

    async fn auth_test_handler(request: Request) -> Result<String, AppError> {
        let user_context = extract_auth_user(&request)?;
        Ok(user_context.user_id.to_string())
    }

    fn test_app(jwt_service: Arc<JwtService>) -> Router {
        Router::new()
            .route("/test", get(auth_test_handler))
            .layer(from_fn_with_state(jwt_service, auth_middleware))
    }

    fn request(auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method(Method::GET).uri("/test");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_header() {
        let app = test_app(create_test_jwt_service(Arc::new(MemoryStore::new())));
        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_format() {
        let app = test_app(create_test_jwt_service(Arc::new(MemoryStore::new())));
        let response = app.oneshot(request(Some("Invalid token"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let app = app_with_fresh_service();
        let response = app.oneshot(request(Some("Bearer "))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    fn app_with_fresh_service() -> Router {
        test_app(create_test_jwt_service(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_token() {
        let response = app_with_fresh_service()
            .oneshot(request(Some("Bearer not.a.jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_token() {
        let store = Arc::new(MemoryStore::new());
        let jwt_service = create_test_jwt_service(store.clone());
        let user: User = store
            .insert_user(NewUser {
                email: "mw@example.com".to_string(),
                name: None,
                image: None,
                password_hash: "digest".to_string(),
                plan: Plan::Free,
            })
            .await
            .unwrap()
            .into();
        let pair = jwt_service
            .generate_token_pair(&user, ClientInfo::default())
            .await
            .unwrap();

        let header = format!("Bearer {}", pair.access_token);
        let response = test_app(jwt_service)
            .oneshot(request(Some(&header)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user.id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_revoked_session() {
        let store = Arc::new(MemoryStore::new());
        let jwt_service = create_test_jwt_service(store.clone());
        let user: User = store
            .insert_user(NewUser {
                email: "revoked@example.com".to_string(),
                name: None,
                image: None,
                password_hash: "digest".to_string(),
                plan: Plan::Free,
            })
            .await
            .unwrap()
            .into();
        let pair = jwt_service
            .generate_token_pair(&user, ClientInfo::default())
            .await
            .unwrap();
        jwt_service.revoke_all_user_sessions(user.id).await.unwrap();

        let header = format!("Bearer {}", pair.access_token);
        let response = test_app(jwt_service)
            .oneshot(request(Some(&header)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let app = Router::new()
            .route("/plain", get(|| async { "ok" }))
            .layer(from_fn(security_headers_middleware));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/plain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert!(response.headers().contains_key("x-frame-options"));
    }

    #[test]
    fn test_extract_auth_user_missing() {
        let request = request(None);
        assert!(extract_auth_user(&request).is_err());
    }

    #[test]
    fn test_extract_auth_user_present() {
        let user_context = UserContext {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            plan: Plan::Free,
            token_id: "test_token_id".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };

        let mut request = request(None);
        request
            .extensions_mut()
            .insert(AuthUser(user_context.clone()));

        let result = extract_auth_user(&request).unwrap();
        assert_eq!(result.user_id, user_context.user_id);
        assert_eq!(result.token_id, user_context.token_id);
    }

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let info = client_info_from_headers(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("not-an-ip"));
        let info = client_info_from_headers(&headers);
        assert!(info.ip_address.is_none());
        assert!(info.user_agent.is_none());
    }
}
