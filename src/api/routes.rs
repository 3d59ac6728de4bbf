//! API Route Definitions
//!
//! This module defines all HTTP routes and their corresponding handlers using a flexible
//! builder pattern. The RouterBuilder allows selective enabling/disabling of API endpoints
//! for different deployment scenarios.

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};

use super::handlers::*;
use super::middleware::{auth_middleware, security_headers_middleware};
use crate::service::JwtService;

/// Builder for creating API routes with configurable endpoints
///
/// Public endpoints (health, signup, login, refresh, logout) are mounted as-is;
/// every other endpoint sits behind `auth_middleware`.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    /// GET /health
    health_check: bool,
    /// POST /auth/signup
    signup: bool,
    /// POST /auth/login
    login: bool,
    /// POST /auth/refresh
    refresh_token: bool,
    /// POST /auth/logout
    logout: bool,
    /// POST /auth/logout-all
    logout_all: bool,
    /// GET /users
    list_users: bool,
    /// GET /users/me
    get_current_user: bool,
    /// GET /users/{id}
    get_user: bool,
    /// PUT /users/{id}
    update_user: bool,
    /// DELETE /users/{id}
    delete_user: bool,
    /// PUT /users/{id}/plan
    update_plan: bool,
    /// POST /users/{id}/verify-password
    verify_password: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with all routes enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            signup: true,
            login: true,
            refresh_token: true,
            logout: true,
            logout_all: true,
            list_users: true,
            get_current_user: true,
            get_user: true,
            update_user: true,
            delete_user: true,
            update_plan: true,
            verify_password: true,
        }
    }

    /// Creates a router builder with account and session management
    ///
    /// Leaves out the user directory, plan changes and password verification.
    pub fn with_core_routes() -> Self {
        Self {
            health_check: true,
            signup: true,
            login: true,
            refresh_token: true,
            logout: true,
            logout_all: true,
            list_users: false,
            get_current_user: true,
            get_user: true,
            update_user: true,
            delete_user: true,
            update_plan: false,
            verify_password: false,
        }
    }

    /// Creates a router with only read operations and session handling
    ///
    /// Nothing here creates or modifies a user row.
    pub fn with_readonly_routes() -> Self {
        Self {
            health_check: true,
            signup: false,
            login: true,
            refresh_token: true,
            logout: true,
            logout_all: false,
            list_users: true,
            get_current_user: true,
            get_user: true,
            update_user: false,
            delete_user: false,
            update_plan: false,
            verify_password: true,
        }
    }

    /// Creates a router with minimal routes for monitoring
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    /// Enables or disables the health check endpoint (GET /health)
    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// Enables or disables account registration (POST /auth/signup)
    pub fn signup(mut self, enabled: bool) -> Self {
        self.signup = enabled;
        self
    }

    /// Enables or disables email/password login (POST /auth/login)
    pub fn login(mut self, enabled: bool) -> Self {
        self.login = enabled;
        self
    }

    /// Enables or disables the token refresh endpoint (POST /auth/refresh)
    pub fn refresh_token(mut self, enabled: bool) -> Self {
        self.refresh_token = enabled;
        self
    }

    /// Enables or disables single-session logout (POST /auth/logout)
    pub fn logout(mut self, enabled: bool) -> Self {
        self.logout = enabled;
        self
    }

    /// Enables or disables logout from every device (POST /auth/logout-all)
    pub fn logout_all(mut self, enabled: bool) -> Self {
        self.logout_all = enabled;
        self
    }

    /// Enables or disables the user listing endpoint (GET /users)
    pub fn list_users(mut self, enabled: bool) -> Self {
        self.list_users = enabled;
        self
    }

    /// Enables or disables the caller profile endpoint (GET /users/me)
    pub fn get_current_user(mut self, enabled: bool) -> Self {
        self.get_current_user = enabled;
        self
    }

    /// Enables or disables the user retrieval endpoint (GET /users/{id})
    pub fn get_user(mut self, enabled: bool) -> Self {
        self.get_user = enabled;
        self
    }

    /// Enables or disables the user update endpoint (PUT /users/{id})
    pub fn update_user(mut self, enabled: bool) -> Self {
        self.update_user = enabled;
        self
    }

    /// Enables or disables account deletion (DELETE /users/{id})
    pub fn delete_user(mut self, enabled: bool) -> Self {
        self.delete_user = enabled;
        self
    }

    /// Enables or disables plan changes (PUT /users/{id}/plan)
    pub fn update_plan(mut self, enabled: bool) -> Self {
        self.update_plan = enabled;
        self
    }

    /// Enables or disables the password verification endpoint (POST /users/{id}/verify-password)
    pub fn verify_password(mut self, enabled: bool) -> Self {
        self.verify_password = enabled;
        self
    }

    fn has_protected_routes(&self) -> bool {
        self.logout_all
            || self.list_users
            || self.get_current_user
            || self.get_user
            || self.update_user
            || self.delete_user
            || self.update_plan
            || self.verify_password
    }

    /// Builds the Axum router with the configured routes
    ///
    /// `jwt_service` backs the authentication layer on protected routes. Only
    /// the enabled routes are registered.
    pub fn build(self, jwt_service: Arc<JwtService>) -> Router<AppState> {
        let mut public = Router::new();

        if self.health_check {
            public = public.route("/health", get(health_check));
        }

        if self.signup {
            public = public.route("/auth/signup", post(signup));
        }

        if self.login {
            public = public.route("/auth/login", post(login));
        }

        if self.refresh_token {
            public = public.route("/auth/refresh", post(refresh_token));
        }

        if self.logout {
            public = public.route("/auth/logout", post(logout));
        }

        let mut protected = Router::new();

        if self.logout_all {
            protected = protected.route("/auth/logout-all", post(logout_all));
        }

        if self.list_users {
            protected = protected.route("/users", get(list_users));
        }

        if self.get_current_user {
            protected = protected.route("/users/me", get(get_current_user));
        }

        if self.get_user {
            protected = protected.route("/users/{id}", get(get_user));
        }

        if self.update_user {
            protected = protected.route("/users/{id}", put(update_user));
        }

        if self.delete_user {
            protected = protected.route("/users/{id}", delete(delete_user));
        }

        if self.update_plan {
            protected = protected.route("/users/{id}/plan", put(update_plan));
        }

        if self.verify_password {
            protected = protected.route("/users/{id}/verify-password", post(verify_password));
        }

        // route_layer panics on a router without routes
        if self.has_protected_routes() {
            protected = protected.route_layer(from_fn_with_state(jwt_service, auth_middleware));
        }

        public
            .merge(protected)
            .layer(from_fn(security_headers_middleware))
    }
}

/// Creates all API routes
pub fn create_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    RouterBuilder::with_all_routes().build(jwt_service)
}

/// Creates router with core account management functionality
pub fn create_core_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    RouterBuilder::with_core_routes().build(jwt_service)
}

/// Creates router with read-only functionality
pub fn create_readonly_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    RouterBuilder::with_readonly_routes().build(jwt_service)
}

/// Creates router with minimal functionality (health check only)
pub fn create_minimal_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    RouterBuilder::with_minimal_routes().build(jwt_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::service::{AuthService, UserService};
    use crate::utils::password::SaltedSha256Hasher;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let hasher = Arc::new(SaltedSha256Hasher::new());
        let jwt_service = Arc::new(JwtService::new(
            store.clone(),
            "route-access-secret".to_string(),
            "route-refresh-secret".to_string(),
        ));

        AppState {
            user_service: Arc::new(UserService::new(store.clone(), store.clone(), hasher.clone())),
            auth_service: Arc::new(AuthService::new(store, hasher, jwt_service.clone())),
            jwt_service,
        }
    }

    fn app_with(builder: RouterBuilder) -> Router {
        let state = state();
        builder.build(state.jwt_service.clone()).with_state(state)
    }

    fn app() -> Router {
        app_with(RouterBuilder::with_all_routes())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        app.clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Sign up and log in, returning (user id, access token, refresh token)
    async fn register(app: &Router, email: &str) -> (String, String, String) {
        let response = send(
            app,
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": email, "password": "secret123", "name": "Test User"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let user_id = json_body(response).await["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "secret123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;

        (
            user_id,
            body["data"]["access_token"].as_str().unwrap().to_string(),
            body["data"]["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    #[test]
    fn test_router_builder_new() {
        let builder = RouterBuilder::new();

        assert!(!builder.health_check);
        assert!(!builder.signup);
        assert!(!builder.get_user);
        assert!(!builder.has_protected_routes());
    }

    #[test]
    fn test_router_builder_presets() {
        let all = RouterBuilder::with_all_routes();
        assert!(all.update_plan && all.verify_password && all.list_users);

        let core = RouterBuilder::with_core_routes();
        assert!(core.signup && core.update_user && core.delete_user);
        assert!(!core.list_users && !core.update_plan && !core.verify_password);

        let readonly = RouterBuilder::with_readonly_routes();
        assert!(readonly.get_user && readonly.verify_password && readonly.login);
        assert!(!readonly.signup && !readonly.update_user && !readonly.delete_user);

        let minimal = RouterBuilder::with_minimal_routes();
        assert!(minimal.health_check);
        assert!(!minimal.login && !minimal.has_protected_routes());
    }

    #[test]
    fn test_router_builder_individual_methods() {
        let builder = RouterBuilder::new()
            .health_check(true)
            .signup(true)
            .login(false)
            .get_user(true)
            .update_plan(true)
            .verify_password(false);

        assert!(builder.health_check);
        assert!(builder.signup);
        assert!(!builder.login);
        assert!(builder.get_user);
        assert!(builder.update_plan);
        assert!(!builder.verify_password);
    }

    #[test]
    fn test_preset_routers_build() {
        let jwt_service = state().jwt_service;
        let _router = create_routes(jwt_service.clone());
        let _core_router = create_core_routes(jwt_service.clone());
        let _readonly_router = create_readonly_routes(jwt_service.clone());
        let _minimal_router = create_minimal_routes(jwt_service);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app();
        let response = send(&app, Method::GET, "/health", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_disabled_route_is_not_found() {
        let app = app_with(RouterBuilder::with_minimal_routes());
        let response = send(
            &app,
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": "a@example.com", "password": "secret123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signup_login_me_round_trip() {
        let app = app();
        let (user_id, access_token, _) = register(&app, "round@example.com").await;

        let response = send(&app, Method::GET, "/users/me", Some(&access_token), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["id"], user_id.as_str());
        assert_eq!(body["data"]["email"], "round@example.com");
        assert_eq!(body["data"]["plan"], "free");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_signup_validation_error() {
        let app = app();
        let response = send(
            &app,
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": "not-an-email", "password": "123"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["details"].get("email").is_some());
        assert!(body["details"].get("password").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflict() {
        let app = app();
        register(&app, "dup@example.com").await;

        let response = send(
            &app,
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": "DUP@example.com", "password": "another1"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = app();
        register(&app, "wrong@example.com").await;

        let response = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "wrong@example.com", "password": "incorrect"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await["message"],
            "Invalid email or password"
        );
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = app();
        let response = send(&app, Method::GET, "/users/me", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::GET, "/users", Some("bogus"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_users_record_forbidden() {
        let app = app();
        let (_, alice_token, _) = register(&app, "alice@example.com").await;
        let (bob_id, _, _) = register(&app, "bob@example.com").await;

        let uri = format!("/users/{}", bob_id);
        let response = send(&app, Method::GET, &uri, Some(&alice_token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, Method::DELETE, &uri, Some(&alice_token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_bad_request() {
        let app = app();
        let (_, token, _) = register(&app, "malformed@example.com").await;

        let response = send(&app, Method::GET, "/users/not-a-uuid", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_user_and_verify_password() {
        let app = app();
        let (user_id, token, _) = register(&app, "update@example.com").await;

        let uri = format!("/users/{}", user_id);
        let response = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"name": "Renamed User", "password": "newpass99"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["name"], "Renamed User");

        let verify_uri = format!("/users/{}/verify-password", user_id);
        let response = send(
            &app,
            Method::POST,
            &verify_uri,
            Some(&token),
            Some(json!({"password": "secret123"})),
        )
        .await;
        assert_eq!(json_body(response).await["data"]["valid"], false);

        let response = send(
            &app,
            Method::POST,
            &verify_uri,
            Some(&token),
            Some(json!({"password": "newpass99"})),
        )
        .await;
        assert_eq!(json_body(response).await["data"]["valid"], true);
    }

    #[tokio::test]
    async fn test_update_plan() {
        let app = app();
        let (user_id, token, _) = register(&app, "plan@example.com").await;

        let uri = format!("/users/{}/plan", user_id);
        let response = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"plan": "Premium", "duration_days": 30})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["user"]["plan"], "premium");
        assert_eq!(body["data"]["plan_details"]["duration_days"], 30);
    }

    #[tokio::test]
    async fn test_list_users_paginates() {
        let app = app();
        let (_, token, _) = register(&app, "first@example.com").await;
        register(&app, "second@example.com").await;
        register(&app, "third@example.com").await;

        let response = send(
            &app,
            Method::GET,
            "/users?page=1&per_page=2",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["per_page"], 2);
    }

    #[tokio::test]
    async fn test_refresh_and_logout() {
        let app = app();
        let (_, _, refresh_token) = register(&app, "session@example.com").await;

        let response = send(
            &app,
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh_token})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["data"]["access_token"].as_str().is_some());

        let response = send(
            &app,
            Method::POST,
            "/auth/logout",
            None,
            Some(json!({"refresh_token": refresh_token})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh_token})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_all_and_delete() {
        let app = app();
        let (user_id, token, refresh_token) = register(&app, "gone@example.com").await;

        let response = send(&app, Method::POST, "/auth/logout-all", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["revoked_sessions"], 1);

        let response = send(
            &app,
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh_token})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Access tokens die with their sessions
        let response = send(&app, Method::GET, "/users/me", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "gone@example.com", "password": "secret123"})),
        )
        .await;
        let token = json_body(response).await["data"]["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        let uri = format!("/users/{}", user_id);
        let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        // Deleting the account removed the session behind the token
        let response = send(&app, Method::GET, "/users/me", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_cannot_change_active_flag() {
        let app = app();
        let (user_id, token, _) = register(&app, "stay@example.com").await;

        let uri = format!("/users/{}", user_id);
        let response = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"name": "Still Here", "is_active": false})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["name"], "Still Here");
        assert_eq!(body["data"]["is_active"], true);

        let response = send(&app, Method::GET, "/users/me", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_clears_image() {
        let app = app();
        let (user_id, token, _) = register(&app, "picture@example.com").await;

        let uri = format!("/users/{}", user_id);
        let response = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"image": "https://example.com/me.png"})),
        )
        .await;
        assert_eq!(
            json_body(response).await["data"]["image"],
            "https://example.com/me.png"
        );

        let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({"image": ""}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["data"]["image"].is_null());
    }
}
