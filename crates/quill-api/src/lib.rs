//! HTTP API: accounts, owner-scoped documents and AI transformations.

pub mod ai;
pub mod auth;
pub mod convert;
pub mod documents;
pub mod middleware;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tracing::error;

use quill_db::Database;

use crate::auth::AppState;
use crate::middleware::require_auth;

/// All routes, with state applied. Transport layers (CORS, tracing) are left
/// to the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/{id}",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/ai/transform", post(ai::transform))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

pub async fn health() -> &'static str {
    "ok"
}

/// Run a blocking database call off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Json,
        body::Body,
        http::{Request, header},
        routing::post,
    };
    use http_body_util::BodyExt;
    use quill_ai::{GeminiClient, GeminiConfig};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AppStateInner;

    fn state_with(ai: Option<GeminiClient>) -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            token_days: 7,
            ai,
        })
    }

    fn app_with(ai: Option<GeminiClient>) -> Router {
        router(state_with(ai))
    }

    fn app() -> Router {
        app_with(None)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
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
        builder.body(body).unwrap()
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(request(method, uri, token, body))
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Register a user and return its token.
    async fn register(app: &Router, username: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": username,
                "name": "Test User",
                "email": format!("{}@example.com", username),
                "password": "correct horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    // -- Auth --

    #[tokio::test]
    async fn register_sets_cookie_and_returns_user() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "username": "alice",
                    "name": "Alice",
                    "email": "alice@example.com",
                    "password": "correct horse",
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("auth-token="));
        assert!(cookie.contains("HttpOnly"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "standard");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = app();
        let cases = [
            json!({ "username": "al", "name": "A", "email": "a@example.com", "password": "correct horse" }),
            json!({ "username": "alice", "name": "A", "email": "a@example.com", "password": "short" }),
            json!({ "username": "alice", "name": "A", "email": "a@example.com" }),
            json!({ "username": "alice", "name": "A", "email": "nope", "password": "correct horse" }),
        ];
        for case in cases {
            let (status, _) = call(&app, "POST", "/auth/register", None, Some(case)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let app = app();
        register(&app, "alice").await;

        let (status, _) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "name": "Other",
                "email": "other@example.com",
                "password": "correct horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "other",
                "name": "Other",
                "email": "alice@example.com",
                "password": "correct horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_accepts_username_or_email() {
        let app = app();
        register(&app, "alice").await;

        for login in ["alice", "alice@example.com"] {
            let (status, body) = call(
                &app,
                "POST",
                "/auth/login",
                None,
                Some(json!({ "username": login, "password": "correct horse" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["user"]["username"], "alice");
        }

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_accepts_bearer_or_cookie() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, body) = call(&app, "GET", "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let with_cookie = Request::builder()
            .uri("/auth/me")
            .header(header::COOKIE, format!("auth-token={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(with_cookie).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _) = call(&app, "GET", "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, "GET", "/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn usernames_and_emails_ignore_case() {
        let app = app();
        register(&app, "alice").await;

        let (status, _) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "ALICE",
                "name": "Shouting Alice",
                "email": "ALICE@Example.com",
                "password": "correct horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        for login in ["Alice", " ALICE@EXAMPLE.COM "] {
            let (status, body) = call(
                &app,
                "POST",
                "/auth/login",
                None,
                Some(json!({ "username": login, "password": "correct horse" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["user"]["username"], "alice");
        }
    }

    #[tokio::test]
    async fn stored_names_are_lower_cased() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "  MixedCase ",
                "name": "Mixed",
                "email": "Mixed@Example.COM",
                "password": "correct horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["username"], "mixedcase");
        assert_eq!(body["user"]["email"], "mixed@example.com");
    }

    #[tokio::test]
    async fn deleted_accounts_stop_resolving() {
        let state = state_with(None);
        let app = router(state.clone());
        let token = register(&app, "ghost").await;

        let (status, body) = call(&app, "GET", "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap().to_string();

        assert!(state.db.soft_delete_user(&id).unwrap());

        let (status, _) = call(&app, "GET", "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_clears_the_cookie() {
        let logout = Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .header(header::COOKIE, "auth-token=abc")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(logout).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("auth-token="));
        assert!(cookie.contains("Max-Age=0"));
    }

    // -- Documents --

    #[tokio::test]
    async fn document_round_trip() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, created) = call(&app, "POST", "/documents", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["document"]["title"], "Untitled Document");
        assert_eq!(created["document"]["content"], "");
        let id = created["document"]["id"].as_str().unwrap().to_string();
        let uri = format!("/documents/{}", id);

        let (status, updated) = call(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "content": "<p>hello</p>" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["document"]["title"], "Untitled Document");
        assert_eq!(updated["document"]["content"], "<p>hello</p>");
        let before: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(created["document"]["last_edited"].clone()).unwrap();
        let after: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(updated["document"]["last_edited"].clone()).unwrap();
        assert!(after >= before);

        let (_, second) = call(
            &app,
            "POST",
            "/documents",
            Some(&token),
            Some(json!({ "title": "Second" })),
        )
        .await;
        let (status, list) = call(&app, "GET", "/documents", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let documents = list["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["id"], second["document"]["id"]);
        assert!(documents[0].get("content").is_none());

        let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = call(&app, "GET", "/documents", Some(&token), None).await;
        assert_eq!(list["documents"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_users_documents_are_not_found() {
        let app = app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bobby").await;

        let (_, created) = call(
            &app,
            "POST",
            "/documents",
            Some(&alice),
            Some(json!({ "title": "Private" })),
        )
        .await;
        let uri = format!("/documents/{}", created["document"]["id"].as_str().unwrap());

        let (status, _) = call(&app, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "PUT", &uri, Some(&bob), Some(json!({ "title": "Mine" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = call(&app, "GET", "/documents", Some(&bob), None).await;
        assert!(list["documents"].as_array().unwrap().is_empty());
        let (status, doc) = call(&app, "GET", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["document"]["title"], "Private");
    }

    #[tokio::test]
    async fn malformed_ids_and_missing_auth_are_rejected() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, _) = call(&app, "GET", "/documents/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, "GET", "/documents", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // -- AI --

    async fn mock_gemini(reply: Value, status: StatusCode) -> GeminiClient {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(move || {
                let reply = reply.clone();
                async move { (status, Json(reply)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut config = GeminiConfig::new("test-key");
        config.base_url = format!("http://{}", addr);
        GeminiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn transform_returns_the_model_text() {
        let gemini = mock_gemini(
            json!({ "candidates": [{ "content": { "parts": [{ "text": "the cat sits" }] } }] }),
            StatusCode::OK,
        )
        .await;
        let app = app_with(Some(gemini));
        let token = register(&app, "alice").await;

        let (status, body) = call(
            &app,
            "POST",
            "/ai/transform",
            Some(&token),
            Some(json!({ "text": "the cat sat", "kind": "simplify" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "the cat sits");

        let (status, _) = call(
            &app,
            "POST",
            "/ai/transform",
            Some(&token),
            Some(json!({ "text": "   ", "kind": "simplify" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failures_are_bad_gateway() {
        let gemini = mock_gemini(
            json!({ "error": { "message": "quota exhausted" } }),
            StatusCode::TOO_MANY_REQUESTS,
        )
        .await;
        let app = app_with(Some(gemini));
        let token = register(&app, "alice").await;

        let (status, _) = call(
            &app,
            "POST",
            "/ai/transform",
            Some(&token),
            Some(json!({ "text": "hello", "kind": "enhance" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn transform_without_a_provider_is_unavailable() {
        let app = app();
        let token = register(&app, "alice").await;
        let (status, _) = call(
            &app,
            "POST",
            "/ai/transform",
            Some(&token),
            Some(json!({ "text": "hello", "kind": "expand" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, _) = call(&app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
