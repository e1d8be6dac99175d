use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};
use uuid::Uuid;

use quill_ai::GeminiClient;
use quill_db::Database;
use quill_db::queries::NewUser;
use quill_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use quill_types::{Role, User};

use crate::convert::{now_string, user_from_row};
use crate::run_blocking;

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth-token";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_days: i64,
    /// `None` when no API key is configured; AI routes answer 503.
    pub ai: Option<GeminiClient>,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StatusCode> {
    // Missing fields are a plain 400 rather than axum's 422
    let Json(req) = payload.map_err(|_| StatusCode::BAD_REQUEST)?;

    let username = req.username.trim().to_lowercase();
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();
    if !(3..=32).contains(&username.chars().count()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.chars().count() < 8 || name.is_empty() || !email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }

    let (u, e) = (username.clone(), email.clone());
    if run_blocking(&state, move |db| db.user_exists(&u, &e)).await? {
        return Err(StatusCode::CONFLICT);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .to_string();

    let user = User {
        id: Uuid::new_v4(),
        username,
        name,
        email,
        role: Role::Standard,
        created_at: chrono::Utc::now(),
    };

    let row_user = user.clone();
    let created_at = now_string();
    run_blocking(&state, move |db| {
        db.create_user(&NewUser {
            id: &row_user.id.to_string(),
            username: &row_user.username,
            name: &row_user.name,
            email: &row_user.email,
            password_hash: &password_hash,
            role: row_user.role.as_str(),
            created_at: &created_at,
        })
    })
    .await?;

    info!(user_id = %user.id, username = %user.username, "User registered");
    let token = create_token(&state.jwt_secret, &user, state.token_days)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let jar = CookieJar::new().add(session_cookie(token.clone()));

    Ok((StatusCode::CREATED, jar, Json(AuthResponse { user, token })))
}

/// `username` may be either the username or the email address.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let login = req.username.trim().to_lowercase();
    let row = run_blocking(&state, move |db| db.get_user_by_login(&login))
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Verify password
    let parsed_hash =
        PasswordHash::new(&row.password).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!(username = %row.username, "Failed login attempt");
            StatusCode::UNAUTHORIZED
        })?;

    let user = user_from_row(row).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    let token = create_token(&state.jwt_secret, &user, state.token_days)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!(user_id = %user.id, "User logged in");
    Ok((jar.add(session_cookie(token.clone())), Json(AuthResponse { user, token })))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        jar.remove(Cookie::build(AUTH_COOKIE).path("/")),
    )
}

/// The signed-in user, re-read so deleted accounts stop resolving.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = claims.sub.to_string();
    let row = run_blocking(&state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    let user = user_from_row(row).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(user))
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn create_token(secret: &str, user: &User, days: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (chrono::Utc::now() + chrono::Duration::days(days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
