/// Authentication routes
///
/// Signup, signin, and refresh token rotation. All three hand a verified
/// subject to the session core and return a fresh token pair; the core
/// itself never looks at emails or passwords.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::session::{hash_password, verify_password, SessionManager};
use crate::validators::{is_valid_email, is_valid_name};

/// User signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// User signin request
#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/signup
///
/// Register a new user and return a token pair.
///
/// # Errors
/// - 400: Validation errors (invalid email/password/name)
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
    session: web::Data<SessionManager>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signup");

    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    let password_hash = hash_password(&form.password)?;

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    let pair = session.issue(user_id)?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user_id,
        "User signed up"
    );

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// POST /auth/signin
///
/// Authenticate a user with email and password and return a token pair.
///
/// # Errors
/// - 400: Validation error (invalid email format)
/// - 401: Unknown email or wrong password (same response for both, to
///   prevent user enumeration)
/// - 500: Internal server error
pub async fn signin(
    form: web::Json<SigninRequest>,
    pool: web::Data<PgPool>,
    session: web::Data<SessionManager>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signin");

    let email = is_valid_email(&form.email)?;

    let user = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        tracing::warn!(
            request_id = %context.request_id,
            operation = %context.operation,
            "Signin for unknown email"
        );
        AppError::Auth(AuthError::InvalidCredential)
    })?;

    let (user_id, password_hash) = user;

    if !verify_password(&form.password, &password_hash)? {
        tracing::warn!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = %user_id,
            "Signin with wrong password"
        );
        return Err(AppError::Auth(AuthError::InvalidCredential));
    }

    let pair = session.issue(user_id)?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user_id,
        "User signed in"
    );

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// POST /auth/refresh
///
/// Exchange a refresh token for a new pair. The presented token is
/// single-use: it is recorded as spent before the replacement pair is
/// issued, and any later presentation of it fails.
///
/// # Errors
/// - 401: Invalid, expired, or already-spent refresh token
/// - 500: Internal server error (the presented token stays spent; the
///   user must sign in again)
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    session: web::Data<SessionManager>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let pair = session.rotate(&form.refresh_token).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        "Token pair rotated"
    );

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}
