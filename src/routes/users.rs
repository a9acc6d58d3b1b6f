/// User routes
///
/// Current-user lookup for authenticated requests.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

/// GET /api/me
///
/// Return the authenticated user's profile. The subject id is injected
/// by the authentication middleware.
///
/// # Errors
/// - 401: Missing or invalid token (handled by middleware)
/// - 404: User no longer exists
/// - 500: Internal server error
pub async fn get_current_user(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let row = sqlx::query_as::<_, (Uuid, String, String, chrono::DateTime<Utc>)>(
        "SELECT id, email, name, created_at FROM users WHERE id = $1",
    )
    .bind(user.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: row.0.to_string(),
        email: row.1,
        name: row.2,
        created_at: row.3.to_rfc3339(),
    }))
}
