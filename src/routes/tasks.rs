/// Task routes
///
/// Per-user task CRUD. Every mutation checks that the task belongs to
/// the authenticated subject; mutations respond with the caller's full
/// task list so clients can refresh their view in one round trip.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::nlp_client::NlpClient;
use crate::validators::{is_valid_category, is_valid_description};

/// Task lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task urgency labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskUrgency {
    Urgent,
    Normal,
}

impl TaskUrgency {
    fn as_str(&self) -> &'static str {
        match self {
            TaskUrgency::Urgent => "urgent",
            TaskUrgency::Normal => "normal",
        }
    }
}

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub category: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub category: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub urgency: TaskUrgency,
}

#[derive(Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub category: String,
    pub description: String,
    pub due_date: String,
    pub status: String,
    pub urgency: String,
    pub created_at: String,
    pub updated_at: String,
}

/// GET /api/tasks
///
/// List the authenticated user's tasks, soonest due first.
pub async fn list_tasks(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let tasks = fetch_tasks(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// POST /api/tasks
///
/// Create a task for the authenticated user. Urgency comes from the
/// classifier service; if that call fails the task is created with
/// normal urgency rather than failing the request.
///
/// # Errors
/// - 400: Validation errors (category/description length, past due date)
/// - 401: Missing or invalid token (handled by middleware)
/// - 500: Internal server error
pub async fn create_task(
    user: web::ReqData<AuthenticatedUser>,
    form: web::Json<CreateTaskRequest>,
    pool: web::Data<PgPool>,
    nlp: web::Data<NlpClient>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("task_create");

    let category = is_valid_category(&form.category)?;
    let description = is_valid_description(&form.description)?;
    validate_due_date(form.due_date)?;

    let urgency = match nlp
        .classify_urgency(&category, &description, form.due_date)
        .await
    {
        Ok(label) if label == "urgent" => TaskUrgency::Urgent,
        Ok(_) => TaskUrgency::Normal,
        Err(e) => {
            tracing::warn!(
                request_id = %context.request_id,
                operation = %context.operation,
                error = %e,
                "Urgency classification failed, defaulting to normal"
            );
            TaskUrgency::Normal
        }
    };

    let task_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO tasks (id, user_id, category, description, due_date, status, urgency, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(task_id)
    .bind(user.id)
    .bind(&category)
    .bind(&description)
    .bind(form.due_date)
    .bind(TaskStatus::Pending.as_str())
    .bind(urgency.as_str())
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user.id,
        task_id = %task_id,
        urgency = urgency.as_str(),
        "Task created"
    );

    let tasks = fetch_tasks(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Created().json(tasks))
}

/// PUT /api/tasks/{id}
///
/// Update a task owned by the authenticated user.
///
/// # Errors
/// - 400: Validation errors
/// - 403: Task belongs to another user
/// - 404: Task not found
pub async fn update_task(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<Uuid>,
    form: web::Json<UpdateTaskRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("task_update");
    let task_id = path.into_inner();

    let category = is_valid_category(&form.category)?;
    let description = is_valid_description(&form.description)?;
    validate_due_date(form.due_date)?;

    check_ownership(pool.get_ref(), task_id, user.id).await?;

    sqlx::query(
        r#"
        UPDATE tasks
        SET category = $1, description = $2, due_date = $3, status = $4, urgency = $5, updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(&category)
    .bind(&description)
    .bind(form.due_date)
    .bind(form.status.as_str())
    .bind(form.urgency.as_str())
    .bind(Utc::now())
    .bind(task_id)
    .execute(pool.get_ref())
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user.id,
        task_id = %task_id,
        "Task updated"
    );

    let tasks = fetch_tasks(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// DELETE /api/tasks/{id}
///
/// Delete a task owned by the authenticated user.
pub async fn delete_task(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("task_delete");
    let task_id = path.into_inner();

    check_ownership(pool.get_ref(), task_id, user.id).await?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(pool.get_ref())
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user.id,
        task_id = %task_id,
        "Task deleted"
    );

    let tasks = fetch_tasks(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Fail unless the task exists and belongs to `user_id`.
async fn check_ownership(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::Database(DatabaseError::NotFound("Task not found".to_string()))
        })?;

    if owner != user_id {
        tracing::warn!(
            user_id = %user_id,
            task_id = %task_id,
            "Task access by non-owner rejected"
        );
        return Err(AppError::Auth(AuthError::PermissionDenied));
    }

    Ok(())
}

fn validate_due_date(due_date: DateTime<Utc>) -> Result<(), AppError> {
    if due_date <= Utc::now() {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "due_date must be in the future".to_string(),
        )));
    }
    Ok(())
}

async fn fetch_tasks(pool: &PgPool, user_id: Uuid) -> Result<Vec<TaskResponse>, AppError> {
    type TaskRow = (
        Uuid,
        String,
        String,
        DateTime<Utc>,
        String,
        String,
        DateTime<Utc>,
        DateTime<Utc>,
    );

    let rows = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, category, description, due_date, status, urgency, created_at, updated_at
        FROM tasks
        WHERE user_id = $1
        ORDER BY due_date ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| TaskResponse {
            id: row.0.to_string(),
            category: row.1,
            description: row.2,
            due_date: row.3.to_rfc3339(),
            status: row.4,
            urgency: row.5,
            created_at: row.6.to_rfc3339(),
            updated_at: row.7.to_rfc3339(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_labels() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"pending\"").unwrap(),
            TaskStatus::Pending
        );
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_urgency_serde_labels() {
        assert_eq!(
            serde_json::to_string(&TaskUrgency::Urgent).unwrap(),
            "\"urgent\""
        );
        assert_eq!(TaskUrgency::Normal.as_str(), "normal");
    }

    #[test]
    fn test_task_id_deserializes_from_path_segment() {
        // {id} path parameters arrive as serde strings; Uuid must
        // deserialize directly.
        let id = Uuid::new_v4();
        let parsed: Uuid = serde_json::from_str(&format!("\"{}\"", id)).unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<Uuid>("\"not-a-uuid\"").is_err());
    }

    #[test]
    fn test_past_due_date_rejected() {
        let past = Utc::now() - chrono::Duration::hours(1);
        assert!(validate_due_date(past).is_err());

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(validate_due_date(future).is_ok());
    }
}
