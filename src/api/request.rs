use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::request::{RequestStatus, RequestType};
use crate::model::role::Role;
use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateRequest {
    #[schema(example = 1)]
    pub classroom_id: u64,
    #[schema(example = "question")]
    pub r#type: RequestType,
    #[schema(example = "Could you repeat the last derivation?")]
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRequest {
    #[schema(example = "approved")]
    pub status: RequestStatus,
}

#[derive(Deserialize, IntoParams)]
pub struct RequestFilter {
    pub classroom_id: Option<u64>,
    pub id: Option<u64>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct RequestRow {
    pub id: u64,
    pub user_id: u64,
    pub classroom_id: u64,
    pub r#type: RequestType,
    pub description: String,
    pub status: RequestStatus,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    #[schema(format = "email", value_type = String)]
    pub user_email: String,
}

/// List in-class requests
#[utoipa::path(
    get,
    path = "/api/request",
    params(RequestFilter),
    responses(
        (status = 200, description = "Requests", body = [RequestRow]),
        (status = 400, description = "Neither classroom_id nor id given"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn list_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    filter: web::Query<RequestFilter>,
) -> Result<impl Responder, ApiError> {
    if filter.classroom_id.is_none() && filter.id.is_none() {
        return Err(ApiError::validation("Either classroom_id or id is required"));
    }

    let mut sql = String::from(
        r#"
        SELECT r.id, r.user_id, r.classroom_id, r.type, r.description, r.status, r.created_at,
               u.name AS user_name, u.email AS user_email
        FROM request r
        JOIN user u ON r.user_id = u.id
        WHERE 1=1
        "#,
    );

    if filter.id.is_some() {
        sql.push_str(" AND r.id = ?");
    }
    if filter.classroom_id.is_some() {
        sql.push_str(" AND r.classroom_id = ?");
    }
    // Students only see their own requests.
    let scope_to_self = auth.role == Role::Student;
    if scope_to_self {
        sql.push_str(" AND r.user_id = ?");
    }
    sql.push_str(" ORDER BY r.created_at DESC");

    let mut query = sqlx::query_as::<_, RequestRow>(&sql);
    if let Some(id) = filter.id {
        query = query.bind(id);
    }
    if let Some(classroom_id) = filter.classroom_id {
        query = query.bind(classroom_id);
    }
    if scope_to_self {
        query = query.bind(auth.user_id);
    }

    let requests = query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(requests))
}

/// Raise an in-class request
#[utoipa::path(
    post,
    path = "/api/request",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = Object, example = json!({
            "request_id": 11,
            "status": "pending"
        })),
        (status = 400, description = "Empty description"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only students can create requests"),
        (status = 404, description = "Classroom not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRequest>,
) -> Result<impl Responder, ApiError> {
    auth.require_student()?;

    if payload.description.trim().is_empty() {
        return Err(ApiError::validation("description must not be empty"));
    }

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM classroom WHERE id = ?)",
    )
    .bind(payload.classroom_id)
    .fetch_one(pool.get_ref())
    .await?;

    if exists == 0 {
        return Err(ApiError::not_found("Classroom not found"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO request (user_id, classroom_id, type, description, status)
        VALUES (?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.classroom_id)
    .bind(payload.r#type.to_string())
    .bind(payload.description.trim())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "request_id": result.last_insert_id(),
        "status": "pending"
    })))
}

/// Resolve a request (teacher)
#[utoipa::path(
    put,
    path = "/api/request/{id}",
    params(("id" = u64, Path, description = "Request ID")),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = Object, example = json!({
            "request_id": 11,
            "status": "approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only teachers can update requests"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn update_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateRequest>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher()?;

    let request_id = path.into_inner();

    let result = sqlx::query("UPDATE request SET status = ? WHERE id = ?")
        .bind(payload.status.to_string())
        .bind(request_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Request not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "request_id": request_id,
        "status": payload.status
    })))
}

/// Delete a request (teacher)
#[utoipa::path(
    delete,
    path = "/api/request/{id}",
    params(("id" = u64, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only teachers can delete requests"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn delete_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher()?;

    let request_id = path.into_inner();

    let result = sqlx::query("DELETE FROM request WHERE id = ?")
        .bind(request_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Request not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request deleted successfully"
    })))
}
