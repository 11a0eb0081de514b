use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateClassroom {
    #[schema(example = "CS101")]
    pub code: String,
    /// Address the classroom's screen-share endpoint listens on
    #[schema(example = "192.168.1.20")]
    pub ip: String,
    #[schema(example = 8554)]
    pub port: u16,
    /// 1 = active (default), 0 = closed
    pub status: Option<i8>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateClassroom {
    pub status: i8,
}

#[derive(Deserialize, IntoParams)]
pub struct ClassroomFilter {
    pub id: Option<u64>,
    pub status: Option<i8>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct ClassroomRow {
    pub id: u64,
    pub code: String,
    pub ip: String,
    pub port: u16,
    pub status: i8,
    pub teacher_id: u64,
    pub teacher_name: Option<String>,
    /// Attendance records for this classroom today
    pub attendance_count: i64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    teacher_id: u64,
}

async fn check_ownership(
    pool: &MySqlPool,
    classroom_id: u64,
    auth: &AuthUser,
) -> Result<(), ApiError> {
    let row = sqlx::query_as::<_, OwnerRow>("SELECT teacher_id FROM classroom WHERE id = ?")
        .bind(classroom_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Classroom not found"))?;

    if row.teacher_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden(
            "You can only modify your own classrooms",
        ));
    }
    Ok(())
}

/// List classrooms
#[utoipa::path(
    get,
    path = "/api/classroom",
    params(ClassroomFilter),
    responses(
        (status = 200, description = "Classrooms with teacher and attendance metadata", body = [ClassroomRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Classroom"
)]
pub async fn list_classrooms(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    filter: web::Query<ClassroomFilter>,
) -> Result<impl Responder, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT c.id, c.code, c.ip, c.port, c.status, c.teacher_id, c.created_at,
               u.name AS teacher_name,
               (SELECT COUNT(*)
                FROM attendance a
                JOIN attendance_session s ON a.session_id = s.id
                WHERE s.classroom_id = c.id AND DATE(a.created_at) = CURDATE()
               ) AS attendance_count
        FROM classroom c
        LEFT JOIN user u ON c.teacher_id = u.id
        WHERE 1=1
        "#,
    );

    if filter.id.is_some() {
        sql.push_str(" AND c.id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND c.status = ?");
    }
    sql.push_str(" ORDER BY c.created_at DESC");

    let mut query = sqlx::query_as::<_, ClassroomRow>(&sql);
    if let Some(id) = filter.id {
        query = query.bind(id);
    }
    if let Some(status) = filter.status {
        query = query.bind(status);
    }

    let rows = query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Create a classroom
#[utoipa::path(
    post,
    path = "/api/classroom",
    request_body = CreateClassroom,
    responses(
        (status = 201, description = "Classroom created", body = Object, example = json!({
            "classroom_id": 1
        })),
        (status = 400, description = "Invalid IP or port"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Teacher already has an active classroom")
    ),
    security(("bearer_auth" = [])),
    tag = "Classroom"
)]
pub async fn create_classroom(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateClassroom>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher_or_admin()?;

    if payload.code.trim().is_empty() {
        return Err(ApiError::validation("code must not be empty"));
    }
    if payload.ip.parse::<std::net::IpAddr>().is_err() {
        return Err(ApiError::validation("Invalid IP address"));
    }
    if payload.port == 0 {
        return Err(ApiError::validation("Invalid port number"));
    }

    let status = payload.status.unwrap_or(1);

    // One active classroom per teacher.
    if status == 1 {
        let active = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM classroom WHERE teacher_id = ? AND status = 1)",
        )
        .bind(auth.user_id)
        .fetch_one(pool.get_ref())
        .await?;

        if active != 0 {
            return Err(ApiError::Conflict(
                "You already have an active classroom. Please close it first.".into(),
            ));
        }
    }

    let result = sqlx::query(
        "INSERT INTO classroom (code, ip, port, status, teacher_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.code.trim())
    .bind(&payload.ip)
    .bind(payload.port)
    .bind(status)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "classroom_id": result.last_insert_id()
    })))
}

/// Update classroom status
#[utoipa::path(
    put,
    path = "/api/classroom/{id}",
    params(("id" = u64, Path, description = "Classroom ID")),
    request_body = UpdateClassroom,
    responses(
        (status = 200, description = "Status updated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Classroom not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Classroom"
)]
pub async fn update_classroom(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateClassroom>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher_or_admin()?;

    let classroom_id = path.into_inner();
    check_ownership(pool.get_ref(), classroom_id, &auth).await?;

    sqlx::query("UPDATE classroom SET status = ? WHERE id = ?")
        .bind(payload.status)
        .bind(classroom_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Classroom status updated successfully"
    })))
}

/// Delete a classroom
#[utoipa::path(
    delete,
    path = "/api/classroom/{id}",
    params(("id" = u64, Path, description = "Classroom ID")),
    responses(
        (status = 200, description = "Classroom deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Classroom not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Classroom"
)]
pub async fn delete_classroom(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher_or_admin()?;

    let classroom_id = path.into_inner();
    check_ownership(pool.get_ref(), classroom_id, &auth).await?;

    let result = sqlx::query("DELETE FROM classroom WHERE id = ?")
        .bind(classroom_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Classroom not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Classroom deleted successfully"
    })))
}
