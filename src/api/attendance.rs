use crate::attendance::{redeem, session};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct IssueCodeReq {
    #[schema(example = 1)]
    pub classroom_id: u64,
    /// Validity window in seconds, `(0, 3600]`. Defaults to the configured
    /// code TTL (5 minutes out of the box).
    #[schema(example = 300)]
    pub expires_in: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceReq {
    #[schema(example = 1)]
    pub classroom_id: u64,
    #[schema(example = "A1B2C3")]
    pub code: String,
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceFilter {
    /// Filter by classroom ID
    pub classroom_id: Option<u64>,
    /// Filter by classroom code
    pub code: Option<String>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceListRow {
    pub id: u64,
    pub session_id: u64,
    pub user_id: u64,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    pub student_name: String,
    #[schema(format = "email", value_type = String)]
    pub student_email: String,
    pub classroom_code: String,
    pub teacher_name: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub attendance_date: NaiveDate,
    #[schema(example = "A1B2C3")]
    pub attendance_code: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = 3)]
    pub total_students: usize,
    pub attendance_list: Vec<AttendanceListRow>,
}

/// Issue a new attendance code for a classroom
#[utoipa::path(
    post,
    path = "/api/attendance/code",
    request_body = IssueCodeReq,
    responses(
        (status = 201, description = "Attendance code generated", body = Object, example = json!({
            "code": "A1B2C3",
            "classroom_id": 1,
            "expires_at": "2026-01-01T09:05:00Z",
            "expires_in": 300
        })),
        (status = 400, description = "Invalid expires_in or inactive classroom"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a teacher/admin or not the owner"),
        (status = 404, description = "Classroom not found"),
        (status = 409, description = "Active code already exists for this classroom")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn issue_code(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<IssueCodeReq>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher_or_admin()?;

    let expires_in = payload.expires_in.unwrap_or(config.default_code_ttl);
    let issued = session::issue(pool.get_ref(), &auth, payload.classroom_id, expires_in).await?;

    Ok(HttpResponse::Created().json(issued))
}

/// Mark attendance by redeeming a code
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceReq,
    responses(
        (status = 201, description = "Attendance marked", body = Redeemed, example = json!({
            "attendance_id": 17,
            "attendance_code": "A1B2C3"
        })),
        (status = 400, description = "Invalid or expired attendance code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only students can mark attendance"),
        (status = 409, description = "Attendance already marked today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<MarkAttendanceReq>,
) -> Result<impl Responder, ApiError> {
    auth.require_student()?;

    let redeemed = redeem::redeem(
        pool.get_ref(),
        config.completion_scope,
        payload.classroom_id,
        payload.code.trim(),
        auth.user_id,
    )
    .await?;

    Ok(HttpResponse::Created().json(redeemed))
}

/// List attendance records with student/classroom metadata
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance records", body = AttendanceListResponse),
        (status = 400, description = "Neither classroom_id nor code given"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    filter: web::Query<AttendanceFilter>,
) -> Result<impl Responder, ApiError> {
    if filter.classroom_id.is_none() && filter.code.is_none() {
        return Err(ApiError::validation("Either classroom_id or code is required"));
    }

    let mut sql = String::from(
        r#"
        SELECT a.id, a.session_id, a.user_id, a.created_at,
               u.name AS student_name,
               u.email AS student_email,
               c.code AS classroom_code,
               t.name AS teacher_name,
               DATE(a.created_at) AS attendance_date,
               s.code AS attendance_code
        FROM attendance a
        JOIN user u ON a.user_id = u.id
        JOIN attendance_session s ON a.session_id = s.id
        JOIN classroom c ON s.classroom_id = c.id
        LEFT JOIN user t ON c.teacher_id = t.id
        WHERE 1=1
        "#,
    );

    // Teachers only ever see their own classrooms.
    let scope_to_teacher = auth.role == Role::Teacher;
    if scope_to_teacher {
        sql.push_str(" AND c.teacher_id = ?");
    }
    if filter.classroom_id.is_some() {
        sql.push_str(" AND c.id = ?");
    }
    if filter.code.is_some() {
        sql.push_str(" AND c.code = ?");
    }
    sql.push_str(" ORDER BY a.created_at DESC");

    let mut query = sqlx::query_as::<_, AttendanceListRow>(&sql);
    if scope_to_teacher {
        query = query.bind(auth.user_id);
    }
    if let Some(classroom_id) = filter.classroom_id {
        query = query.bind(classroom_id);
    }
    if let Some(code) = &filter.code {
        query = query.bind(code);
    }

    let rows = query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        total_students: rows.len(),
        attendance_list: rows,
    }))
}

// Re-exported so the OpenAPI schema list can name it.
pub use crate::attendance::redeem::Redeemed;
pub use crate::attendance::session::IssuedSession;
