use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::slide::{Slide, SlideAction, SlideControl};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

// Upload handling and PDF conversion live in a separate collaborator; this
// module stores and serves the resulting metadata rows.

#[derive(Deserialize, ToSchema)]
pub struct CreateSlide {
    #[schema(example = 1)]
    pub classroom_id: u64,
    /// Path of the converted PDF, relative to the upload root
    #[schema(example = "slides/1/68a1f3.pdf")]
    pub full_path: String,
}

#[derive(Deserialize, IntoParams)]
pub struct SlideFilter {
    pub classroom_id: Option<u64>,
    pub id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSlideControl {
    pub slide_id: u64,
    pub classroom_id: u64,
    #[schema(example = "goto")]
    pub action: SlideAction,
    /// Required for the `goto` action
    pub slide_number: Option<u32>,
}

#[derive(Deserialize, IntoParams)]
pub struct SlideControlFilter {
    pub classroom_id: Option<u64>,
    pub slide_id: Option<u64>,
    pub id: Option<u64>,
}

/// List slides
#[utoipa::path(
    get,
    path = "/api/slide",
    params(SlideFilter),
    responses(
        (status = 200, description = "Slides", body = [Slide]),
        (status = 400, description = "Neither classroom_id nor id given"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Slide"
)]
pub async fn list_slides(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    filter: web::Query<SlideFilter>,
) -> Result<impl Responder, ApiError> {
    if filter.classroom_id.is_none() && filter.id.is_none() {
        return Err(ApiError::validation("Either classroom_id or id is required"));
    }

    let mut sql = String::from(
        "SELECT id, classroom_id, full_path, created_at FROM slide WHERE 1=1",
    );
    if filter.id.is_some() {
        sql.push_str(" AND id = ?");
    }
    if filter.classroom_id.is_some() {
        sql.push_str(" AND classroom_id = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query_as::<_, Slide>(&sql);
    if let Some(id) = filter.id {
        query = query.bind(id);
    }
    if let Some(classroom_id) = filter.classroom_id {
        query = query.bind(classroom_id);
    }

    let slides = query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(slides))
}

/// Register an uploaded slide
#[utoipa::path(
    post,
    path = "/api/slide",
    request_body = CreateSlide,
    responses(
        (status = 201, description = "Slide registered", body = Object, example = json!({
            "slide_id": 3,
            "path": "slides/1/68a1f3.pdf"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only teachers can upload slides"),
        (status = 404, description = "Classroom not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Slide"
)]
pub async fn create_slide(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSlide>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher()?;

    if payload.full_path.trim().is_empty() {
        return Err(ApiError::validation("full_path must not be empty"));
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

    let result = sqlx::query("INSERT INTO slide (classroom_id, full_path) VALUES (?, ?)")
        .bind(payload.classroom_id)
        .bind(payload.full_path.trim())
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "slide_id": result.last_insert_id(),
        "path": payload.full_path.trim()
    })))
}

/// List slide control events
#[utoipa::path(
    get,
    path = "/api/slide/control",
    params(SlideControlFilter),
    responses(
        (status = 200, description = "Slide control events", body = [SlideControl]),
        (status = 400, description = "No filter given"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Slide"
)]
pub async fn list_slide_controls(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    filter: web::Query<SlideControlFilter>,
) -> Result<impl Responder, ApiError> {
    if filter.classroom_id.is_none() && filter.slide_id.is_none() && filter.id.is_none() {
        return Err(ApiError::validation(
            "Either classroom_id, slide_id, or id is required",
        ));
    }

    let mut sql = String::from(
        r#"
        SELECT id, slide_id, classroom_id, user_id, action, slide_number, status, created_at
        FROM slide_control WHERE 1=1
        "#,
    );
    if filter.id.is_some() {
        sql.push_str(" AND id = ?");
    }
    if filter.slide_id.is_some() {
        sql.push_str(" AND slide_id = ?");
    }
    if filter.classroom_id.is_some() {
        sql.push_str(" AND classroom_id = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query_as::<_, SlideControl>(&sql);
    if let Some(id) = filter.id {
        query = query.bind(id);
    }
    if let Some(slide_id) = filter.slide_id {
        query = query.bind(slide_id);
    }
    if let Some(classroom_id) = filter.classroom_id {
        query = query.bind(classroom_id);
    }

    let controls = query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(controls))
}

/// Create a slide control event
#[utoipa::path(
    post,
    path = "/api/slide/control",
    request_body = CreateSlideControl,
    responses(
        (status = 201, description = "Control event created", body = Object, example = json!({
            "control_id": 9,
            "status": "pending"
        })),
        (status = 400, description = "goto without slide_number"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only teachers can control slides"),
        (status = 404, description = "Slide not in classroom")
    ),
    security(("bearer_auth" = [])),
    tag = "Slide"
)]
pub async fn create_slide_control(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSlideControl>,
) -> Result<impl Responder, ApiError> {
    auth.require_teacher()?;

    if payload.action == SlideAction::Goto && payload.slide_number.is_none() {
        return Err(ApiError::validation(
            "slide_number is required for goto action",
        ));
    }

    let belongs = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM slide WHERE id = ? AND classroom_id = ?)",
    )
    .bind(payload.slide_id)
    .bind(payload.classroom_id)
    .fetch_one(pool.get_ref())
    .await?;

    if belongs == 0 {
        return Err(ApiError::not_found(
            "Slide not found or does not belong to this classroom",
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO slide_control (slide_id, classroom_id, user_id, action, slide_number, status)
        VALUES (?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(payload.slide_id)
    .bind(payload.classroom_id)
    .bind(auth.user_id)
    .bind(payload.action.to_string())
    .bind(payload.slide_number)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "control_id": result.last_insert_id(),
        "status": "pending"
    })))
}
