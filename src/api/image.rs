use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::image::Image;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateImage {
    #[schema(example = 1)]
    pub classroom_id: u64,
    /// Path of the stored selfie, relative to the upload root
    #[schema(example = "selfies/1/1735726800_4821.jpg")]
    pub full_path: String,
}

#[derive(Deserialize, IntoParams)]
pub struct ImageFilter {
    pub classroom_id: Option<u64>,
    pub id: Option<u64>,
}

/// List selfie images
#[utoipa::path(
    get,
    path = "/api/image",
    params(ImageFilter),
    responses(
        (status = 200, description = "Images", body = [Image]),
        (status = 400, description = "Neither classroom_id nor id given"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Image"
)]
pub async fn list_images(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    filter: web::Query<ImageFilter>,
) -> Result<impl Responder, ApiError> {
    if filter.classroom_id.is_none() && filter.id.is_none() {
        return Err(ApiError::validation("Either classroom_id or id is required"));
    }

    let mut sql = String::from(
        "SELECT id, classroom_id, user_id, full_path, created_at FROM image WHERE 1=1",
    );
    if filter.id.is_some() {
        sql.push_str(" AND id = ?");
    }
    if filter.classroom_id.is_some() {
        sql.push_str(" AND classroom_id = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query_as::<_, Image>(&sql);
    if let Some(id) = filter.id {
        query = query.bind(id);
    }
    if let Some(classroom_id) = filter.classroom_id {
        query = query.bind(classroom_id);
    }

    let images = query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(images))
}

/// Register an uploaded selfie
#[utoipa::path(
    post,
    path = "/api/image",
    request_body = CreateImage,
    responses(
        (status = 201, description = "Selfie registered", body = Object, example = json!({
            "image_id": 5,
            "path": "selfies/1/1735726800_4821.jpg"
        })),
        (status = 400, description = "Inactive classroom"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only enrolled students can upload selfies")
    ),
    security(("bearer_auth" = [])),
    tag = "Image"
)]
pub async fn create_image(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateImage>,
) -> Result<impl Responder, ApiError> {
    auth.require_student()?;

    if payload.full_path.trim().is_empty() {
        return Err(ApiError::validation("full_path must not be empty"));
    }

    let active = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM classroom WHERE id = ? AND status = 1)",
    )
    .bind(payload.classroom_id)
    .fetch_one(pool.get_ref())
    .await?;

    if active == 0 {
        return Err(ApiError::validation("Invalid or inactive classroom"));
    }

    let enrolled = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM classroom_student
            WHERE classroom_id = ? AND student_id = ? AND status = 1
        )
        "#,
    )
    .bind(payload.classroom_id)
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    if enrolled == 0 {
        return Err(ApiError::forbidden("You are not a member of this classroom"));
    }

    let result = sqlx::query(
        "INSERT INTO image (classroom_id, user_id, full_path) VALUES (?, ?, ?)",
    )
    .bind(payload.classroom_id)
    .bind(auth.user_id)
    .bind(payload.full_path.trim())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "image_id": result.last_insert_id(),
        "path": payload.full_path.trim()
    })))
}
