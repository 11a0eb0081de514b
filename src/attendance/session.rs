use crate::attendance::code;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

/// Upper bound on a code's validity window, seconds.
pub const MAX_CODE_TTL_SECS: u32 = 3600;

const CODE_ALLOC_ATTEMPTS: usize = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct IssuedSession {
    #[schema(example = "A1B2C3")]
    pub code: String,
    pub classroom_id: u64,
    #[schema(example = "2026-01-01T00:05:00Z", format = "date-time", value_type = String)]
    pub expires_at: DateTime<Utc>,
    #[schema(example = 300)]
    pub expires_in: u32,
}

/// Window must be in `(0, 3600]`. A zero-second code can never be redeemed;
/// anything past an hour defeats the point of a liveness check.
pub fn validate_expires_in(expires_in: u32) -> Result<(), ApiError> {
    if expires_in == 0 || expires_in > MAX_CODE_TTL_SECS {
        return Err(ApiError::validation(format!(
            "expires_in must be between 1 and {} seconds",
            MAX_CODE_TTL_SECS
        )));
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct ClassroomRow {
    teacher_id: u64,
    status: i8,
}

/// Issues a new attendance session for the classroom.
///
/// The "no active session" pre-check and the insert are deliberately not under
/// one lock: issuance is teacher-paced and rare, so the narrow race is
/// accepted. Redemption, where the real contention lives, takes a row lock.
pub async fn issue(
    pool: &MySqlPool,
    auth: &AuthUser,
    classroom_id: u64,
    expires_in: u32,
) -> Result<IssuedSession, ApiError> {
    auth.require_teacher_or_admin()?;
    validate_expires_in(expires_in)?;

    let classroom = sqlx::query_as::<_, ClassroomRow>(
        "SELECT teacher_id, status FROM classroom WHERE id = ?",
    )
    .bind(classroom_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Classroom not found"))?;

    if classroom.status != 1 {
        return Err(ApiError::validation("Classroom is not active"));
    }

    if classroom.teacher_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden(
            "You can only issue codes for your own classrooms",
        ));
    }

    let active = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM attendance_session
            WHERE classroom_id = ? AND status = 'active' AND expires_at > NOW()
        )
        "#,
    )
    .bind(classroom_id)
    .fetch_one(pool)
    .await?;

    if active != 0 {
        return Err(ApiError::Conflict(
            "There is already an active attendance code for this classroom".into(),
        ));
    }

    let code = allocate_code(pool, classroom_id).await?;

    let expires_at = Utc::now() + Duration::seconds(i64::from(expires_in));

    sqlx::query(
        r#"
        INSERT INTO attendance_session (code, classroom_id, status, expires_at)
        VALUES (?, ?, 'active', ?)
        "#,
    )
    .bind(&code)
    .bind(classroom_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    info!(classroom_id, %code, %expires_at, "Attendance code issued");

    Ok(IssuedSession {
        code,
        classroom_id,
        expires_at,
        expires_in,
    })
}

/// Generates a code and re-checks it against the classroom's currently active
/// code, retrying on collision.
async fn allocate_code(pool: &MySqlPool, classroom_id: u64) -> Result<String, ApiError> {
    for _ in 0..CODE_ALLOC_ATTEMPTS {
        let candidate = code::generate();

        let taken = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM attendance_session
                WHERE classroom_id = ? AND code = ? AND status = 'active' AND expires_at > NOW()
            )
            "#,
        )
        .bind(classroom_id)
        .bind(&candidate)
        .fetch_one(pool)
        .await?;

        if taken == 0 {
            return Ok(candidate);
        }
    }

    Err(ApiError::Conflict(
        "Could not allocate an attendance code, please retry".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_second_window() {
        assert!(validate_expires_in(0).is_err());
    }

    #[test]
    fn accepts_exactly_one_hour() {
        assert!(validate_expires_in(3600).is_ok());
    }

    #[test]
    fn rejects_just_over_one_hour() {
        assert!(validate_expires_in(3601).is_err());
    }

    #[test]
    fn accepts_original_five_minute_default() {
        assert!(validate_expires_in(300).is_ok());
    }
}
