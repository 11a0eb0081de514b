use crate::attendance::completion::{self, CompletionScope};
use crate::error::ApiError;
use crate::model::attendance::{AttendanceRecord, AttendanceSession};
use chrono::Utc;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Redeemed {
    pub attendance_id: u64,
    #[schema(example = "A1B2C3")]
    pub attendance_code: String,
}

/// Redeems an attendance code for one student.
///
/// The whole operation is one transaction holding an exclusive lock on the
/// session row: concurrent redemptions of the same code serialize here, and
/// the completion check cannot race the status flip. Any failure rolls the
/// transaction back; no partial record or status change is ever visible.
pub async fn redeem(
    pool: &MySqlPool,
    scope: CompletionScope,
    classroom_id: u64,
    code: &str,
    student_id: u64,
) -> Result<Redeemed, ApiError> {
    let mut tx = pool.begin().await?;

    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, code, classroom_id, status, created_at, expires_at
        FROM attendance_session
        WHERE code = ? AND classroom_id = ? AND status = 'active'
        FOR UPDATE
        "#,
    )
    .bind(code)
    .bind(classroom_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::InvalidOrExpiredCode)?;

    // Lazy expiry: the row may still say active.
    if !session.is_redeemable(Utc::now()) {
        return Err(ApiError::InvalidOrExpiredCode);
    }

    // One record per (classroom, student, day), across every session the
    // classroom ran that day.
    let already = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM attendance a
        JOIN attendance_session s ON a.session_id = s.id
        WHERE s.classroom_id = ? AND a.user_id = ? AND DATE(a.created_at) = CURDATE()
        "#,
    )
    .bind(classroom_id)
    .bind(student_id)
    .fetch_one(&mut *tx)
    .await?;

    if already > 0 {
        return Err(ApiError::DuplicateAttendance);
    }

    let inserted = sqlx::query("INSERT INTO attendance (session_id, user_id) VALUES (?, ?)")
        .bind(session.id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    let record = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT id, session_id, user_id, created_at FROM attendance WHERE id = ?",
    )
    .bind(inserted.last_insert_id())
    .fetch_one(&mut *tx)
    .await?;

    if completion::is_complete(&mut tx, session.id, classroom_id, scope).await? {
        sqlx::query("UPDATE attendance_session SET status = 'closed' WHERE id = ?")
            .bind(session.id)
            .execute(&mut *tx)
            .await?;
        info!(session_id = session.id, classroom_id, "All students redeemed, session closed");
    }

    tx.commit().await?;

    info!(attendance_id = record.id, classroom_id, student_id, "Attendance marked");

    Ok(Redeemed {
        attendance_id: record.id,
        attendance_code: session.code,
    })
}
