//! End-to-end exercises of the attendance-code lifecycle against a live
//! MySQL. Run with a throwaway database:
//!
//!     DATABASE_URL=mysql://root@localhost/airclass_test cargo test -- --ignored

use airclass_api::attendance::{completion::CompletionScope, redeem, session};
use airclass_api::auth::auth::AuthUser;
use airclass_api::error::ApiError;
use airclass_api::model::role::Role;
use chrono::{Duration, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

async fn setup() -> MySqlPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
    let pool = MySqlPool::connect(&url).await.expect("connect");
    MIGRATOR.run(&pool).await.expect("migrations");
    pool
}

async fn create_user(pool: &MySqlPool, role: Role) -> (u64, AuthUser) {
    let email = format!("{}@test.local", Uuid::new_v4());
    let id = sqlx::query("INSERT INTO user (name, email, password, role) VALUES (?, ?, 'x', ?)")
        .bind("Test User")
        .bind(&email)
        .bind(role.to_string())
        .execute(pool)
        .await
        .expect("insert user")
        .last_insert_id();
    (
        id,
        AuthUser {
            user_id: id,
            email,
            role,
        },
    )
}

async fn create_classroom(pool: &MySqlPool, teacher_id: u64) -> u64 {
    sqlx::query("INSERT INTO classroom (code, ip, port, status, teacher_id) VALUES (?, '127.0.0.1', 8554, 1, ?)")
        .bind(format!("C-{}", &Uuid::new_v4().to_string()[..8]))
        .bind(teacher_id)
        .execute(pool)
        .await
        .expect("insert classroom")
        .last_insert_id()
}

async fn enroll(pool: &MySqlPool, classroom_id: u64, student_id: u64) {
    sqlx::query("INSERT INTO classroom_student (classroom_id, student_id, status) VALUES (?, ?, 1)")
        .bind(classroom_id)
        .bind(student_id)
        .execute(pool)
        .await
        .expect("enroll");
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn issue_then_redeem_then_duplicate() {
    let pool = setup().await;
    let (teacher_id, teacher) = create_user(&pool, Role::Teacher).await;
    let (_, student) = create_user(&pool, Role::Student).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    let issued = session::issue(&pool, &teacher, classroom_id, 60)
        .await
        .expect("issue");
    assert_eq!(issued.code.len(), 6);
    assert!(issued
        .code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    let expected = Utc::now() + Duration::seconds(60);
    assert!((issued.expires_at - expected).num_seconds().abs() <= 2);

    // While the first code is live a second issuance must conflict.
    let second = session::issue(&pool, &teacher, classroom_id, 60).await;
    assert!(matches!(second, Err(ApiError::Conflict(_))));

    let redeemed = redeem::redeem(
        &pool,
        CompletionScope::Roster,
        classroom_id,
        &issued.code,
        student.user_id,
    )
    .await
    .expect("redeem");
    assert_eq!(redeemed.attendance_code, issued.code);

    // Same student, same day: exactly once.
    let again = redeem::redeem(
        &pool,
        CompletionScope::Roster,
        classroom_id,
        &issued.code,
        student.user_id,
    )
    .await;
    assert!(matches!(again, Err(ApiError::DuplicateAttendance)));
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn second_session_same_day_still_rejects_duplicate() {
    let pool = setup().await;
    let (teacher_id, teacher) = create_user(&pool, Role::Teacher).await;
    let (_, student) = create_user(&pool, Role::Student).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    let first = session::issue(&pool, &teacher, classroom_id, 3600)
        .await
        .expect("issue first");
    redeem::redeem(
        &pool,
        CompletionScope::Roster,
        classroom_id,
        &first.code,
        student.user_id,
    )
    .await
    .expect("redeem first");

    // Teacher closes the session and opens a fresh one the same day.
    sqlx::query("UPDATE attendance_session SET status = 'closed' WHERE classroom_id = ?")
        .bind(classroom_id)
        .execute(&pool)
        .await
        .unwrap();
    let second = session::issue(&pool, &teacher, classroom_id, 3600)
        .await
        .expect("issue second");

    // The day-uniqueness check spans sessions, not just the per-session
    // unique key.
    let result = redeem::redeem(
        &pool,
        CompletionScope::Roster,
        classroom_id,
        &second.code,
        student.user_id,
    )
    .await;
    assert!(matches!(result, Err(ApiError::DuplicateAttendance)));

    let records = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE user_id = ?",
    )
    .bind(student.user_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(records, 1);
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn expired_code_is_rejected_and_leaves_no_record() {
    let pool = setup().await;
    let (teacher_id, _) = create_user(&pool, Role::Teacher).await;
    let (_, student) = create_user(&pool, Role::Student).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    // Session row that still says active but whose window has passed.
    sqlx::query(
        r#"
        INSERT INTO attendance_session (code, classroom_id, status, expires_at)
        VALUES ('ZZZZ99', ?, 'active', NOW() - INTERVAL 1 MINUTE)
        "#,
    )
    .bind(classroom_id)
    .execute(&pool)
    .await
    .unwrap();

    let result = redeem::redeem(
        &pool,
        CompletionScope::Roster,
        classroom_id,
        "ZZZZ99",
        student.user_id,
    )
    .await;
    assert!(matches!(result, Err(ApiError::InvalidOrExpiredCode)));

    let records = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM attendance a
        JOIN attendance_session s ON a.session_id = s.id
        WHERE s.classroom_id = ?
        "#,
    )
    .bind(classroom_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(records, 0);
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn issuance_validates_expiry_bounds() {
    let pool = setup().await;
    let (teacher_id, teacher) = create_user(&pool, Role::Teacher).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    assert!(matches!(
        session::issue(&pool, &teacher, classroom_id, 3601).await,
        Err(ApiError::Validation(_))
    ));
    assert!(matches!(
        session::issue(&pool, &teacher, classroom_id, 0).await,
        Err(ApiError::Validation(_))
    ));
    // Exactly one hour is the inclusive upper bound.
    assert!(session::issue(&pool, &teacher, classroom_id, 3600)
        .await
        .is_ok());
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn roster_completion_closes_session_for_later_redeemers() {
    let pool = setup().await;
    let (teacher_id, teacher) = create_user(&pool, Role::Teacher).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    let mut students = Vec::new();
    for _ in 0..3 {
        let (id, auth) = create_user(&pool, Role::Student).await;
        enroll(&pool, classroom_id, id).await;
        students.push(auth);
    }

    let issued = session::issue(&pool, &teacher, classroom_id, 3600)
        .await
        .expect("issue");

    for s in &students {
        redeem::redeem(
            &pool,
            CompletionScope::Roster,
            classroom_id,
            &issued.code,
            s.user_id,
        )
        .await
        .expect("redeem");
    }

    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM attendance_session WHERE code = ? AND classroom_id = ?",
    )
    .bind(&issued.code)
    .bind(classroom_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "closed");

    // Roster grows after completion: the closed session stays closed.
    let (late_id, late) = create_user(&pool, Role::Student).await;
    enroll(&pool, classroom_id, late_id).await;
    let result = redeem::redeem(
        &pool,
        CompletionScope::Roster,
        classroom_id,
        &issued.code,
        late.user_id,
    )
    .await;
    assert!(matches!(result, Err(ApiError::InvalidOrExpiredCode)));
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn global_scope_keeps_session_open_while_students_remain() {
    let pool = setup().await;
    let (teacher_id, teacher) = create_user(&pool, Role::Teacher).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;
    let (_, s1) = create_user(&pool, Role::Student).await;
    // A second student-role account guarantees the global population is
    // strictly larger than the redeemer set.
    let _ = create_user(&pool, Role::Student).await;

    let issued = session::issue(&pool, &teacher, classroom_id, 3600)
        .await
        .expect("issue");
    redeem::redeem(
        &pool,
        CompletionScope::Global,
        classroom_id,
        &issued.code,
        s1.user_id,
    )
    .await
    .expect("redeem");

    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM attendance_session WHERE code = ? AND classroom_id = ?",
    )
    .bind(&issued.code)
    .bind(classroom_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "active");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn concurrent_redemptions_insert_exactly_one_record() {
    let pool = setup().await;
    let (teacher_id, teacher) = create_user(&pool, Role::Teacher).await;
    let (student_id, _) = create_user(&pool, Role::Student).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    let issued = session::issue(&pool, &teacher, classroom_id, 3600)
        .await
        .expect("issue");

    // Same student hammers the same code; the session row lock serializes the
    // attempts and the day-uniqueness check rejects every one but the first.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let code = issued.code.clone();
        handles.push(tokio::spawn(async move {
            redeem::redeem(&pool, CompletionScope::Roster, classroom_id, &code, student_id).await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ApiError::DuplicateAttendance) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);

    let records = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE user_id = ?",
    )
    .bind(student_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(records, 1);
}

#[tokio::test]
#[ignore = "requires a MySQL instance, set DATABASE_URL"]
async fn only_owners_and_admins_issue_codes() {
    let pool = setup().await;
    let (teacher_id, _) = create_user(&pool, Role::Teacher).await;
    let (_, other_teacher) = create_user(&pool, Role::Teacher).await;
    let (_, admin) = create_user(&pool, Role::Admin).await;
    let (_, student) = create_user(&pool, Role::Student).await;
    let classroom_id = create_classroom(&pool, teacher_id).await;

    // Role check holds at the operation itself, not only in the handler.
    let result = session::issue(&pool, &student, classroom_id, 60).await;
    assert!(matches!(result, Err(ApiError::Authorization(_))));

    let result = session::issue(&pool, &other_teacher, classroom_id, 60).await;
    assert!(matches!(result, Err(ApiError::Authorization(_))));

    // Admins bypass ownership.
    assert!(session::issue(&pool, &admin, classroom_id, 60).await.is_ok());
}
