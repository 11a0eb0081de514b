use crate::error::ApiError;
use sqlx::{MySql, Transaction};
use strum::{Display, EnumString};

/// Which population a session must cover before it auto-closes. The original
/// deployments disagreed on this, so it is a configuration choice rather
/// than a guess.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CompletionScope {
    /// Every account with the student role.
    Global,
    /// Active enrollment rows for the classroom.
    Roster,
}

/// Runs inside the redemption transaction so two near-simultaneous last
/// redemptions cannot both see "not yet complete".
pub async fn is_complete(
    tx: &mut Transaction<'_, MySql>,
    session_id: u64,
    classroom_id: u64,
    scope: CompletionScope,
) -> Result<bool, ApiError> {
    let marked = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT user_id) FROM attendance WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_one(&mut **tx)
    .await?;

    let eligible = match scope {
        CompletionScope::Global => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user WHERE role = 'student'")
                .fetch_one(&mut **tx)
                .await?
        }
        CompletionScope::Roster => sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM classroom_student WHERE classroom_id = ? AND status = 1",
        )
        .bind(classroom_id)
        .fetch_one(&mut **tx)
        .await?,
    };

    // An empty population never completes a session.
    Ok(eligible > 0 && marked >= eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn scope_parses_from_config_values() {
        assert_eq!(
            CompletionScope::from_str("global").unwrap(),
            CompletionScope::Global
        );
        assert_eq!(
            CompletionScope::from_str("roster").unwrap(),
            CompletionScope::Roster
        );
        assert!(CompletionScope::from_str("everyone").is_err());
    }
}
