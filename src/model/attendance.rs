use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// One issued attendance code and its validity window.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceSession {
    pub id: u64,
    pub code: String,
    pub classroom_id: u64,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AttendanceSession {
    /// Lazy expiry: an expired-but-still-active row counts as closed the
    /// moment anyone reads it. There is no background sweeper.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active && self.expires_at > now
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub session_id: u64,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(status: SessionStatus, expires_in: i64) -> AttendanceSession {
        let now = Utc::now();
        AttendanceSession {
            id: 1,
            code: "A1B2C3".into(),
            classroom_id: 7,
            status,
            created_at: now,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn active_unexpired_session_is_redeemable() {
        let s = session(SessionStatus::Active, 60);
        assert!(s.is_redeemable(Utc::now()));
    }

    #[test]
    fn expired_session_is_not_redeemable() {
        let s = session(SessionStatus::Active, 60);
        assert!(!s.is_redeemable(s.expires_at));
        assert!(!s.is_redeemable(s.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn closed_session_is_never_redeemable() {
        let s = session(SessionStatus::Closed, 3600);
        assert!(!s.is_redeemable(Utc::now()));
    }
}
