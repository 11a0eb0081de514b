use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Emails known to be TAKEN. Registration is the hot path this protects:
/// a cache hit skips the database lookup entirely.
static EMAIL_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(email: &str) {
    EMAIL_CACHE.insert(email.to_lowercase(), true).await;
}

pub async fn is_taken(email: &str) -> bool {
    EMAIL_CACHE.get(&email.to_lowercase()).await.unwrap_or(false)
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.to_lowercase();

    if is_taken(&email).await {
        return false;
    }

    // Database fallback. If the lookup itself fails, report the email as
    // available and cache nothing: the insert's unique key still rejects
    // duplicates, and a transient error must not pin "taken" for the whole TTL.
    let exists = match sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM user WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    {
        Ok(v) => v,
        Err(_) => return true,
    };

    if exists != 0 {
        mark_taken(&email).await;
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    // connect_lazy builds a pool without a reachable server; the first query
    // fails, which is exactly the lookup-error path.
    #[tokio::test]
    async fn lookup_failure_does_not_poison_the_cache() {
        let pool = MySqlPool::connect_lazy("mysql://root@127.0.0.1:1/none").unwrap();
        let email = "lookup-failure@test.local";

        assert!(is_email_available(email, &pool).await);
        assert!(!is_taken(email).await);

        // Still available on retry rather than pinned taken for the TTL.
        assert!(is_email_available(email, &pool).await);
    }
}
