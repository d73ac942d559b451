//! Optimistic concurrency for versioned rows.
//!
//! A writer reads a row together with its `version`, then only updates
//! `WHERE id = ? AND version = ?`. When another writer got there first the
//! update touches zero rows and the operation fails with a retryable error.
//! [`retry_on_conflict`] re-runs the *whole* operation (fresh transaction,
//! fresh read) a bounded number of times.
use sqlx::PgConnection;

use std::{fmt::Display, future::Future, time::Duration};

/// A row guarded by a `version` column.
pub trait Versioned {
    const TABLE: &'static str;

    fn row_id(&self) -> uuid::Uuid;
    fn version(&self) -> i32;
}

pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(10),
        }
    }
}

pub async fn retry_on_conflict<T, E, F, Fut>(policy: RetryPolicy, mut attempt: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    let mut n = 1;
    loop {
        match attempt().await {
            Err(e) if e.is_retryable() && n < policy.max_attempts => {
                tracing::debug!(attempt = n, error = %e, "optimistic conflict, retrying");
                tokio::time::sleep(policy.backoff * n).await;
                n += 1;
            }
            res => return res,
        }
    }
}

/// Takes the row lock for `entity` only if the row is still at the version
/// `entity` was read at. Returns `false` when the version moved on.
pub(crate) async fn lock_at_version<V: Versioned>(
    conn: &mut PgConnection,
    entity: &V,
) -> Result<bool, sqlx::Error> {
    let row: Option<i32> = sqlx::query_scalar(&format!(
        "SELECT version FROM {} WHERE id = $1 AND version = $2 FOR UPDATE",
        V::TABLE
    ))
    .bind(entity.row_id())
    .bind(entity.version())
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    #[derive(Debug)]
    struct Conflict(bool);

    impl Display for Conflict {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "conflict (retryable: {})", self.0)
        }
    }

    impl RetryableError for Conflict {
        fn is_retryable(&self) -> bool {
            self.0
        }
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let res = retry_on_conflict(fast(5), || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Conflict(true))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(res.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let res: Result<(), _> = retry_on_conflict(fast(3), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Conflict(true))
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_other_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let res: Result<(), _> = retry_on_conflict(fast(5), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Conflict(false))
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
