// src/common/db_utils.rs

use std::future::Future;

use crate::common::error::AppError;

// SQLSTATE codes Postgres uses when two transactions collide
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

pub(crate) fn is_serialization_conflict(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED)
}

/// Turns a transactional collision on `outlet_id` into `ConcurrentModification`.
pub(crate) fn into_conflict(err: AppError, outlet_id: i64) -> AppError {
    match err {
        AppError::DatabaseError(ref e) if is_serialization_conflict(e) => {
            AppError::ConcurrentModification(outlet_id)
        }
        other => other,
    }
}

/// Runs a read-modify-write on an outlet, retrying exactly once when the
/// first attempt lost a race. The second failure goes back to the caller.
pub(crate) async fn retry_once_on_conflict<T, F, Fut>(outlet_id: i64, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match op().await.map_err(|e| into_conflict(e, outlet_id)) {
        Err(AppError::ConcurrentModification(_)) => {
            tracing::warn!(outlet_id, "concurrent modification on outlet, retrying once");
            op().await.map_err(|e| into_conflict(e, outlet_id))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_a_conflict_once() {
        let calls = AtomicUsize::new(0);
        let result = retry_once_on_conflict(5, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AppError::ConcurrentModification(5))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_conflict_is_surfaced() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), AppError> = retry_once_on_conflict(5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::ConcurrentModification(5)) }
        })
        .await;

        assert!(matches!(result, Err(AppError::ConcurrentModification(5))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn state_machine_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), AppError> = retry_once_on_conflict(5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::NoOpenApprovalRequest(12)) }
        })
        .await;

        assert!(matches!(result, Err(AppError::NoOpenApprovalRequest(12))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_database_errors_pass_through() {
        let e = into_conflict(AppError::NotFound("Outlet"), 1);
        assert!(matches!(e, AppError::NotFound("Outlet")));
    }
}
