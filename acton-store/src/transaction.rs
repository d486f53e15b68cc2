//! Unit-of-work transaction wrapper
//!
//! A unit of work is a closure that receives the open transaction and returns
//! a boxed future. It must own everything it captures:
//!
//! ```rust,ignore
//! let id = within_transaction(&pool, TransactionMode::CommitOnSuccess, |tx| {
//!     Box::pin(async move {
//!         let row = sqlx::query("INSERT INTO tags (name) VALUES ('x')")
//!             .execute(&mut **tx)
//!             .await?;
//!         Ok(row.last_insert_rowid())
//!     })
//! })
//! .await?;
//! ```

use futures::future::BoxFuture;

use crate::database::{DbPool, DbTransaction};
use crate::error::{DatabaseError, Error, Result};

/// How the outcome of a unit of work decides commit or rollback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionMode {
    /// Commit when the unit of work succeeds, roll back when it fails
    #[default]
    CommitOnSuccess,
    /// Commit whatever the outcome
    ///
    /// A failing unit of work can leave its earlier writes committed. Only use
    /// this where partial writes are acceptable.
    AlwaysCommit,
}

/// Run `work` inside one transaction on `pool`
///
/// Returns the unit of work's own result. A commit failure after a successful
/// unit of work is reported as a transaction error; when the unit of work has
/// already failed, its error is returned and the commit or rollback failure is
/// only logged.
pub async fn within_transaction<T, F>(pool: &DbPool, mode: TransactionMode, work: F) -> Result<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut DbTransaction<'static>) -> BoxFuture<'c, Result<T>>,
{
    let mut tx = pool.begin().await.map_err(|e| {
        Error::Database(DatabaseError::transaction_failed(format!(
            "Failed to begin transaction: {}",
            e
        )))
    })?;

    let outcome = work(&mut tx).await;

    match (mode, outcome) {
        (TransactionMode::CommitOnSuccess, Err(err)) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            } else {
                tracing::debug!("Transaction rolled back: {}", err);
            }
            Err(err)
        }
        (_, Ok(value)) => {
            tx.commit().await.map_err(|e| {
                Error::Database(DatabaseError::transaction_failed(format!(
                    "Failed to commit transaction: {}",
                    e
                )))
            })?;
            Ok(value)
        }
        (TransactionMode::AlwaysCommit, Err(err)) => {
            if let Err(commit_err) = tx.commit().await {
                tracing::warn!(error = %commit_err, "Transaction commit after failed unit of work failed");
            } else {
                tracing::debug!("Committed partial work of failed unit of work: {}", err);
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseErrorKind;
    use crate::testing::memory_pool;

    async fn tag_count(pool: &DbPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(pool)
            .await
            .expect("count tags")
    }

    async fn tags_pool() -> DbPool {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE tags (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .expect("create tags");
        pool
    }

    fn insert_then_fail<'c>(tx: &'c mut DbTransaction<'static>) -> BoxFuture<'c, Result<()>> {
        Box::pin(async move {
            sqlx::query("INSERT INTO tags (name) VALUES ('partial')")
                .execute(&mut **tx)
                .await?;
            Err(Error::Validation("second step failed".to_string()))
        })
    }

    #[tokio::test]
    async fn test_commit_on_success_commits() {
        let pool = tags_pool().await;

        let id = within_transaction(&pool, TransactionMode::CommitOnSuccess, |tx| {
            Box::pin(async move {
                let done = sqlx::query("INSERT INTO tags (name) VALUES ('kept')")
                    .execute(&mut **tx)
                    .await?;
                Ok(done.last_insert_rowid())
            })
        })
        .await
        .expect("unit of work");

        assert_eq!(id, 1);
        assert_eq!(tag_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_commit_on_success_rolls_back_failure() {
        let pool = tags_pool().await;

        let err = within_transaction(&pool, TransactionMode::CommitOnSuccess, insert_then_fail)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(tag_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_always_commit_keeps_partial_writes() {
        let pool = tags_pool().await;

        let err = within_transaction(&pool, TransactionMode::AlwaysCommit, insert_then_fail)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(tag_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_statement_error_is_returned() {
        let pool = tags_pool().await;

        let err = within_transaction(&pool, TransactionMode::CommitOnSuccess, |tx| {
            Box::pin(async move {
                sqlx::query("INSERT INTO missing_table (name) VALUES ('x')")
                    .execute(&mut **tx)
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();

        let db = err.as_database().expect("database error");
        assert_eq!(db.kind, DatabaseErrorKind::QueryFailed);
    }

    #[test]
    fn test_default_mode_commits_on_success_only() {
        assert_eq!(TransactionMode::default(), TransactionMode::CommitOnSuccess);
    }
}
