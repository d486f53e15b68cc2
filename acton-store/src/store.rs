//! The store handle and record CRUD
//!
//! Every operation runs as its own unit of work. Writes commit only when the
//! statement succeeds.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::QueryBuilder;

use crate::config::{default_rows, positive_rows_or_default, Config};
use crate::database::{create_pool, Db, DbPool, DbTransaction};
use crate::error::{db_error, DatabaseOperation, Error, Result};
use crate::model::{Record, CREATED_TIME_COLUMN, ID_COLUMN, UPDATED_TIME_COLUMN};
use crate::query::{is_valid_identifier, OrderClause, Predicate, QueryPlan};
use crate::transaction::{within_transaction, TransactionMode};
use crate::value::Value;

/// Handle to the record store
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: DbPool,
    default_rows: i64,
}

impl Store {
    /// Open the pool described by `config`
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = create_pool(&config.database).await?;
        Ok(Self {
            pool,
            default_rows: config.search.page_size(),
        })
    }

    /// Wrap an existing pool, using the default page size
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            default_rows: default_rows(),
        }
    }

    /// Override the page size used when a paged search asks for none
    ///
    /// Zero or less keeps the built-in default of 25.
    #[must_use]
    pub fn with_default_rows(mut self, rows: i64) -> Self {
        self.default_rows = positive_rows_or_default(rows);
        self
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Page size used when a paged search asks for zero or fewer rows
    pub fn default_rows(&self) -> i64 {
        self.default_rows
    }

    /// Run `work` in a transaction, committing only if it succeeds
    pub async fn within_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut DbTransaction<'static>) -> BoxFuture<'c, Result<T>>,
    {
        within_transaction(&self.pool, TransactionMode::CommitOnSuccess, work).await
    }

    /// Run `work` in a transaction that commits even when `work` fails
    ///
    /// See [`TransactionMode::AlwaysCommit`].
    pub async fn within_transaction_always_commit<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut DbTransaction<'static>) -> BoxFuture<'c, Result<T>>,
    {
        within_transaction(&self.pool, TransactionMode::AlwaysCommit, work).await
    }

    /// Run `work` in a transaction with an explicit mode
    pub async fn within_transaction_mode<T, F>(&self, mode: TransactionMode, work: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut DbTransaction<'static>) -> BoxFuture<'c, Result<T>>,
    {
        within_transaction(&self.pool, mode, work).await
    }

    /// Insert a new record and assign its identifier and timestamps
    ///
    /// A record that already has an identifier is left alone.
    pub async fn create<T: Record>(&self, record: &mut T) -> Result<()> {
        if !record.is_new() {
            tracing::debug!(
                table = T::TABLE,
                id = ?record.id(),
                "create skipped: record already tracked"
            );
            return Ok(());
        }

        let now = Utc::now();
        let values = checked_values(record)?;

        let id = self
            .within_transaction(move |tx| {
                Box::pin(async move {
                    let mut qb = insert_statement(T::TABLE, None, now, now, values);
                    let done = qb
                        .build()
                        .execute(&mut **tx)
                        .await
                        .map_err(db_error(DatabaseOperation::Insert, T::TABLE))?;
                    Ok(done.last_insert_rowid())
                })
            })
            .await?;

        let base = record.base_mut();
        base.id = Some(id);
        base.created_time = Some(now);
        base.updated_time = Some(now);

        tracing::debug!(table = T::TABLE, id, "record created");
        Ok(())
    }

    /// Write every column of a tracked record and bump its update time
    ///
    /// A new record is left alone. When the row no longer exists it is written
    /// again under the record's identifier.
    pub async fn save<T: Record>(&self, record: &mut T) -> Result<()> {
        let Some(id) = record.id() else {
            tracing::debug!(table = T::TABLE, "save skipped: record is new");
            return Ok(());
        };

        let now = Utc::now();
        let created = record.base().created_time.unwrap_or(now);
        let values = checked_values(record)?;

        let reinserted = self
            .within_transaction(move |tx| {
                Box::pin(async move {
                    let mut qb = update_statement(T::TABLE, id, now, values.clone());
                    let done = qb
                        .build()
                        .execute(&mut **tx)
                        .await
                        .map_err(db_error(DatabaseOperation::Update, T::TABLE))?;
                    if done.rows_affected() > 0 {
                        return Ok(false);
                    }

                    let mut qb = insert_statement(T::TABLE, Some(id), created, now, values);
                    qb.build()
                        .execute(&mut **tx)
                        .await
                        .map_err(db_error(DatabaseOperation::Insert, T::TABLE))?;
                    Ok(true)
                })
            })
            .await?;

        let base = record.base_mut();
        base.created_time = Some(created);
        base.updated_time = Some(now);

        tracing::debug!(table = T::TABLE, id, reinserted, "record saved");
        Ok(())
    }

    /// Delete the row of a tracked record
    ///
    /// Returns whether a row was removed.
    pub async fn delete<T: Record>(&self, record: &T) -> Result<bool> {
        let Some(id) = record.id() else {
            return Err(Error::Validation(format!(
                "Cannot delete a new {} record",
                T::TABLE
            )));
        };

        let removed = self
            .within_transaction(move |tx| {
                Box::pin(async move {
                    let mut qb: QueryBuilder<'static, Db> = QueryBuilder::new("DELETE FROM ");
                    qb.push(T::TABLE)
                        .push(" WHERE ")
                        .push(ID_COLUMN)
                        .push(" = ")
                        .push_bind(id);
                    let done = qb
                        .build()
                        .execute(&mut **tx)
                        .await
                        .map_err(db_error(DatabaseOperation::Delete, T::TABLE))?;
                    Ok(done.rows_affected() > 0)
                })
            })
            .await?;

        tracing::debug!(table = T::TABLE, id, removed, "record delete");
        Ok(removed)
    }

    /// Load the record with identifier `id`
    pub async fn find_by_id<T: Record>(&self, id: i64) -> Result<Option<T>> {
        let plan = QueryPlan::new(T::TABLE)
            .filter(Predicate::equals(ID_COLUMN, id))
            .order(OrderClause::desc(ID_COLUMN))
            .limit(1);

        let found = self
            .within_transaction(move |tx| {
                Box::pin(async move {
                    let mut qb = plan.select();
                    let row = qb
                        .build_query_as::<T>()
                        .fetch_optional(&mut **tx)
                        .await
                        .map_err(db_error(DatabaseOperation::Query, T::TABLE))?;
                    Ok(row)
                })
            })
            .await?;

        tracing::debug!(table = T::TABLE, id, found = found.is_some(), "find by id");
        Ok(found)
    }
}

/// Non-base column values of `record`, rejecting anything that is not a column name
fn checked_values<T: Record>(record: &T) -> Result<Vec<(&'static str, Value)>> {
    let values = record.values();
    if let Some((column, _)) = values.iter().find(|(c, _)| !is_valid_identifier(c)) {
        return Err(Error::Validation(format!(
            "'{}' is not a valid column of {}",
            column,
            T::TABLE
        )));
    }
    Ok(values)
}

fn insert_statement(
    table: &str,
    id: Option<i64>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    values: Vec<(&'static str, Value)>,
) -> QueryBuilder<'static, Db> {
    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(table).push(" (");
    if id.is_some() {
        qb.push(ID_COLUMN).push(", ");
    }
    qb.push(CREATED_TIME_COLUMN)
        .push(", ")
        .push(UPDATED_TIME_COLUMN);
    for (column, _) in &values {
        qb.push(", ").push(*column);
    }

    qb.push(") VALUES (");
    if let Some(id) = id {
        qb.push_bind(id).push(", ");
    }
    qb.push_bind(created).push(", ").push_bind(updated);
    for (_, value) in &values {
        qb.push(", ");
        value.push_bind(&mut qb);
    }
    qb.push(")");
    qb
}

fn update_statement(
    table: &str,
    id: i64,
    now: DateTime<Utc>,
    values: Vec<(&'static str, Value)>,
) -> QueryBuilder<'static, Db> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(table).push(" SET ");
    for (column, value) in &values {
        qb.push(*column).push(" = ");
        value.push_bind(&mut qb);
        qb.push(", ");
    }
    qb.push(UPDATED_TIME_COLUMN)
        .push(" = ")
        .push_bind(now)
        .push(" WHERE ")
        .push(ID_COLUMN)
        .push(" = ")
        .push_bind(id);
    qb
}
