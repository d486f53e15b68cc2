//! Filtered searches over a record table

use crate::error::{db_error, DatabaseOperation, Result};
use crate::filter::{apply_filter, Filter};
use crate::model::{Record, ID_COLUMN};
use crate::pagination::{PageRequest, PagedSearchResult};
use crate::query::{parse_order, OrderClause, QueryPlan};
use crate::store::Store;

impl Store {
    /// Most recent record matching `filter`
    pub async fn filter_search_single<T, F>(&self, filter: &F) -> Result<Option<T>>
    where
        T: Record,
        F: Filter + ?Sized,
    {
        let plan = apply_filter(QueryPlan::new(T::TABLE), filter)?
            .order(OrderClause::desc(ID_COLUMN))
            .limit(1);

        let mut qb = plan.select();
        let found = qb
            .build_query_as::<T>()
            .fetch_optional(self.pool())
            .await
            .map_err(db_error(DatabaseOperation::Query, T::TABLE))?;

        tracing::debug!(
            table = T::TABLE,
            predicates = plan.predicates().len(),
            found = found.is_some(),
            "filter search single"
        );
        Ok(found)
    }

    /// Every record matching `filter`
    pub async fn filter_search<T, F>(&self, filter: &F) -> Result<Vec<T>>
    where
        T: Record,
        F: Filter + ?Sized,
    {
        let plan = apply_filter(QueryPlan::new(T::TABLE), filter)?;

        let mut qb = plan.select();
        let rows = qb
            .build_query_as::<T>()
            .fetch_all(self.pool())
            .await
            .map_err(db_error(DatabaseOperation::Query, T::TABLE))?;

        tracing::debug!(
            table = T::TABLE,
            predicates = plan.predicates().len(),
            count = rows.len(),
            "filter search"
        );
        Ok(rows)
    }

    /// One page of the records matching `filter`, with the total count
    ///
    /// The count and the page are read on the same connection.
    pub async fn paged_filter_search<T, F>(
        &self,
        request: &PageRequest,
        filter: &F,
    ) -> Result<PagedSearchResult<T>>
    where
        T: Record,
        F: Filter + ?Sized,
    {
        let page = request.page_number();
        let rows = request.rows_per_page(self.default_rows());
        let orders = parse_order(&request.order_by, &request.sort)?;
        let plan = apply_filter(QueryPlan::new(T::TABLE), filter)?;

        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(db_error(DatabaseOperation::PoolAcquire, T::TABLE))?;

        let mut count_qb = plan.count();
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error(DatabaseOperation::Count, T::TABLE))?;

        let plan = plan
            .orders(orders)
            .limit(rows)
            .offset(request.offset(self.default_rows()));

        let mut qb = plan.select();
        let data = qb
            .build_query_as::<T>()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error(DatabaseOperation::Query, T::TABLE))?;

        tracing::debug!(
            table = T::TABLE,
            total,
            page,
            rows,
            returned = data.len(),
            "paged filter search"
        );
        Ok(PagedSearchResult::new(total, rows, page, data))
    }
}
