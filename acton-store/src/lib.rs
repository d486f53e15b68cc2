//! # acton-store
//!
//! Generic record persistence on top of sqlx: CRUD for any record that carries
//! an identifier and creation/update timestamps, declarative filters turned
//! into parameterized predicates, and paged search with ordering.
//!
//! ## Features
//!
//! - **Records**: embed [`BaseModel`] and implement [`Record`]; the store
//!   assigns identifiers and timestamps
//! - **Transactions**: every operation is its own unit of work; custom units of
//!   work run through [`Store::within_transaction`]
//! - **Filters**: each filter lists its fields with a column and a
//!   [`ConditionKind`]; absent fields impose nothing
//! - **Paged search**: count and page read on one connection, with metadata in
//!   [`PagedSearchResult`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use acton_store::prelude::*;
//!
//! #[derive(Debug, Clone, Default, sqlx::FromRow)]
//! struct Customer {
//!     #[sqlx(flatten)]
//!     base: BaseModel,
//!     name: String,
//!     status: String,
//! }
//!
//! impl Record for Customer {
//!     const TABLE: &'static str = "customers";
//!
//!     fn base(&self) -> &BaseModel {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut BaseModel {
//!         &mut self.base
//!     }
//!
//!     fn values(&self) -> Vec<(&'static str, Value)> {
//!         vec![("name", self.name.clone().into()), ("status", self.status.clone().into())]
//!     }
//! }
//!
//! #[derive(Default)]
//! struct CustomerFilter {
//!     name: Option<String>,
//!     statuses: Option<Vec<String>>,
//! }
//!
//! impl Filter for CustomerFilter {
//!     fn fields(&self) -> FilterFields {
//!         FilterFields::new()
//!             .like("name", self.name.as_deref())
//!             .any_of("status", self.statuses.clone())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = Store::connect(&config).await?;
//!
//!     let mut customer = Customer {
//!         name: "Ada Lovelace".to_string(),
//!         status: "active".to_string(),
//!         ..Default::default()
//!     };
//!     store.create(&mut customer).await?;
//!
//!     let filter = CustomerFilter {
//!         name: Some("ada".to_string()),
//!         ..Default::default()
//!     };
//!     let page = store
//!         .paged_filter_search::<Customer, _>(&PageRequest::new().with_order("name", "asc"), &filter)
//!         .await?;
//!     println!("{} matching customers", page.total_data);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod model;
pub mod observability;
pub mod pagination;
pub mod query;
mod search;
pub mod store;
pub mod transaction;
pub mod value;

#[cfg(test)]
mod testing;

pub use config::{Config, DatabaseConfig, SearchConfig, ServiceConfig};
pub use database::{create_pool, Db, DbConnection, DbPool, DbRow, DbTransaction};
pub use error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result};
pub use filter::{
    apply_filter, build_predicates, CompareFilter, ConditionKind, Filter, FilterField,
    FilterFields, FilterValue,
};
pub use model::{BaseModel, Record};
pub use observability::init_tracing;
pub use pagination::{PageRequest, PagedSearchResult};
pub use query::{parse_order, OrderClause, OrderDirection, Predicate, QueryPlan};
pub use store::Store;
pub use transaction::{within_transaction, TransactionMode};
pub use value::Value;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result};
    pub use crate::filter::{CompareFilter, ConditionKind, Filter, FilterFields, FilterValue};
    pub use crate::model::{BaseModel, Record};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{PageRequest, PagedSearchResult};
    pub use crate::query::{OrderClause, OrderDirection, QueryPlan};
    pub use crate::store::Store;
    pub use crate::transaction::TransactionMode;
    pub use crate::value::Value;

    pub use futures::future::BoxFuture;
    pub use sqlx;
    pub use tokio;
    pub use tracing::{debug, error, info, warn};
}
