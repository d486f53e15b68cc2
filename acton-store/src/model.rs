//! Record model shared by every persisted entity
//!
//! A record embeds [`BaseModel`] (identifier plus creation and update
//! timestamps) and implements [`Record`] to tell the store its table and
//! column values.
//!
//! # Example
//!
//! ```rust
//! use acton_store::{BaseModel, Record, Value};
//!
//! #[derive(Debug, Clone, Default, sqlx::FromRow)]
//! struct Customer {
//!     #[sqlx(flatten)]
//!     base: BaseModel,
//!     name: String,
//!     age: i64,
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
//!         vec![("name", self.name.clone().into()), ("age", self.age.into())]
//!     }
//! }
//!
//! let customer = Customer::default();
//! assert!(customer.is_new());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::DbRow;
use crate::value::Value;

/// Identifier column name
pub const ID_COLUMN: &str = "id";

/// Creation timestamp column name
pub const CREATED_TIME_COLUMN: &str = "created_time";

/// Update timestamp column name
pub const UPDATED_TIME_COLUMN: &str = "updated_time";

/// Attributes every record carries
///
/// `id` is assigned by the database on insert. Both timestamps are written by
/// the store; callers should leave them alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BaseModel {
    /// Database-assigned identifier; `None` until the record is created
    pub id: Option<i64>,
    /// When the row was inserted
    pub created_time: Option<DateTime<Utc>>,
    /// When the row was last written
    pub updated_time: Option<DateTime<Utc>>,
}

impl BaseModel {
    /// Whether the record has not been persisted yet
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// A persisted entity
///
/// `values` lists every column except the three [`BaseModel`] ones, in the
/// order they are written.
pub trait Record: for<'r> FromRow<'r, DbRow> + Send + Sync + Unpin + 'static {
    /// Table the record lives in
    const TABLE: &'static str;

    /// The shared identifier and timestamps
    fn base(&self) -> &BaseModel;

    /// Mutable access to the shared identifier and timestamps
    fn base_mut(&mut self) -> &mut BaseModel;

    /// Column name and value pairs for every non-base column
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Identifier, if the record has been created
    fn id(&self) -> Option<i64> {
        self.base().id
    }

    /// Whether the store is not tracking this record yet
    fn is_new(&self) -> bool {
        self.base().is_new()
    }
}
