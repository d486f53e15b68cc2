//! Shared fixtures for unit tests

use crate::config::DatabaseConfig;
use crate::database::{create_pool, DbPool};
use crate::filter::{CompareFilter, Filter, FilterFields};
use crate::model::{BaseModel, Record};
use crate::store::Store;
use crate::value::Value;

/// Single-connection in-memory pool; the database lives as long as the pool
pub(crate) async fn memory_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        connection_timeout_secs: 5,
        max_retries: 0,
        retry_delay_secs: 0,
    };
    create_pool(&config).await.expect("in-memory pool")
}

/// Store over a fresh in-memory database with the `customers` and `orders` tables
pub(crate) async fn memory_store() -> Store {
    let pool = memory_pool().await;

    sqlx::query(
        "CREATE TABLE customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_time TEXT,
            updated_time TEXT,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            age INTEGER NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .expect("create customers");

    sqlx::query(
        "CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_time TEXT,
            updated_time TEXT,
            customer_id INTEGER NOT NULL REFERENCES customers(id),
            total INTEGER NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .expect("create orders");

    Store::new(pool)
}

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub(crate) struct Customer {
    #[sqlx(flatten)]
    pub base: BaseModel,
    pub name: String,
    pub status: String,
    pub age: i64,
}

impl Customer {
    pub fn new(name: &str, status: &str, age: i64) -> Self {
        Self {
            base: BaseModel::default(),
            name: name.to_string(),
            status: status.to_string(),
            age,
        }
    }
}

impl Record for Customer {
    const TABLE: &'static str = "customers";

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", self.name.clone().into()),
            ("status", self.status.clone().into()),
            ("age", self.age.into()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub(crate) struct Order {
    #[sqlx(flatten)]
    pub base: BaseModel,
    pub customer_id: i64,
    pub total: i64,
}

impl Record for Order {
    const TABLE: &'static str = "orders";

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("customer_id", self.customer_id.into()),
            ("total", self.total.into()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CustomerFilter {
    pub name: Option<String>,
    pub status: Option<String>,
    pub statuses: Option<Vec<String>>,
    pub age: Option<CompareFilter>,
}

impl Filter for CustomerFilter {
    fn fields(&self) -> FilterFields {
        FilterFields::new()
            .like("name", self.name.as_deref())
            .equals("status", self.status.clone())
            .any_of("status", self.statuses.clone())
            .between("age", self.age.clone())
    }
}

/// Insert `customers` through the store, returning them with identifiers set
pub(crate) async fn seed(store: &Store, customers: Vec<Customer>) -> Vec<Customer> {
    let mut created = Vec::with_capacity(customers.len());
    for mut customer in customers {
        store.create(&mut customer).await.expect("seed customer");
        created.push(customer);
    }
    created
}
