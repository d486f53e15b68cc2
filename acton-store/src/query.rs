//! Immutable query plans
//!
//! A [`QueryPlan`] describes one select against one table: predicates,
//! ordering, limit and offset. Every builder step consumes the plan and
//! returns a new one; nothing is sent to the database until the finished plan
//! is rendered with [`QueryPlan::select`] or [`QueryPlan::count`].
//!
//! ```rust
//! use acton_store::{OrderClause, Predicate, QueryPlan};
//!
//! let plan = QueryPlan::new("customers")
//!     .filter(Predicate::equals("status", "active"))
//!     .order(OrderClause::desc("age"))
//!     .limit(10)
//!     .offset(20);
//!
//! assert_eq!(
//!     plan.select().sql(),
//!     "SELECT * FROM customers WHERE status = ? ORDER BY age DESC LIMIT ? OFFSET ?"
//! );
//! assert_eq!(plan.count().sql(), "SELECT COUNT(*) FROM customers WHERE status = ?");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sqlx::QueryBuilder;

use crate::database::Db;
use crate::error::{Error, Result};
use crate::value::Value;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern should be valid")
});

/// Whether `name` is safe to splice into SQL as a column reference
///
/// Accepts `column` and `table.column` made of ASCII letters, digits and
/// underscores.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Sort direction for an order clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending (A-Z, 0-9)
    Asc,
    /// Descending (Z-A, 9-0)
    Desc,
}

impl OrderDirection {
    /// Parse `asc` / `desc` in any letter case; anything else is `None`
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One `ORDER BY` key
///
/// A clause without a direction leaves ordering to the database default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    /// Column to order by
    pub column: String,
    /// Explicit direction, if any
    pub direction: Option<OrderDirection>,
}

impl OrderClause {
    /// Order by `column` with no explicit direction
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: None,
        }
    }

    /// Order by `column` ascending
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Some(OrderDirection::Asc),
        }
    }

    /// Order by `column` descending
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Some(OrderDirection::Desc),
        }
    }
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(f, "{} {}", self.column, direction),
            None => f.write_str(&self.column),
        }
    }
}

/// Parse a comma-separated column list paired positionally with a
/// comma-separated direction list
///
/// Directions are matched case-insensitively against `ASC` and `DESC`. A
/// missing or unrecognized direction leaves that column without a direction.
/// Blank column entries are skipped; a column that is not a plain identifier
/// is rejected.
///
/// ```rust
/// use acton_store::{parse_order, OrderClause};
///
/// let clauses = parse_order("name,age", "desc").unwrap();
/// assert_eq!(clauses, vec![OrderClause::desc("name"), OrderClause::new("age")]);
/// ```
pub fn parse_order(order_by: &str, sort: &str) -> Result<Vec<OrderClause>> {
    if order_by.trim().is_empty() {
        return Ok(Vec::new());
    }

    let directions: Vec<&str> = sort.split(',').collect();
    let mut clauses = Vec::new();

    for (index, column) in order_by.split(',').enumerate() {
        let column = column.trim();
        if column.is_empty() {
            continue;
        }
        if !is_valid_identifier(column) {
            return Err(Error::InvalidOrder(format!(
                "'{}' is not a column name",
                column
            )));
        }
        let direction = directions
            .get(index)
            .and_then(|token| OrderDirection::parse(token));
        clauses.push(OrderClause {
            column: column.to_string(),
            direction,
        });
    }

    Ok(clauses)
}

/// One constraint in a `WHERE` clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Equals {
        /// Target column
        column: String,
        /// Operand
        value: Value,
    },
    /// `LOWER(column) LIKE pattern`
    Like {
        /// Target column
        column: String,
        /// Complete pattern, wildcards included
        pattern: String,
    },
    /// `(column = v1 OR column = v2 ...)`
    AnyOf {
        /// Target column
        column: String,
        /// Accepted values, in order
        values: Vec<String>,
    },
    /// `column BETWEEN low AND high`
    Between {
        /// Target column
        column: String,
        /// Inclusive lower bound
        low: Value,
        /// Inclusive upper bound
        high: Value,
    },
}

impl Predicate {
    /// `column = value`
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive substring match on `needle`
    ///
    /// `LOWER()` on SQLite folds ASCII only. `%` and `_` in `needle` are passed
    /// through as wildcards.
    pub fn contains(column: impl Into<String>, needle: &str) -> Self {
        Self::Like {
            column: column.into(),
            pattern: format!("%{}%", needle.to_lowercase()),
        }
    }

    /// Column that this predicate constrains
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Equals { column, .. }
            | Self::Like { column, .. }
            | Self::AnyOf { column, .. }
            | Self::Between { column, .. } => column,
        }
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'static, Db>) {
        match self {
            Self::Equals { column, value } => {
                qb.push(column.as_str()).push(" = ");
                value.push_bind(qb);
            }
            Self::Like { column, pattern } => {
                qb.push("LOWER(")
                    .push(column.as_str())
                    .push(") LIKE ")
                    .push_bind(pattern.clone());
            }
            Self::AnyOf { column, values } => {
                qb.push("(");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(column.as_str())
                        .push(" = ")
                        .push_bind(value.clone());
                }
                qb.push(")");
            }
            Self::Between { column, low, high } => {
                qb.push(column.as_str()).push(" BETWEEN ");
                low.push_bind(qb);
                qb.push(" AND ");
                high.push_bind(qb);
            }
        }
    }
}

/// Description of a single-table select
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    table: String,
    predicates: Vec<Predicate>,
    orders: Vec<OrderClause>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl QueryPlan {
    /// Select everything from `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// AND another predicate onto the plan
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Append an order key; earlier keys take precedence
    #[must_use]
    pub fn order(mut self, clause: OrderClause) -> Self {
        self.orders.push(clause);
        self
    }

    /// Append several order keys in sequence
    #[must_use]
    pub fn orders(mut self, clauses: impl IntoIterator<Item = OrderClause>) -> Self {
        self.orders.extend(clauses);
        self
    }

    /// Return at most `limit` rows
    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` rows
    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Target table
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Predicates in application order
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Order keys in precedence order
    #[must_use]
    pub fn order_clauses(&self) -> &[OrderClause] {
        &self.orders
    }

    /// Render `SELECT *` with predicates, ordering, limit and offset
    #[must_use]
    pub fn select(&self) -> QueryBuilder<'static, Db> {
        let mut qb = QueryBuilder::new("SELECT * FROM ");
        qb.push(self.table.as_str());
        self.push_where(&mut qb);

        if !self.orders.is_empty() {
            qb.push(" ORDER BY ");
            for (i, clause) in self.orders.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(clause.to_string());
            }
        }

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                qb.push(" LIMIT ").push_bind(limit);
                if let Some(offset) = offset {
                    qb.push(" OFFSET ").push_bind(offset);
                }
            }
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
            (None, Some(offset)) => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(offset);
            }
            (None, None) => {}
        }

        qb
    }

    /// Render `SELECT COUNT(*)` under the predicates only
    #[must_use]
    pub fn count(&self) -> QueryBuilder<'static, Db> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
        qb.push(self.table.as_str());
        self.push_where(&mut qb);
        qb
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Db>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.push_sql(qb);
        }
    }
}
