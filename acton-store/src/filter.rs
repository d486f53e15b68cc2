//! Filter clause builder
//!
//! A filter is any type that lists its fields through [`Filter::fields`]. Each
//! field names the column it targets, the [`ConditionKind`] to apply, and an
//! optional value. Absent fields impose no constraint; every present field
//! turns into exactly one [`Predicate`], and the predicates are ANDed.
//!
//! # Example
//!
//! ```rust
//! use acton_store::{apply_filter, CompareFilter, Filter, FilterFields, QueryPlan};
//!
//! #[derive(Default)]
//! struct CustomerFilter {
//!     name: Option<String>,
//!     status: Option<Vec<String>>,
//!     age: Option<CompareFilter>,
//! }
//!
//! impl Filter for CustomerFilter {
//!     fn fields(&self) -> FilterFields {
//!         FilterFields::new()
//!             .like("name", self.name.as_deref())
//!             .any_of("status", self.status.clone())
//!             .between("age", self.age.clone())
//!     }
//! }
//!
//! let filter = CustomerFilter {
//!     name: Some("Smith".to_string()),
//!     ..Default::default()
//! };
//! let plan = apply_filter(QueryPlan::new("customers"), &filter).unwrap();
//! assert_eq!(
//!     plan.select().sql(),
//!     "SELECT * FROM customers WHERE LOWER(name) LIKE ?"
//! );
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::query::{is_valid_identifier, Predicate, QueryPlan};
use crate::value::Value;

/// How a filter field is compared against its column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConditionKind {
    /// `column = value`
    #[default]
    Equals,
    /// Case-insensitive substring match; text values only
    ///
    /// The needle is lowercased and wrapped in `%`. On SQLite, `LOWER()` folds
    /// ASCII letters only, so non-ASCII text matches case-sensitively. `%` and
    /// `_` inside the needle are not escaped and act as wildcards.
    Like,
    /// Column equals any entry of a string list
    Or,
    /// Column within an inclusive range; skipped when the lower bound is empty
    Between,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => write!(f, "EQUALS"),
            Self::Like => write!(f, "LIKE"),
            Self::Or => write!(f, "OR"),
            Self::Between => write!(f, "BETWEEN"),
        }
    }
}

/// Two-value range for [`ConditionKind::Between`]
#[derive(Debug, Clone, PartialEq)]
pub struct CompareFilter {
    /// Inclusive lower bound; an empty value disables the range
    pub value1: Value,
    /// Inclusive upper bound
    pub value2: Value,
}

impl CompareFilter {
    /// Range from `value1` to `value2`, both inclusive
    pub fn new(value1: impl Into<Value>, value2: impl Into<Value>) -> Self {
        Self {
            value1: value1.into(),
            value2: value2.into(),
        }
    }
}

/// Value held by a filter field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A single scalar
    Scalar(Value),
    /// A list of alternatives
    List(Vec<String>),
    /// A lower and upper bound
    Range(CompareFilter),
}

impl FilterValue {
    fn describe(&self) -> String {
        match self {
            Self::Scalar(value) => format!("{} value", value.type_name()),
            Self::List(_) => "list value".to_string(),
            Self::Range(_) => "range value".to_string(),
        }
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Scalar(n.into())
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Scalar(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Scalar(n.into())
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Scalar(b.into())
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Scalar(t.into())
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(list: Vec<&str>) -> Self {
        Self::List(list.into_iter().map(str::to_string).collect())
    }
}

impl From<CompareFilter> for FilterValue {
    fn from(range: CompareFilter) -> Self {
        Self::Range(range)
    }
}

/// One declared filter field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    /// Column the field targets
    pub column: String,
    /// Comparison to apply
    pub condition: ConditionKind,
    /// `None` when the caller did not specify this field
    pub value: Option<FilterValue>,
}

impl FilterField {
    /// Turn this field into a predicate
    ///
    /// Returns `Ok(None)` when the field imposes no constraint: the value is
    /// absent or null, an `Or` list is empty, or a `Between` lower bound is
    /// empty. A missing column or a value that does not fit the condition
    /// kind is an error.
    pub fn to_predicate(&self) -> Result<Option<Predicate>> {
        if self.column.trim().is_empty() {
            return Err(Error::invalid_filter(
                &self.column,
                format!("{} field has no column mapping", self.condition),
            ));
        }
        if !is_valid_identifier(&self.column) {
            return Err(Error::invalid_filter(
                &self.column,
                "column mapping is not a plain identifier",
            ));
        }

        let Some(value) = &self.value else {
            return Ok(None);
        };
        let column = self.column.clone();

        let predicate = match (self.condition, value) {
            (ConditionKind::Equals, FilterValue::Scalar(Value::Null)) => None,
            (ConditionKind::Equals, FilterValue::Scalar(value)) => Some(Predicate::Equals {
                column,
                value: value.clone(),
            }),
            (ConditionKind::Like, FilterValue::Scalar(Value::Text(text))) => {
                Some(Predicate::contains(column, text))
            }
            (ConditionKind::Or, FilterValue::List(values)) if values.is_empty() => None,
            (ConditionKind::Or, FilterValue::List(values)) => Some(Predicate::AnyOf {
                column,
                values: values.clone(),
            }),
            (ConditionKind::Between, FilterValue::Range(range)) if range.value1.is_empty() => {
                None
            }
            (ConditionKind::Between, FilterValue::Range(range)) => Some(Predicate::Between {
                column,
                low: range.value1.clone(),
                high: range.value2.clone(),
            }),
            (condition, other) => {
                return Err(Error::invalid_filter(
                    &self.column,
                    format!("{} cannot be applied to a {}", condition, other.describe()),
                ));
            }
        };

        Ok(predicate)
    }
}

/// Declarative list of filter fields
///
/// Built once per filter value; the typed helpers (`equals`, `like`, `any_of`,
/// `between`) cannot produce a kind/value mismatch, while [`FilterFields::field`]
/// accepts any combination and leaves the check to [`apply_filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterFields {
    fields: Vec<FilterField>,
}

impl FilterFields {
    /// Empty field list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field with an explicit condition kind
    #[must_use]
    pub fn field<V: Into<FilterValue>>(
        mut self,
        column: impl Into<String>,
        condition: ConditionKind,
        value: Option<V>,
    ) -> Self {
        self.fields.push(FilterField {
            column: column.into(),
            condition,
            value: value.map(Into::into),
        });
        self
    }

    /// Equality on `column`
    #[must_use]
    pub fn equals<V: Into<Value>>(self, column: impl Into<String>, value: Option<V>) -> Self {
        self.field(
            column,
            ConditionKind::Equals,
            value.map(|v| FilterValue::Scalar(v.into())),
        )
    }

    /// Case-insensitive substring match on `column`
    ///
    /// See [`ConditionKind::Like`] for the ASCII-only folding and the
    /// unescaped `%` and `_` wildcards.
    #[must_use]
    pub fn like<S: AsRef<str>>(self, column: impl Into<String>, value: Option<S>) -> Self {
        self.field(
            column,
            ConditionKind::Like,
            value.map(|s| FilterValue::from(s.as_ref())),
        )
    }

    /// `column` equals any of the given strings
    #[must_use]
    pub fn any_of<I, S>(self, column: impl Into<String>, values: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field(
            column,
            ConditionKind::Or,
            values.map(|list| FilterValue::List(list.into_iter().map(Into::into).collect())),
        )
    }

    /// `column` within the inclusive range
    #[must_use]
    pub fn between(self, column: impl Into<String>, range: Option<CompareFilter>) -> Self {
        self.field(column, ConditionKind::Between, range)
    }

    /// Declared fields in order
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, FilterField> {
        self.fields.iter()
    }

    /// Number of declared fields, present or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FilterFields {
    type Item = &'a FilterField;
    type IntoIter = std::slice::Iter<'a, FilterField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A caller-defined filter shape
pub trait Filter {
    /// The fields of this filter, with their column mapping and condition kind
    fn fields(&self) -> FilterFields;
}

impl Filter for FilterFields {
    fn fields(&self) -> FilterFields {
        self.clone()
    }
}

/// The empty filter; matches every row
impl Filter for () {
    fn fields(&self) -> FilterFields {
        FilterFields::new()
    }
}

/// Build the predicates for every present field of `filter`, in field order
pub fn build_predicates<F: Filter + ?Sized>(filter: &F) -> Result<Vec<Predicate>> {
    let fields = filter.fields();
    let mut predicates = Vec::with_capacity(fields.len());
    for field in &fields {
        if let Some(predicate) = field.to_predicate()? {
            predicates.push(predicate);
        }
    }
    Ok(predicates)
}

/// AND the predicates of `filter` onto `plan`
///
/// Fails without touching anything if any field is misconfigured.
pub fn apply_filter<F: Filter + ?Sized>(plan: QueryPlan, filter: &F) -> Result<QueryPlan> {
    let predicates = build_predicates(filter)?;
    tracing::trace!(
        table = plan.table(),
        predicates = predicates.len(),
        "applying filter"
    );
    Ok(predicates.into_iter().fold(plan, QueryPlan::filter))
}
