//! Read access to named collections: equality filters, single-field ordering
//! and row limits, behind one client trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use strum_macros::Display;
use thiserror::Error;
use tracing::{debug, error};
use ts_rs::TS;

pub mod memory;
pub mod sqlite;

/// A single record as returned by a collection read.
pub type Row = serde_json::Map<String, Value>;

/// Tagged failure category surfaced to callers of [`CollectionClient::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    RemoteUnavailable,
    NotFound,
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection not found: {0}")]
    UnknownCollection(String),
    #[error("unknown field '{field}' on collection '{collection}'")]
    UnknownField { collection: String, field: String },
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("limit must be positive, got {0}")]
    InvalidLimit(i64),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("collection store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CollectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCollection(_) => ErrorKind::NotFound,
            Self::UnknownField { .. } | Self::InvalidValue { .. } | Self::InvalidLimit(_) => {
                ErrorKind::InvalidInput
            }
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Database(sqlx::Error::RowNotFound) => ErrorKind::NotFound,
            // SQLITE_AUTH
            Self::Database(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23") => {
                ErrorKind::Unauthorized
            }
            Self::Unavailable(_) | Self::Database(_) | Self::Decode(_) => {
                ErrorKind::RemoteUnavailable
            }
        }
    }
}

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FilterValue {
    /// Whether a stored value satisfies `field = self`. A missing field
    /// only matches `Null`.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Self::Null, None | Some(Value::Null)) => true,
            (_, None | Some(Value::Null)) => false,
            (Self::Bool(b), Some(Value::Bool(v))) => b == v,
            (Self::Integer(i), Some(Value::Number(n))) => match n.as_i64() {
                Some(v) => v == *i,
                None => n.as_f64() == Some(*i as f64),
            },
            (Self::Real(r), Some(Value::Number(n))) => n.as_f64() == Some(*r),
            (Self::Text(t), Some(Value::String(s))) => t == s,
            _ => false,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One read against a collection. Built fresh for every fetch and never
/// mutated afterwards; the builder methods consume and return the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CollectionQuery {
    collection: String,
    filters: BTreeMap<String, FilterValue>,
    order_by: Option<String>,
    ascending: bool,
    limit: Option<i64>,
}

impl CollectionQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: BTreeMap::new(),
            order_by: None,
            ascending: true,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn filters_from(mut self, filters: &BTreeMap<String, FilterValue>) -> Self {
        self.filters
            .extend(filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(field.into());
        self.ascending = ascending;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn ordering(&self) -> Option<(&str, bool)> {
        self.order_by.as_deref().map(|field| (field, self.ascending))
    }

    pub fn row_limit(&self) -> Option<i64> {
        self.limit
    }

    /// Checks that do not depend on the collection's columns.
    pub fn check_limit(&self) -> Result<(), CollectionError> {
        match self.limit {
            Some(limit) if limit <= 0 => Err(CollectionError::InvalidLimit(limit)),
            _ => Ok(()),
        }
    }
}

/// Result of a fetch as owned by the view that issued it.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct QueryResult<T> {
    pub rows: Vec<T>,
    pub is_loading: bool,
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl<T> QueryResult<T> {
    pub fn loading() -> Self {
        Self {
            rows: Vec::new(),
            is_loading: true,
            error: None,
            error_message: None,
        }
    }

    pub fn ready(rows: Vec<T>) -> Self {
        Self {
            rows,
            is_loading: false,
            error: None,
            error_message: None,
        }
    }

    pub fn failed(error: &CollectionError) -> Self {
        Self {
            rows: Vec::new(),
            is_loading: false,
            error: Some(error.kind()),
            error_message: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.is_loading && self.error.is_none()
    }
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl QueryResult<Row> {
    /// Decode every row into a typed model. Errors and loading state carry over.
    pub fn decode<T: DeserializeOwned>(self) -> Result<QueryResult<T>, CollectionError> {
        let rows = self
            .rows
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)))
            .collect::<Result<Vec<T>, _>>()?;

        Ok(QueryResult {
            rows,
            is_loading: self.is_loading,
            error: self.error,
            error_message: self.error_message,
        })
    }
}

/// Read interface over named collections.
///
/// Implementors provide [`try_fetch`](Self::try_fetch); callers use
/// [`fetch`](Self::fetch), which never fails and instead tags the result.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    async fn try_fetch(&self, query: &CollectionQuery) -> Result<Vec<Row>, CollectionError>;

    async fn fetch(&self, query: &CollectionQuery) -> QueryResult<Row> {
        match self.try_fetch(query).await {
            Ok(rows) => {
                debug!(
                    collection = %query.collection(),
                    rows = rows.len(),
                    "Collection fetch complete"
                );
                QueryResult::ready(rows)
            }
            Err(e) => {
                error!(
                    collection = %query.collection(),
                    kind = %e.kind(),
                    error = %e,
                    "Collection fetch failed"
                );
                QueryResult::failed(&e)
            }
        }
    }
}
