//! In-process collection store used as a test double and for tables that
//! have no backing storage yet.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};

use async_trait::async_trait;
use serde_json::Value;

use super::{CollectionClient, CollectionError, CollectionQuery, ErrorKind, Row};
use crate::schema;

#[derive(Debug, Default)]
pub struct InMemoryCollectionClient {
    collections: RwLock<HashMap<String, Vec<Row>>>,
    failure: RwLock<Option<ErrorKind>>,
    fetches: AtomicUsize,
}

impl InMemoryCollectionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows of `collection`. Non-object values are skipped.
    pub fn with_rows(self, collection: &str, rows: impl IntoIterator<Item = Value>) -> Self {
        self.insert_rows(collection, rows);
        self
    }

    pub fn insert_rows(&self, collection: &str, rows: impl IntoIterator<Item = Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        if let Ok(mut collections) = self.collections.write() {
            collections.insert(collection.to_string(), rows);
        }
    }

    /// Make every subsequent fetch fail with `kind`; `None` restores normal reads.
    pub fn fail_with(&self, kind: Option<ErrorKind>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = kind;
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }
}

fn injected(kind: ErrorKind, collection: &str) -> CollectionError {
    match kind {
        ErrorKind::InvalidInput => CollectionError::InvalidValue {
            field: collection.to_string(),
            reason: "injected failure".to_string(),
        },
        ErrorKind::Unauthorized => CollectionError::Unauthorized("injected failure".to_string()),
        ErrorKind::RemoteUnavailable => {
            CollectionError::Unavailable("injected failure".to_string())
        }
        ErrorKind::NotFound => CollectionError::UnknownCollection(collection.to_string()),
    }
}

/// Nulls sort first, then booleans, numbers and strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl CollectionClient for InMemoryCollectionClient {
    async fn try_fetch(&self, query: &CollectionQuery) -> Result<Vec<Row>, CollectionError> {
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);

        let failure = self
            .failure
            .read()
            .map_err(|_| CollectionError::Unavailable("store lock poisoned".to_string()))?;
        if let Some(kind) = *failure {
            return Err(injected(kind, query.collection()));
        }
        drop(failure);

        // Registered collections get the same field checks as the SQLite client.
        match schema::lookup(query.collection()) {
            Some(schema) => schema.validate(query)?,
            None => query.check_limit()?,
        }

        let collections = self
            .collections
            .read()
            .map_err(|_| CollectionError::Unavailable("store lock poisoned".to_string()))?;
        let rows = collections
            .get(query.collection())
            .ok_or_else(|| CollectionError::UnknownCollection(query.collection().to_string()))?;

        let mut matched: Vec<Row> = rows
            .iter()
            .filter(|row| {
                query
                    .filters()
                    .iter()
                    .all(|(field, value)| value.matches(row.get(field)))
            })
            .cloned()
            .collect();

        if let Some((field, ascending)) = query.ordering() {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                if ascending { ord } else { ord.reverse() }
            });
        }

        if let Some(limit) = query.row_limit() {
            matched.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(matched)
    }
}
