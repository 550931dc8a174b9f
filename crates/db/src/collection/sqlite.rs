//! Collection reads against the application's SQLite database.
//!
//! Each row is rendered by SQLite itself as a JSON object, so the client
//! never needs per-table decoding. Identifiers come only from the schema
//! registry and every value is a bound parameter.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{CollectionClient, CollectionError, CollectionQuery, FilterValue, Row};
use crate::schema::{self, CollectionSchema, ColumnKind};

#[derive(Debug, Clone)]
pub struct SqliteCollectionClient {
    pool: SqlitePool,
}

impl SqliteCollectionClient {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionClient for SqliteCollectionClient {
    async fn try_fetch(&self, query: &CollectionQuery) -> Result<Vec<Row>, CollectionError> {
        let schema = schema::require(query.collection())?;
        schema.validate(query)?;

        let mut builder = select_builder(schema, query);
        let encoded: Vec<String> = builder
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await?;

        encoded
            .iter()
            .map(|raw| serde_json::from_str::<Row>(raw).map_err(CollectionError::from))
            .collect()
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn select_builder(schema: &CollectionSchema, query: &CollectionQuery) -> QueryBuilder<'static, Sqlite> {
    let projection = schema
        .columns
        .iter()
        .map(|column| {
            let ident = quote(column.name);
            let value = match column.kind {
                ColumnKind::Boolean => format!(
                    "CASE WHEN {ident} IS NULL THEN NULL WHEN {ident} THEN json('true') ELSE json('false') END"
                ),
                _ => ident,
            };
            format!("'{}', {}", column.name, value)
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT json_object({projection}) FROM {}",
        quote(schema.name)
    ));

    for (i, (field, value)) in query.filters().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(quote(field));
        match value {
            FilterValue::Null => {
                builder.push(" IS NULL");
            }
            FilterValue::Bool(b) => {
                builder.push(" = ").push_bind(*b);
            }
            FilterValue::Integer(n) => {
                builder.push(" = ").push_bind(*n);
            }
            FilterValue::Real(r) => {
                builder.push(" = ").push_bind(*r);
            }
            FilterValue::Text(s) => {
                builder.push(" = ").push_bind(s.clone());
            }
        }
    }

    if let Some((field, ascending)) = query.ordering() {
        builder
            .push(" ORDER BY ")
            .push(quote(field))
            .push(if ascending { " ASC" } else { " DESC" });
    }

    if let Some(limit) = query.row_limit() {
        builder.push(" LIMIT ").push_bind(limit);
    }

    builder
}
