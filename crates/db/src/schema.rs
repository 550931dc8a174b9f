//! Registry of the collections this application reads, with the column
//! types needed to validate queries and coerce raw filter strings.

use crate::{
    collection::{CollectionError, CollectionQuery, FilterValue},
    models::{bank_account, balance_audit, lead, transaction, transaction_status},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    /// RFC 3339 timestamps and ISO dates, stored as text.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl CollectionSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn require(&self, field: &str) -> Result<&Column, CollectionError> {
        self.column(field)
            .ok_or_else(|| CollectionError::UnknownField {
                collection: self.name.to_string(),
                field: field.to_string(),
            })
    }

    /// Turn a raw string (typically a URL query parameter) into a typed filter value.
    pub fn coerce(&self, field: &str, raw: &str) -> Result<FilterValue, CollectionError> {
        let column = self.require(field)?;
        let invalid = |reason: &str| CollectionError::InvalidValue {
            field: field.to_string(),
            reason: format!("{reason}, got '{raw}'"),
        };

        match column.kind {
            ColumnKind::Text | ColumnKind::Timestamp => Ok(FilterValue::Text(raw.to_string())),
            ColumnKind::Integer => raw
                .parse::<i64>()
                .map(FilterValue::Integer)
                .map_err(|_| invalid("expected an integer")),
            ColumnKind::Real => raw
                .parse::<f64>()
                .map(FilterValue::Real)
                .map_err(|_| invalid("expected a number")),
            ColumnKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(FilterValue::Bool(true)),
                "false" | "0" | "no" => Ok(FilterValue::Bool(false)),
                _ => Err(invalid("expected a boolean")),
            },
        }
    }

    /// Every filter and the ordering field must name a known column.
    pub fn validate(&self, query: &CollectionQuery) -> Result<(), CollectionError> {
        query.check_limit()?;
        for field in query.filters().keys() {
            self.require(field)?;
        }
        if let Some((field, _)) = query.ordering() {
            self.require(field)?;
        }
        Ok(())
    }
}

pub const COLLECTIONS: &[CollectionSchema] = &[
    bank_account::SCHEMA,
    transaction::SCHEMA,
    balance_audit::SCHEMA,
    transaction_status::SCHEMA,
    lead::SCHEMA,
];

pub fn lookup(name: &str) -> Option<&'static CollectionSchema> {
    COLLECTIONS.iter().find(|s| s.name == name)
}

/// Like [`lookup`], failing with the error a fetch would report.
pub fn require(name: &str) -> Result<&'static CollectionSchema, CollectionError> {
    lookup(name).ok_or_else(|| CollectionError::UnknownCollection(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ErrorKind;

    #[test]
    fn test_registry_contains_every_collection() {
        for name in [
            "bank_accounts",
            "transactions",
            "bank_balance_audit",
            "transaction_status_history",
            "leads",
        ] {
            assert!(lookup(name).is_some(), "missing {name}");
        }
        assert_eq!(require("payroll").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_coerce_uses_column_kind() {
        let accounts = require("bank_accounts").unwrap();
        assert_eq!(
            accounts.coerce("is_active", "TRUE").unwrap(),
            FilterValue::Bool(true)
        );
        assert_eq!(
            accounts.coerce("current_balance", "12.5").unwrap(),
            FilterValue::Real(12.5)
        );
        assert_eq!(
            accounts.coerce("currency", "USD").unwrap(),
            FilterValue::Text("USD".into())
        );

        let err = accounts.coerce("current_balance", "lots").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = accounts.coerce("password", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_validate_rejects_unknown_order_field() {
        let transactions = require("transactions").unwrap();
        let ok = CollectionQuery::new("transactions")
            .filter("status", "pending")
            .order_by("amount", true);
        assert!(transactions.validate(&ok).is_ok());

        let bad = CollectionQuery::new("transactions").order_by("amount; DROP TABLE x", true);
        assert!(matches!(
            transactions.validate(&bad),
            Err(CollectionError::UnknownField { .. })
        ));
    }
}
