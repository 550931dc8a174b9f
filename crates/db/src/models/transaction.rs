use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::schema::{CollectionSchema, Column, ColumnKind};

pub const SCHEMA: CollectionSchema = CollectionSchema {
    name: "transactions",
    columns: &[
        Column::new("id", ColumnKind::Text),
        Column::new("bank_account_id", ColumnKind::Text),
        Column::new("description", ColumnKind::Text),
        Column::new("category", ColumnKind::Text),
        Column::new("amount", ColumnKind::Real),
        Column::new("kind", ColumnKind::Text),
        Column::new("status", ColumnKind::Text),
        Column::new("occurred_on", ColumnKind::Timestamp),
        Column::new("created_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
    Transfer,
}

/// Lifecycle of a transaction; every change is recorded in
/// `transaction_status_history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Cleared,
    Reconciled,
    Void,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Transaction {
    pub id: Uuid,
    pub bank_account_id: Option<Uuid>,
    pub description: String,
    pub category: Option<String>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}
