use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::transaction::TransactionStatus;
use crate::{
    collection::CollectionQuery,
    schema::{CollectionSchema, Column, ColumnKind},
};

pub const SCHEMA: CollectionSchema = CollectionSchema {
    name: "transaction_status_history",
    columns: &[
        Column::new("id", ColumnKind::Text),
        Column::new("transaction_id", ColumnKind::Text),
        Column::new("previous_status", ColumnKind::Text),
        Column::new("new_status", ColumnKind::Text),
        Column::new("changed_by", ColumnKind::Text),
        Column::new("changed_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TransactionStatusChange {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub previous_status: Option<TransactionStatus>,
    pub new_status: TransactionStatus,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl TransactionStatusChange {
    pub fn history_query(transaction_id: Uuid) -> CollectionQuery {
        CollectionQuery::new(SCHEMA.name)
            .filter("transaction_id", transaction_id.to_string())
            .order_by("changed_at", false)
    }
}
