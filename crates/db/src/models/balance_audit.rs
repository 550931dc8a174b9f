use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    collection::CollectionQuery,
    schema::{CollectionSchema, Column, ColumnKind},
};

pub const SCHEMA: CollectionSchema = CollectionSchema {
    name: "bank_balance_audit",
    columns: &[
        Column::new("id", ColumnKind::Text),
        Column::new("bank_account_id", ColumnKind::Text),
        Column::new("previous_balance", ColumnKind::Real),
        Column::new("new_balance", ColumnKind::Real),
        Column::new("change_reason", ColumnKind::Text),
        Column::new("changed_by", ColumnKind::Text),
        Column::new("changed_at", ColumnKind::Timestamp),
    ],
};

/// One balance change on a bank account, written by a database trigger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BalanceAuditEntry {
    pub id: Uuid,
    pub bank_account_id: Uuid,
    pub previous_balance: Option<f64>,
    pub new_balance: f64,
    pub change_reason: Option<String>,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl BalanceAuditEntry {
    pub fn delta(&self) -> f64 {
        self.new_balance - self.previous_balance.unwrap_or(0.0)
    }

    /// Newest first.
    pub fn history_query(bank_account_id: Uuid, limit: i64) -> CollectionQuery {
        CollectionQuery::new(SCHEMA.name)
            .filter("bank_account_id", bank_account_id.to_string())
            .order_by("changed_at", false)
            .limit(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::FilterValue;

    #[test]
    fn test_history_query_is_newest_first() {
        let id = Uuid::new_v4();
        let query = BalanceAuditEntry::history_query(id, 25);
        assert_eq!(query.collection(), "bank_balance_audit");
        assert_eq!(query.ordering(), Some(("changed_at", false)));
        assert_eq!(query.row_limit(), Some(25));
        assert_eq!(
            query.filters().get("bank_account_id"),
            Some(&FilterValue::Text(id.to_string()))
        );
    }
}
