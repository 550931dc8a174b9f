use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::schema::{CollectionSchema, Column, ColumnKind};

pub const SCHEMA: CollectionSchema = CollectionSchema {
    name: "bank_accounts",
    columns: &[
        Column::new("id", ColumnKind::Text),
        Column::new("name", ColumnKind::Text),
        Column::new("institution", ColumnKind::Text),
        Column::new("account_type", ColumnKind::Text),
        Column::new("currency", ColumnKind::Text),
        Column::new("current_balance", ColumnKind::Real),
        Column::new("is_active", ColumnKind::Boolean),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    Credit,
    Cash,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BankAccount {
    pub id: Uuid,
    pub name: String,
    pub institution: Option<String>,
    pub account_type: AccountType,
    pub currency: String,
    pub current_balance: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
