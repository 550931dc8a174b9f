use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    collection::CollectionQuery,
    schema::{CollectionSchema, Column, ColumnKind},
};

pub const SCHEMA: CollectionSchema = CollectionSchema {
    name: "leads",
    columns: &[
        Column::new("id", ColumnKind::Text),
        Column::new("name", ColumnKind::Text),
        Column::new("company", ColumnKind::Text),
        Column::new("email", ColumnKind::Text),
        Column::new("source", ColumnKind::Text),
        Column::new("stage", ColumnKind::Text),
        Column::new("estimated_value", ColumnKind::Real),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
    ],
};

/// Position of a lead in the sales pipeline
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, EnumIter, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeadStage {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Won,
    Lost,
}

impl LeadStage {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub stage: LeadStage,
    pub estimated_value: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Leads by estimated value, largest first, optionally restricted to one stage.
    pub fn pipeline_query(stage: Option<LeadStage>) -> CollectionQuery {
        let query = CollectionQuery::new(SCHEMA.name).order_by("estimated_value", false);
        match stage {
            Some(stage) => query.filter("stage", stage.to_string()),
            None => query,
        }
    }
}

/// Count and total estimated value per stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct PipelineStageSummary {
    pub stage: LeadStage,
    pub count: usize,
    pub total_value: f64,
}

pub fn summarize_pipeline(leads: &[Lead]) -> Vec<PipelineStageSummary> {
    LeadStage::iter()
        .map(|stage| {
            let in_stage: Vec<&Lead> = leads.iter().filter(|l| l.stage == stage).collect();
            PipelineStageSummary {
                stage,
                count: in_stage.len(),
                total_value: in_stage.iter().filter_map(|l| l.estimated_value).sum(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(stage: LeadStage, value: Option<f64>) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            company: None,
            email: None,
            source: None,
            stage,
            estimated_value: value,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pipeline_query_filters_stage() {
        let query = Lead::pipeline_query(Some(LeadStage::Qualified));
        assert_eq!(query.ordering(), Some(("estimated_value", false)));
        assert_eq!(query.filters().len(), 1);
        assert!(Lead::pipeline_query(None).filters().is_empty());
    }

    #[test]
    fn test_summarize_pipeline_totals() {
        let leads = vec![
            lead(LeadStage::New, Some(100.0)),
            lead(LeadStage::New, None),
            lead(LeadStage::Won, Some(2500.0)),
        ];
        let summary = summarize_pipeline(&leads);
        assert_eq!(summary.len(), 6);
        assert_eq!(summary[0].stage, LeadStage::New);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].total_value, 100.0);
        assert_eq!(summary[4].stage, LeadStage::Won);
        assert_eq!(summary[4].total_value, 2500.0);
        assert!(!LeadStage::Won.is_open());
    }
}
