//! Sort state for tabular views bound to a remote collection.
//!
//! The state transitions and query derivation are pure functions. The view
//! wraps them with a sequence-numbered fetch cycle: every issued query gets a
//! new sequence number, and an arriving result is applied only if it belongs
//! to the most recently issued query.

use std::{collections::BTreeMap, sync::Arc};

use db::collection::{
    CollectionClient, CollectionError, CollectionQuery, FilterValue, QueryResult, Row,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active sort column and direction. Either both are set or neither is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, TS)]
pub struct SortState {
    key: Option<String>,
    direction: Option<SortDirection>,
}

impl SortState {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn sorted(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction: Some(direction),
        }
    }

    /// Build from `?sort=<key>&direction=<asc|desc>`. A key alone sorts
    /// ascending; a direction without a key is rejected.
    pub fn from_params(key: Option<&str>, direction: Option<&str>) -> Result<Self, CollectionError> {
        let key = key.map(str::trim).filter(|k| !k.is_empty());
        let direction = direction
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| {
                d.parse::<SortDirection>()
                    .map_err(|_| CollectionError::InvalidValue {
                        field: "direction".to_string(),
                        reason: format!("expected 'asc' or 'desc', got '{d}'"),
                    })
            })
            .transpose()?;

        match (key, direction) {
            (None, None) => Ok(Self::unsorted()),
            (Some(key), direction) => Ok(Self::sorted(key, direction.unwrap_or(SortDirection::Asc))),
            (None, Some(_)) => Err(CollectionError::InvalidValue {
                field: "direction".to_string(),
                reason: "a sort direction requires a sort key".to_string(),
            }),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.direction
    }

    pub fn is_sorted(&self) -> bool {
        self.key.is_some()
    }
}

/// What a column header should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub enum Indicator {
    Unsorted,
    SortedAscending,
    SortedDescending,
}

/// Next state after the user activates `column_key`.
///
/// A new column starts ascending; the active column flips between
/// ascending and descending and never returns to unsorted.
pub fn toggle_sort(state: &SortState, column_key: &str) -> SortState {
    match (state.key(), state.direction()) {
        (Some(key), Some(SortDirection::Asc)) if key == column_key => {
            SortState::sorted(column_key, SortDirection::Desc)
        }
        _ => SortState::sorted(column_key, SortDirection::Asc),
    }
}

pub fn current_indicator(state: &SortState, column_key: &str) -> Indicator {
    match (state.key(), state.direction()) {
        (Some(key), Some(SortDirection::Asc)) if key == column_key => Indicator::SortedAscending,
        (Some(key), Some(SortDirection::Desc)) if key == column_key => Indicator::SortedDescending,
        _ => Indicator::Unsorted,
    }
}

/// Derive the fetch for a view. No ordering clause when the state is unsorted.
pub fn build_query(
    collection: &str,
    base_filters: &BTreeMap<String, FilterValue>,
    state: &SortState,
    limit: Option<i64>,
) -> CollectionQuery {
    let mut query = CollectionQuery::new(collection).filters_from(base_filters);
    if let (Some(key), Some(direction)) = (state.key(), state.direction()) {
        query = query.order_by(key, direction == SortDirection::Asc);
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query
}

/// A query handed out by [`SortableRemoteView::issue`], tagged with its sequence number.
#[derive(Debug, Clone)]
pub struct IssuedQuery {
    sequence: u64,
    query: CollectionQuery,
}

impl IssuedQuery {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn query(&self) -> &CollectionQuery {
        &self.query
    }

    pub async fn run<C: CollectionClient + ?Sized>(self, client: &C) -> Arrival {
        let result = client.fetch(&self.query).await;
        Arrival {
            sequence: self.sequence,
            result,
        }
    }
}

/// A completed fetch waiting to be applied.
#[derive(Debug, Clone)]
pub struct Arrival {
    pub sequence: u64,
    pub result: QueryResult<Row>,
}

pub struct SortableRemoteView<C: ?Sized> {
    client: Arc<C>,
    collection: String,
    filters: BTreeMap<String, FilterValue>,
    limit: Option<i64>,
    state: SortState,
    latest_issued: u64,
    result: QueryResult<Row>,
}

impl<C: CollectionClient + ?Sized> SortableRemoteView<C> {
    pub fn new(client: Arc<C>, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
            filters: BTreeMap::new(),
            limit: None,
            state: SortState::unsorted(),
            latest_issued: 0,
            result: QueryResult::loading(),
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, state: SortState) -> Self {
        self.state = state;
        self
    }

    pub fn with_filters(mut self, filters: BTreeMap<String, FilterValue>) -> Self {
        self.filters = filters;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn sort_state(&self) -> &SortState {
        &self.state
    }

    pub fn toggle_sort(&mut self, column_key: &str) -> &SortState {
        self.state = toggle_sort(&self.state, column_key);
        &self.state
    }

    pub fn indicator(&self, column_key: &str) -> Indicator {
        current_indicator(&self.state, column_key)
    }

    pub fn set_filter(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) {
        self.filters.insert(field.into(), value.into());
    }

    pub fn clear_filter(&mut self, field: &str) {
        self.filters.remove(field);
    }

    pub fn current_query(&self) -> CollectionQuery {
        build_query(&self.collection, &self.filters, &self.state, self.limit)
    }

    /// Start a fetch for the current state. Rows from the previous result
    /// stay visible while loading.
    pub fn issue(&mut self) -> IssuedQuery {
        self.latest_issued += 1;
        self.result.is_loading = true;
        IssuedQuery {
            sequence: self.latest_issued,
            query: self.current_query(),
        }
    }

    /// Apply an arrival if it answers the latest issued query. Returns
    /// whether it was applied.
    pub fn accept(&mut self, arrival: Arrival) -> bool {
        if arrival.sequence != self.latest_issued {
            debug!(
                collection = %self.collection,
                sequence = arrival.sequence,
                latest = self.latest_issued,
                "Discarding stale collection result"
            );
            return false;
        }
        self.result = arrival.result;
        true
    }

    /// Issue, fetch and apply in one step.
    pub async fn refresh(&mut self) -> &QueryResult<Row> {
        let issued = self.issue();
        let arrival = issued.run(self.client.as_ref()).await;
        self.accept(arrival);
        &self.result
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest_issued
    }

    pub fn result(&self) -> &QueryResult<Row> {
        &self.result
    }

    pub fn into_result(self) -> QueryResult<Row> {
        self.result
    }
}
