//! Generic sorted/filtered reads of any registered collection.

use std::collections::BTreeMap;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    collection::{CollectionError, FilterValue, Row},
    schema,
};
use serde::Serialize;
use services::services::sortable_view::{SortState, SortableRemoteView};
use tracing::debug;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::{ApiError, rows_or_error},
};

const SORT_PARAM: &str = "sort";
const DIRECTION_PARAM: &str = "direction";
const LIMIT_PARAM: &str = "limit";

#[derive(Debug, Clone, Serialize, TS)]
pub struct CollectionPage {
    pub collection: String,
    pub sort: SortState,
    #[ts(type = "Array<Record<string, unknown>>")]
    pub rows: Vec<Row>,
}

/// GET /api/collections/{collection}?sort=&direction=&limit=&<column>=<value>...
///
/// Every other query parameter is an equality filter on a column.
pub async fn list_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(mut params): Query<BTreeMap<String, String>>,
) -> Result<ResponseJson<ApiResponse<CollectionPage>>, ApiError> {
    let schema = schema::require(&collection)?;

    let sort = SortState::from_params(
        params.remove(SORT_PARAM).as_deref(),
        params.remove(DIRECTION_PARAM).as_deref(),
    )?;
    let limit = state
        .page_limits()
        .resolve(params.remove(LIMIT_PARAM).as_deref())?;
    let filters = params
        .iter()
        .map(|(field, raw)| Ok((field.clone(), schema.coerce(field, raw)?)))
        .collect::<Result<BTreeMap<String, FilterValue>, CollectionError>>()?;

    debug!(
        collection = %schema.name,
        sort = ?sort,
        filters = filters.len(),
        limit,
        "Listing collection"
    );

    let mut view = SortableRemoteView::new(state.collections(), schema.name)
        .with_filters(filters)
        .with_sort(sort)
        .with_limit(limit);
    view.refresh().await;

    let sort = view.sort_state().clone();
    let rows = rows_or_error(view.into_result())?;

    Ok(ResponseJson(ApiResponse::success(CollectionPage {
        collection: schema.name.to_string(),
        sort,
        rows,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/collections/{collection}", get(list_collection))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::collection::{ErrorKind, memory::InMemoryCollectionClient};
    use serde_json::{Value, json};
    use services::services::assistant::AssistantGateway;

    use crate::routes::test_support::{app, get};

    fn client() -> Arc<InMemoryCollectionClient> {
        Arc::new(InMemoryCollectionClient::new().with_rows(
            "transactions",
            vec![
                json!({ "id": "t1", "description": "Rent", "amount": 1800.0, "status": "cleared" }),
                json!({ "id": "t2", "description": "Coffee", "amount": 4.5, "status": "pending" }),
                json!({ "id": "t3", "description": "Invoice 42", "amount": 3200.0, "status": "pending" }),
            ],
        ))
    }

    fn ids(body: &Value) -> Vec<&str> {
        body["data"]["rows"]
            .as_array()
            .map(|rows| rows.iter().filter_map(|r| r["id"].as_str()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_sorted_filtered_page() {
        let app = app(client(), AssistantGateway::unconfigured());
        let (status, body) = get(
            app,
            "/api/collections/transactions?sort=amount&direction=desc&status=pending",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["t3", "t2"]);
        assert_eq!(body["data"]["sort"], json!({ "key": "amount", "direction": "desc" }));
    }

    #[tokio::test]
    async fn test_unsorted_page_with_limit() {
        let app = app(client(), AssistantGateway::unconfigured());
        let (status, body) = get(app, "/api/collections/transactions?limit=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["t1", "t2"]);
        assert_eq!(body["data"]["sort"], json!({ "key": null, "direction": null }));
    }

    #[tokio::test]
    async fn test_unknown_collection_is_404() {
        let app = app(client(), AssistantGateway::unconfigured());
        let (status, body) = get(app, "/api/collections/payroll").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_filter_column_is_400_without_fetch() {
        let client = client();
        let app = app(client.clone(), AssistantGateway::unconfigured());
        let (status, _) = get(app, "/api/collections/transactions?password=x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_sort_key_is_400() {
        let client = client();
        let app = app(client.clone(), AssistantGateway::unconfigured());
        let (status, body) = get(app, "/api/collections/transactions?sort=bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_direction_without_sort_is_400() {
        let app = app(client(), AssistantGateway::unconfigured());
        let (status, _) = get(app, "/api/collections/transactions?direction=asc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_status() {
        let client = client();
        client.fail_with(Some(ErrorKind::RemoteUnavailable));
        let first = app(client.clone(), AssistantGateway::unconfigured());
        let (status, _) = get(first, "/api/collections/transactions").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        client.fail_with(Some(ErrorKind::Unauthorized));
        let second = app(client, AssistantGateway::unconfigured());
        let (status, _) = get(second, "/api/collections/transactions").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
