//! Audit trails: bank balance changes and transaction status history.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{balance_audit::BalanceAuditEntry, transaction_status::TransactionStatusChange};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, rows_or_error},
};

#[derive(Debug, Default, Deserialize)]
pub struct AuditParams {
    pub limit: Option<String>,
}

/// GET /api/bank-accounts/{account_id}/balance-audit
pub async fn get_balance_audit(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(params): Query<AuditParams>,
) -> Result<ResponseJson<ApiResponse<Vec<BalanceAuditEntry>>>, ApiError> {
    let limit = state.page_limits().resolve(params.limit.as_deref())?;
    let query = BalanceAuditEntry::history_query(account_id, limit);

    let entries = rows_or_error(state.collections().fetch(&query).await.decode()?)?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// GET /api/transactions/{transaction_id}/status-history
pub async fn get_status_history(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<TransactionStatusChange>>>, ApiError> {
    let query = TransactionStatusChange::history_query(transaction_id);

    let changes = rows_or_error(state.collections().fetch(&query).await.decode()?)?;
    Ok(ResponseJson(ApiResponse::success(changes)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/bank-accounts/{account_id}/balance-audit",
            get(get_balance_audit),
        )
        .route(
            "/transactions/{transaction_id}/status-history",
            get(get_status_history),
        )
}
