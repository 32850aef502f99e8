use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use wealthdesk_core::billing::{
    AccountSnapshot, Discrepancy, ImportSummary, NewAccountSnapshot, NewQuarter, Quarter,
    QuarterLedger, QuarterUpdate,
};

use super::Csv;
use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
struct DeletedResponse {
    deleted: usize,
}

async fn list_quarters(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Quarter>>> {
    Ok(Json(state.billing_service.get_quarters()?))
}

async fn create_quarter(
    State(state): State<Arc<AppState>>,
    Json(new_quarter): Json<NewQuarter>,
) -> ApiResult<(StatusCode, Json<Quarter>)> {
    let quarter = state.billing_service.create_quarter(new_quarter).await?;
    Ok((StatusCode::CREATED, Json(quarter)))
}

async fn get_quarter(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Quarter>> {
    Ok(Json(state.billing_service.get_quarter(&id)?))
}

async fn update_quarter(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut update): Json<QuarterUpdate>,
) -> ApiResult<Json<Quarter>> {
    update.id = Some(id);
    Ok(Json(state.billing_service.update_quarter(update).await?))
}

async fn delete_quarter(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.billing_service.delete_quarter(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_ledger(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<QuarterLedger>> {
    Ok(Json(state.billing_service.get_ledger(&id)?))
}

async fn add_account_snapshot(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_snapshot): Json<NewAccountSnapshot>,
) -> ApiResult<(StatusCode, Json<AccountSnapshot>)> {
    let snapshot = state
        .billing_service
        .add_account_snapshot(&id, new_snapshot)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn delete_all_account_snapshots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state.billing_service.delete_all_account_snapshots(&id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn import_account_values(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<ImportSummary>> {
    Ok(Json(
        state.billing_service.import_account_values(&id, &body).await?,
    ))
}

async fn generate_group_snapshots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<QuarterLedger>> {
    Ok(Json(
        state.billing_service.generate_group_snapshots(&id).await?,
    ))
}

async fn calculate_fees(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<QuarterLedger>> {
    Ok(Json(state.billing_service.calculate_fees(&id).await?))
}

async fn update_quarter_data(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Quarter>> {
    Ok(Json(state.billing_service.update_quarter_data(&id).await?))
}

async fn reconcile_quarter(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Discrepancy>>> {
    Ok(Json(state.billing_service.reconcile_quarter(&id)?))
}

async fn export_groups(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Csv> {
    Ok(Csv(state.billing_service.export_quarter_csv(&id)?.groups_csv))
}

async fn export_accounts(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Csv> {
    Ok(Csv(state.billing_service.export_quarter_csv(&id)?.accounts_csv))
}

async fn delete_account_snapshot(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.billing_service.delete_account_snapshot(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_group_snapshot(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.billing_service.delete_group_snapshot(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quarters", get(list_quarters).post(create_quarter))
        .route(
            "/quarters/{id}",
            get(get_quarter).put(update_quarter).delete(delete_quarter),
        )
        .route(
            "/quarters/{id}/snapshots",
            get(get_ledger)
                .post(add_account_snapshot)
                .delete(delete_all_account_snapshots),
        )
        .route("/quarters/{id}/import", post(import_account_values))
        .route(
            "/quarters/{id}/group-snapshots/generate",
            post(generate_group_snapshots),
        )
        .route("/quarters/{id}/fees/calculate", post(calculate_fees))
        .route("/quarters/{id}/update", post(update_quarter_data))
        .route("/quarters/{id}/reconcile", get(reconcile_quarter))
        .route("/quarters/{id}/export/groups", get(export_groups))
        .route("/quarters/{id}/export/accounts", get(export_accounts))
        .route("/account-snapshots/{id}", delete(delete_account_snapshot))
        .route("/group-snapshots/{id}", delete(delete_group_snapshot))
}
