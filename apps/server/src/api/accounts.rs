use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use wealthdesk_core::accounts::{Account, AccountUpdate, NewAccount};
use wealthdesk_core::billing::ImportSummary;

use super::groups::GroupFilter;
use super::Csv;
use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
struct PurgeResponse {
    deleted: usize,
}

async fn list_accounts(
    Query(filter): Query<GroupFilter>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(
        state.account_service.get_accounts(filter.group_id.as_deref())?,
    ))
}

async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(new_account): Json<NewAccount>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = state.account_service.create_account(new_account).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Account>> {
    Ok(Json(state.account_service.get_account(&id)?))
}

async fn update_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut update): Json<AccountUpdate>,
) -> ApiResult<Json<Account>> {
    update.id = Some(id);
    Ok(Json(state.account_service.update_account(update).await?))
}

async fn delete_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.account_service.delete_account(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Removes the account's snapshots from every quarter.
async fn purge_account_snapshots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PurgeResponse>> {
    let deleted = state.billing_service.purge_account_snapshots(&id).await?;
    Ok(Json(PurgeResponse { deleted }))
}

async fn import_accounts(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<ImportSummary>> {
    Ok(Json(state.account_service.import_accounts_csv(&body).await?))
}

async fn export_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Csv> {
    Ok(Csv(state.account_service.export_accounts_csv()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/import", post(import_accounts))
        .route("/accounts/export", get(export_accounts))
        .route(
            "/accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/accounts/{id}/snapshots", delete(purge_account_snapshots))
}
