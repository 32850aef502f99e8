use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use wealthdesk_core::groups::{Client, ClientUpdate, Group, GroupUpdate, NewClient, NewGroup};

use super::{CountResponse, Csv};
use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupFilter {
    pub group_id: Option<String>,
}

async fn list_groups(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Group>>> {
    Ok(Json(state.group_service.get_groups()?))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(new_group): Json<NewGroup>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let group = state.group_service.create_group(new_group).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Group>> {
    Ok(Json(state.group_service.get_group(&id)?))
}

async fn update_group(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut update): Json<GroupUpdate>,
) -> ApiResult<Json<Group>> {
    update.id = Some(id);
    Ok(Json(state.group_service.update_group(update).await?))
}

async fn delete_group(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.group_service.delete_group(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_fee_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.group_service.clear_fee_schedule(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_clients(
    Query(filter): Query<GroupFilter>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(
        state.group_service.get_clients(filter.group_id.as_deref())?,
    ))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(new_client): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = state.group_service.create_client(new_client).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.group_service.get_client(&id)?))
}

async fn update_client(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut update): Json<ClientUpdate>,
) -> ApiResult<Json<Client>> {
    update.id = Some(id);
    Ok(Json(state.group_service.update_client(update).await?))
}

async fn delete_client(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.group_service.delete_client(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn import_clients(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<CountResponse>> {
    let count = state.group_service.import_clients_csv(&body).await?;
    Ok(Json(CountResponse { count }))
}

async fn export_clients(State(state): State<Arc<AppState>>) -> ApiResult<Csv> {
    Ok(Csv(state.group_service.export_clients_csv()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/{id}/fee-schedule", delete(clear_fee_schedule))
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/import", post(import_clients))
        .route("/clients/export", get(export_clients))
        .route(
            "/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}
