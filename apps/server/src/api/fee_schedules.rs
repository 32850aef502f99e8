use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wealthdesk_core::fee_schedules::{
    FeeRule, FeeRuleUpdate, FeeSchedule, FeeScheduleUpdate, NewFeeRule, NewFeeSchedule,
    RuleCharge,
};

use super::{CountResponse, Csv};
use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Rule fields as posted under a schedule; the schedule comes from the path.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeRuleBody {
    minimum: Decimal,
    maximum: Option<Decimal>,
    rate: Decimal,
    flat: Decimal,
}

#[derive(Deserialize)]
struct CalculateQuery {
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeeQuote {
    schedule_id: String,
    value: Decimal,
    fee: Decimal,
    breakdown: Vec<RuleCharge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    group_ids: Vec<String>,
}

async fn list_fee_schedules(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<FeeSchedule>>> {
    Ok(Json(state.fee_schedule_service.get_fee_schedules()?))
}

async fn create_fee_schedule(
    State(state): State<Arc<AppState>>,
    Json(new_schedule): Json<NewFeeSchedule>,
) -> ApiResult<(StatusCode, Json<FeeSchedule>)> {
    let schedule = state
        .fee_schedule_service
        .create_fee_schedule(new_schedule)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn get_fee_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeeSchedule>> {
    Ok(Json(state.fee_schedule_service.get_fee_schedule(&id)?))
}

async fn update_fee_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut update): Json<FeeScheduleUpdate>,
) -> ApiResult<Json<FeeSchedule>> {
    update.id = Some(id);
    Ok(Json(
        state.fee_schedule_service.update_fee_schedule(update).await?,
    ))
}

async fn delete_fee_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.fee_schedule_service.delete_fee_schedule(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_fee_rule(
    Path(schedule_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<FeeRuleBody>,
) -> ApiResult<(StatusCode, Json<FeeRule>)> {
    let rule = state
        .fee_schedule_service
        .add_fee_rule(NewFeeRule {
            id: None,
            schedule_id,
            minimum: body.minimum,
            maximum: body.maximum,
            rate: body.rate,
            flat: body.flat,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn update_fee_rule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<FeeRuleBody>,
) -> ApiResult<Json<FeeRule>> {
    let rule = state
        .fee_schedule_service
        .update_fee_rule(FeeRuleUpdate {
            id: Some(id),
            minimum: body.minimum,
            maximum: body.maximum,
            rate: body.rate,
            flat: body.flat,
        })
        .await?;
    Ok(Json(rule))
}

async fn delete_fee_rule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.fee_schedule_service.delete_fee_rule(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn calculate_fee(
    Path(id): Path<String>,
    Query(query): Query<CalculateQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeeQuote>> {
    let value = Decimal::from_str(query.value.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid value '{}': {}", query.value, e)))?;
    let fee = state.fee_schedule_service.calculate_fee(&id, value)?;
    let breakdown = state.fee_schedule_service.fee_breakdown(&id, value)?;
    Ok(Json(FeeQuote {
        schedule_id: id,
        value,
        fee,
        breakdown,
    }))
}

async fn assign_fee_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<CountResponse>> {
    let count = state
        .group_service
        .assign_fee_schedule(&id, request.group_ids)
        .await?;
    Ok(Json(CountResponse { count }))
}

async fn import_fee_schedules(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<CountResponse>> {
    let count = state
        .fee_schedule_service
        .import_fee_schedules_csv(&body)
        .await?;
    Ok(Json(CountResponse { count }))
}

async fn export_fee_schedules(State(state): State<Arc<AppState>>) -> ApiResult<Csv> {
    Ok(Csv(state.fee_schedule_service.export_fee_schedules_csv()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/fee-schedules",
            get(list_fee_schedules).post(create_fee_schedule),
        )
        .route("/fee-schedules/import", post(import_fee_schedules))
        .route("/fee-schedules/export", get(export_fee_schedules))
        .route(
            "/fee-schedules/{id}",
            get(get_fee_schedule)
                .put(update_fee_schedule)
                .delete(delete_fee_schedule),
        )
        .route("/fee-schedules/{id}/rules", post(add_fee_rule))
        .route("/fee-schedules/{id}/calculate", get(calculate_fee))
        .route("/fee-schedules/{id}/assign", post(assign_fee_schedule))
        .route("/fee-rules/{id}", put(update_fee_rule).delete(delete_fee_rule))
}
