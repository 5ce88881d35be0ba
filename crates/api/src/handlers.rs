//! Request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use dca_domain::entities::StrategyId;

use crate::error::ApiError;
use crate::models::{
    CreateStrategyRequest, CreateStrategyResponse, ExecuteRequest, ExecutionResponse,
    LedgerEntryResponse, ReconciliationResponse, StrategyResponse,
};
use crate::state::AppState;

pub async fn create_strategy(
    State(state): State<AppState>,
    Json(request): Json<CreateStrategyRequest>,
) -> Result<(StatusCode, Json<CreateStrategyResponse>), ApiError> {
    let config = request.into_config()?;
    let provisioned = state.provisioner.create(config, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(provisioned.into())))
}

pub async fn get_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StrategyResponse>, ApiError> {
    let strategy = state
        .store
        .get(StrategyId(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(strategy.into()))
}

pub async fn pause_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StrategyResponse>, ApiError> {
    let strategy = state.provisioner.pause(StrategyId(id)).await?;
    Ok(Json(strategy.into()))
}

pub async fn resume_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StrategyResponse>, ApiError> {
    let strategy = state.provisioner.resume(StrategyId(id)).await?;
    Ok(Json(strategy.into()))
}

pub async fn execute_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<ExecuteRequest>>,
) -> Result<Json<ExecutionResponse>, ApiError> {
    let amount = request
        .map(|Json(request)| request.parse_amount())
        .transpose()?
        .flatten();
    let report = state
        .pipeline
        .execute_manual(StrategyId(id), amount, Utc::now())
        .await?;
    Ok(Json(report.into()))
}

pub async fn list_ledger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntryResponse>>, ApiError> {
    // 404 for unknown strategies rather than an empty history.
    state
        .store
        .get(StrategyId(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    let entries = state.ledger.list_by_strategy(StrategyId(id)).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn reconcile_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReconciliationResponse>, ApiError> {
    let report = state.reconciler.reconcile(StrategyId(id)).await?;
    Ok(Json(report.into()))
}
