use super::{correlation, parse_param, ApiError};
use crate::clients::BuildReceipt;
use crate::factory::{FactoryError, ProductionScheduler};
use crate::model::{Color, Paint, Robot, RobotType, SerialNumber};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type Factory = State<Arc<ProductionScheduler>>;

pub fn router(scheduler: Arc<ProductionScheduler>) -> Router {
    Router::new()
        .route("/factory/buildrobot", post(build_robot))
        .route("/factory/pickup", get(pick_up))
        .route("/factory/completed", get(completed))
        .route("/factory/inproduction", get(in_production))
        .route("/paints/", get(paints))
        .route("/robottypes/", get(robot_types))
        .route("/robottypes/:id", get(robot_type))
        .layer(TraceLayer::new_for_http())
        .with_state(scheduler)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildParams {
    robot_type_id: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupParams {
    serial_number: Option<String>,
}

async fn build_robot(
    State(scheduler): Factory,
    headers: HeaderMap,
    params: Result<Query<BuildParams>, QueryRejection>,
) -> Result<(StatusCode, Json<BuildReceipt>), ApiError> {
    let Query(params) = params?;
    let robot_type_id = params
        .robot_type_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing robotTypeId"))?;
    let color: Color = parse_param("color", params.color.as_deref())?;

    let ctx = correlation(&headers);
    let serial_number = scheduler
        .start_building_robot(robot_type_id.trim(), color, &ctx)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(BuildReceipt { serial_number })))
}

async fn pick_up(
    State(scheduler): Factory,
    params: Result<Query<PickupParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let serial_number: SerialNumber =
        parse_param("serialNumber", params.serial_number.as_deref())?;

    match scheduler.pick_up(serial_number).await {
        Ok(robot) => Ok(Json(robot).into_response()),
        Err(FactoryError::NotReady(_)) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn completed(State(scheduler): Factory) -> Result<Json<Vec<Robot>>, ApiError> {
    Ok(Json(scheduler.completed_robots().await?))
}

async fn in_production(State(scheduler): Factory) -> Result<Json<Vec<SerialNumber>>, ApiError> {
    Ok(Json(scheduler.in_production().await?))
}

async fn paints() -> Json<Vec<Paint>> {
    Json(Paint::all())
}

async fn robot_types(State(scheduler): Factory) -> Json<Vec<RobotType>> {
    Json(scheduler.robot_types())
}

async fn robot_type(
    State(scheduler): Factory,
    Path(id): Path<String>,
) -> Result<Json<RobotType>, ApiError> {
    Ok(Json(scheduler.robot_type(&id)?))
}
