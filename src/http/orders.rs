use super::{correlation, parse_param, ApiError};
use crate::model::{Order, OrderId, OrderRequest, RealizedOrder};
use crate::order_actor::OrderOrchestrator;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type Orders = State<Arc<OrderOrchestrator>>;

pub fn router(orchestrator: Arc<OrderOrchestrator>) -> Router {
    Router::new()
        .route("/orders/new", post(new_order))
        .route("/orders/", get(active_orders))
        .route("/orders/pickup", get(pick_up))
        .route("/orders/completed", get(completed_orders))
        .route("/orders/:id", get(active_order))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupParams {
    order_id: Option<String>,
}

async fn new_order(
    State(orchestrator): Orders,
    headers: HeaderMap,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = body?;
    let customer_id = request
        .customer_id
        .ok_or_else(|| ApiError::bad_request("missing customerId"))?;

    let ctx = correlation(&headers);
    let order = orchestrator
        .place_order(customer_id, request.line_items, &ctx)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(order)))
}

async fn active_orders(State(orchestrator): Orders) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(orchestrator.active_orders().await?))
}

async fn active_order(
    State(orchestrator): Orders,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_param("order id", Some(&id))?;
    Ok(Json(orchestrator.active_order(id).await?))
}

async fn pick_up(
    State(orchestrator): Orders,
    params: Result<Query<PickupParams>, QueryRejection>,
) -> Result<Json<RealizedOrder>, ApiError> {
    let Query(params) = params?;
    let id: OrderId = parse_param("orderId", params.order_id.as_deref())?;
    Ok(Json(orchestrator.pick_up(id).await?))
}

async fn completed_orders(
    State(orchestrator): Orders,
) -> Result<Json<Vec<RealizedOrder>>, ApiError> {
    Ok(Json(orchestrator.completed_orders().await?))
}
