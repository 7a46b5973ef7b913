//! HTTP server for the order triage API.
//!
//! This module provides a minimal HTTP server infrastructure
//! for the order triage API.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::{Json, Response},
	routing::get,
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use triage_config::Config;
use triage_core::TriageService;
use triage_types::{
	Actor, ApiError, CreateOrderRequest, CreateOrderResponse, OkResponse, OrderRequest,
	UpdateOrderRequest,
};

use crate::apis::orders::{self, DeleteOrderQuery};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the triage service for processing requests.
	pub triage: Arc<TriageService>,
	/// Complete configuration.
	pub config: Config,
}

/// Starts the HTTP server for the API.
///
/// This function creates and configures the HTTP server with routing,
/// middleware, and error handling for the orders endpoints.
pub async fn start_server(
	config: Config,
	triage: Arc<TriageService>,
) -> Result<(), Box<dyn std::error::Error>> {
	let api_config = config.api.clone();

	let app_state = AppState { triage, config };

	// Build the router with /api base path and the orders endpoint family
	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route(
					"/orders",
					get(handle_list_orders)
						.post(handle_create_order)
						.patch(handle_update_order)
						.delete(handle_delete_order),
				)
				.route("/orders/{id}", get(handle_get_order_by_id)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order triage API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/orders requests.
///
/// This endpoint accepts a customer order submission and returns the newly
/// created order document.
async fn handle_create_order(
	State(state): State<AppState>,
	actor: Actor,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
	match orders::create_order(&actor, &state.triage, request).await {
		Ok(response) => Ok((StatusCode::CREATED, Json(response))),
		Err(e) => {
			tracing::warn!("Order submission failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/orders requests.
///
/// This endpoint lists orders scoped to the caller: the triage view for
/// admins, the caller's own orders for customers.
async fn handle_list_orders(
	State(state): State<AppState>,
	actor: Actor,
) -> Result<Json<Vec<OrderRequest>>, ApiError> {
	match orders::list_orders(&actor, &state.triage).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order listing failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/orders/{id} requests.
///
/// This endpoint retrieves order details by ID. Admins receive the full
/// document, customers a tracking summary of their own orders.
async fn handle_get_order_by_id(
	State(state): State<AppState>,
	actor: Actor,
	Path(id): Path<String>,
) -> Result<Response, ApiError> {
	match orders::get_order_by_id(&actor, &state.triage, &id).await {
		Ok(response) => Ok(response),
		Err(e) => {
			tracing::warn!("Order retrieval failed: {}", e);
			Err(e)
		},
	}
}

/// Handles PATCH /api/orders requests.
///
/// This endpoint applies the admin actions selected in the body and returns
/// the updated order document.
async fn handle_update_order(
	State(state): State<AppState>,
	actor: Actor,
	Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<OrderRequest>, ApiError> {
	match orders::update_order(&actor, &state.triage, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order update failed: {}", e);
			Err(e)
		},
	}
}

/// Handles DELETE /api/orders requests.
///
/// This endpoint removes the order named by the `id` query parameter.
async fn handle_delete_order(
	State(state): State<AppState>,
	actor: Actor,
	Query(query): Query<DeleteOrderQuery>,
) -> Result<Json<OkResponse>, ApiError> {
	match orders::delete_order(&actor, &state.triage, query).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order deletion failed: {}", e);
			Err(e)
		},
	}
}
