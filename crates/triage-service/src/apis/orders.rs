//! Orders API implementation.
//!
//! This module implements the `/orders` endpoint family: submission by
//! customers, the role-scoped list and fetch views, the admin PATCH carrying
//! status, details, and reassignment actions, and deletion. It enforces the
//! role policy and translates core errors into the HTTP error envelope.

use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use triage_core::{TriageError, TriageService};
use triage_types::{
	Actor, ActorRole, ApiError, CreateOrderRequest, CreateOrderResponse, OkResponse, OrderRequest,
	ReassignmentTarget, UpdateOrderRequest,
};

/// Query parameters for DELETE /orders.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteOrderQuery {
	/// Identifier of the order to delete.
	#[serde(default)]
	pub id: Option<String>,
}

/// Translates a core error into the HTTP error envelope.
fn to_api_error(err: TriageError) -> ApiError {
	match err {
		TriageError::Validation { field, message } => ApiError::BadRequest {
			error_type: "validation_error".to_string(),
			message,
			details: Some(serde_json::json!({ "field": field })),
		},
		TriageError::NotFound(_) => ApiError::NotFound {
			message: "Order not found".to_string(),
		},
		TriageError::Forbidden(message) => ApiError::Forbidden { message },
		TriageError::Conflict(message) => ApiError::Conflict { message },
		TriageError::Storage(message) => ApiError::InternalServerError {
			error_type: "storage_error".to_string(),
			message,
		},
	}
}

fn require_admin(actor: &Actor) -> Result<(), ApiError> {
	if actor.is_admin() {
		Ok(())
	} else {
		Err(ApiError::Forbidden {
			message: "admin role required".to_string(),
		})
	}
}

fn no_action_selected() -> ApiError {
	ApiError::BadRequest {
		error_type: "validation_error".to_string(),
		message: "request selects no update action".to_string(),
		details: None,
	}
}

fn invalid_field(field: &str, message: &str) -> ApiError {
	ApiError::BadRequest {
		error_type: "validation_error".to_string(),
		message: message.to_string(),
		details: Some(serde_json::json!({ "field": field })),
	}
}

/// Checks the input of every selected action before any action applies.
fn validate_actions(body: &UpdateOrderRequest) -> Result<(), ApiError> {
	if body.reassignment_request
		&& body
			.assigned_admin_id
			.as_deref()
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.is_none()
	{
		return Err(invalid_field("assignedAdminId", "a target admin is required"));
	}

	if let Some(details) = body.details.as_deref() {
		if details.trim().is_empty() {
			return Err(invalid_field(
				"details",
				"replacement details must not be empty",
			));
		}
	}

	Ok(())
}

/// Creates an order request from a customer submission.
pub async fn create_order(
	actor: &Actor,
	triage: &TriageService,
	request: CreateOrderRequest,
) -> Result<CreateOrderResponse, ApiError> {
	if actor.role != ActorRole::Customer {
		return Err(ApiError::Forbidden {
			message: "only customers may submit orders".to_string(),
		});
	}

	let order = triage
		.create_order(actor, request)
		.await
		.map_err(to_api_error)?;
	Ok(CreateOrderResponse { ok: true, order })
}

/// Lists orders scoped to the caller: triage visibility for admins, own
/// orders for customers.
pub async fn list_orders(
	actor: &Actor,
	triage: &TriageService,
) -> Result<Vec<OrderRequest>, ApiError> {
	let orders = match actor.role {
		ActorRole::Admin => triage.list_orders_for_admin(&actor.id).await,
		ActorRole::Customer => triage.list_orders_for_customer(&actor.id).await,
	};
	orders.map_err(to_api_error)
}

/// Fetches one order: the full document for admins, the tracking summary
/// for the owning customer.
pub async fn get_order_by_id(
	actor: &Actor,
	triage: &TriageService,
	order_id: &str,
) -> Result<Response, ApiError> {
	match actor.role {
		ActorRole::Admin => {
			let order = triage.get_order(order_id).await.map_err(to_api_error)?;
			// Out-of-scope orders read as missing, not forbidden.
			if !order.visible_to_admin(&actor.id) {
				return Err(ApiError::NotFound {
					message: "Order not found".to_string(),
				});
			}
			Ok(Json(order).into_response())
		},
		ActorRole::Customer => {
			let summary = triage
				.track_order(order_id, &actor.id)
				.await
				.map_err(to_api_error)?;
			Ok(Json(summary).into_response())
		},
	}
}

/// Applies the actions selected in a PATCH body and returns the final
/// document.
///
/// Actions run in a fixed order: reassignment request, then decision, then
/// status, then details. Each is the same core operation the dashboard
/// could invoke on its own. Ill-formed input rejects the whole body before
/// the first action applies; a state-dependent rejection (forbidden,
/// conflict) partway through leaves the earlier actions applied.
pub async fn update_order(
	actor: &Actor,
	triage: &TriageService,
	body: UpdateOrderRequest,
) -> Result<OrderRequest, ApiError> {
	require_admin(actor)?;
	if !body.has_action() {
		return Err(no_action_selected());
	}
	validate_actions(&body)?;

	let mut updated = None;

	if body.reassignment_request {
		let target = ReassignmentTarget {
			admin_id: body.assigned_admin_id.clone().unwrap_or_default(),
			admin_name: body.assigned_admin_name.clone(),
			admin_email: body.assigned_admin_email.clone(),
		};
		updated = Some(
			triage
				.request_reassignment(&body.id, actor, target)
				.await
				.map_err(to_api_error)?,
		);
	}

	if let Some(decision) = body.reassignment_decision {
		updated = Some(
			triage
				.decide_reassignment(&body.id, actor, decision)
				.await
				.map_err(to_api_error)?,
		);
	}

	if let Some(status) = body.status {
		updated = Some(
			triage
				.update_status(&body.id, actor, status)
				.await
				.map_err(to_api_error)?,
		);
	}

	if let Some(details) = body.details.as_deref() {
		updated = Some(
			triage
				.update_details(&body.id, details)
				.await
				.map_err(to_api_error)?,
		);
	}

	updated.ok_or_else(no_action_selected)
}

/// Deletes an order by the id given in the query string.
pub async fn delete_order(
	actor: &Actor,
	triage: &TriageService,
	query: DeleteOrderQuery,
) -> Result<OkResponse, ApiError> {
	require_admin(actor)?;

	let id = query
		.id
		.as_deref()
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.ok_or_else(|| invalid_field("id", "order id is required"))?;

	triage.delete_order(id).await.map_err(to_api_error)?;
	Ok(OkResponse::new())
}
