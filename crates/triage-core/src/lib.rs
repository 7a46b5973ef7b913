//! Order triage state machine.
//!
//! Manages the lifecycle of customer-submitted order requests: creation,
//! free-form status movement, details edits, the admin-to-admin reassignment
//! handshake, deletion, and the scoped queries behind the admin and customer
//! views.
//!
//! Every operation takes the acting identity explicitly and runs as a single
//! read-modify-write against one document, written back through a guarded
//! update conditioned on the bytes the document was read from. A racing
//! writer surfaces as a conflict instead of being silently overwritten.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use triage_storage::{StorageError, StorageService};
use triage_types::{
	Actor, Collection, CreateOrderRequest, OrderRequest, OrderStatus, OrderTrackingResponse,
	Reassignment, ReassignmentDecision, ReassignmentStatus, ReassignmentTarget,
};
use uuid::Uuid;

/// Maximum number of orders returned by the customer "my orders" view.
const CUSTOMER_LIST_LIMIT: usize = 10;

/// Errors that can occur while operating on order requests.
///
/// These errors represent rejected input, missing documents, actors acting
/// outside their authority, operations that lost against an earlier or
/// concurrent write, and storage failures.
#[derive(Debug, Error)]
pub enum TriageError {
	#[error("Invalid {field}: {message}")]
	Validation { field: String, message: String },
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Forbidden: {0}")]
	Forbidden(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

fn validation(field: &str, message: &str) -> TriageError {
	TriageError::Validation {
		field: field.to_string(),
		message: message.to_string(),
	}
}

fn storage_error(order_id: &str, err: StorageError) -> TriageError {
	match err {
		StorageError::NotFound => TriageError::NotFound(order_id.to_string()),
		StorageError::Conflict => {
			TriageError::Conflict("order changed while the update was in flight".to_string())
		},
		other => TriageError::Storage(other.to_string()),
	}
}

/// Drives order request state and persistence
pub struct TriageService {
	storage: Arc<StorageService>,
}

impl TriageService {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Creates an order request from a customer submission.
	///
	/// Text fields must be non-empty after trimming and an admin must be
	/// selected. The budget arrives pre-sanitized by the wire type but is
	/// filtered again so direct callers get the same storage guarantee.
	pub async fn create_order(
		&self,
		actor: &Actor,
		request: CreateOrderRequest,
	) -> Result<OrderRequest, TriageError> {
		let name = request.name.trim();
		if name.is_empty() {
			return Err(validation("name", "contact name is required"));
		}
		let email = request.email.trim();
		if email.is_empty() {
			return Err(validation("email", "contact email is required"));
		}
		let details = request.details.trim();
		if details.is_empty() {
			return Err(validation("details", "order details are required"));
		}
		let admin_id = request.admin_id.trim();
		if admin_id.is_empty() {
			return Err(validation("adminId", "an admin must be selected"));
		}

		let now = Utc::now();
		let order = OrderRequest {
			id: Uuid::new_v4().to_string(),
			customer_id: actor.id.clone(),
			name: name.to_string(),
			email: email.to_string(),
			details: details.to_string(),
			budget: request.budget.filter(|b| b.is_finite()),
			assigned_admin_id: Some(admin_id.to_string()),
			assigned_admin_name: request.admin_name.filter(|s| !s.is_empty()),
			assigned_admin_email: request.admin_email.filter(|s| !s.is_empty()),
			status: OrderStatus::PendingReview,
			reassignment: None,
			created_at: now,
			updated_at: now,
		};

		self.storage
			.store(Collection::ConsumerOrders.as_str(), &order.id, &order)
			.await
			.map_err(|e| TriageError::Storage(e.to_string()))?;

		tracing::info!(
			component = "core",
			order_id = %order.id,
			customer_id = %order.customer_id,
			"Order request created"
		);

		Ok(order)
	}

	/// Gets an order request by id.
	pub async fn get_order(&self, order_id: &str) -> Result<OrderRequest, TriageError> {
		self.storage
			.retrieve(Collection::ConsumerOrders.as_str(), order_id)
			.await
			.map_err(|e| storage_error(order_id, e))
	}

	/// Updates an order with a fallible closure and persists it.
	///
	/// The closure runs against the same snapshot the write is conditioned
	/// on, so a guard checked inside it cannot be outrun by a concurrent
	/// writer. A document that changes between the read and the write
	/// surfaces as a conflict.
	async fn update_order_with<F>(
		&self,
		order_id: &str,
		updater: F,
	) -> Result<OrderRequest, TriageError>
	where
		F: FnOnce(&mut OrderRequest) -> Result<(), TriageError>,
	{
		let seen = self
			.storage
			.retrieve_snapshot::<OrderRequest>(Collection::ConsumerOrders.as_str(), order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;
		let mut order = seen.value.clone();

		// Apply the update
		updater(&mut order)?;

		// Automatically set updated_at timestamp
		order.updated_at = Utc::now();

		self.storage
			.update_guarded(Collection::ConsumerOrders.as_str(), order_id, &seen, &order)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		Ok(order)
	}

	/// Sets the status of an order on behalf of an admin.
	///
	/// Any status value is accepted; the triage vocabulary carries no
	/// transition table. An admin whose accepted reassignment moved the
	/// order away is rejected. Touching an unassigned order claims it for
	/// the actor.
	#[instrument(skip_all, fields(order_id = %order_id))]
	pub async fn update_status(
		&self,
		order_id: &str,
		actor: &Actor,
		new_status: OrderStatus,
	) -> Result<OrderRequest, TriageError> {
		let updated = self
			.update_order_with(order_id, |o| {
				if o.transferred_away_from(&actor.id) {
					return Err(TriageError::Forbidden(
						"order was transferred to another admin".to_string(),
					));
				}
				o.status = new_status;
				if o.is_unassigned() {
					o.assigned_admin_id = Some(actor.id.clone());
					o.assigned_admin_name = actor.name.clone().or_else(|| actor.email.clone());
					o.assigned_admin_email = actor.email.clone();
				}
				Ok(())
			})
			.await?;

		tracing::debug!(
			component = "core",
			order_id = %order_id,
			status = %updated.status,
			"Order status updated"
		);

		Ok(updated)
	}

	/// Replaces the details text on an order.
	pub async fn update_details(
		&self,
		order_id: &str,
		details: &str,
	) -> Result<OrderRequest, TriageError> {
		let trimmed = details.trim();
		if trimmed.is_empty() {
			return Err(validation("details", "replacement details must not be empty"));
		}

		let details = trimmed.to_string();
		self.update_order_with(order_id, |o| {
			o.details = details;
			Ok(())
		})
		.await
	}

	/// Opens a reassignment handshake naming `target` as the next owner.
	///
	/// Any prior handshake record, decided or not, is discarded. Assignment
	/// fields stay with the current owner until the target accepts.
	#[instrument(skip_all, fields(order_id = %order_id, to_admin = %target.admin_id))]
	pub async fn request_reassignment(
		&self,
		order_id: &str,
		actor: &Actor,
		target: ReassignmentTarget,
	) -> Result<OrderRequest, TriageError> {
		let target_id = target.admin_id.trim().to_string();
		if target_id.is_empty() {
			return Err(validation("assignedAdminId", "a target admin is required"));
		}

		let to_admin_name = target
			.admin_name
			.filter(|s| !s.is_empty())
			.unwrap_or_else(|| target_id.clone());
		let to_admin_email = target.admin_email.filter(|s| !s.is_empty());
		let requested_at = Utc::now();

		let updated = self
			.update_order_with(order_id, |o| {
				o.reassignment = Some(Reassignment {
					from_admin_id: o
						.assigned_admin_id
						.clone()
						.unwrap_or_else(|| actor.id.clone()),
					from_admin_name: o
						.assigned_admin_name
						.clone()
						.unwrap_or_else(|| actor.display_label().to_string()),
					to_admin_id: target_id,
					to_admin_name,
					to_admin_email,
					status: ReassignmentStatus::Pending,
					created_at: requested_at,
					decided_at: None,
				});
				Ok(())
			})
			.await?;

		tracing::info!(
			component = "core",
			order_id = %order_id,
			"Reassignment requested"
		);

		Ok(updated)
	}

	/// Decides a pending reassignment as the target admin.
	///
	/// The write is conditioned on the exact document the decision was read
	/// from; a concurrent writer causes a conflict rather than a silently
	/// overwritten handshake.
	#[instrument(skip_all, fields(order_id = %order_id, decision = %decision))]
	pub async fn decide_reassignment(
		&self,
		order_id: &str,
		actor: &Actor,
		decision: ReassignmentDecision,
	) -> Result<OrderRequest, TriageError> {
		let seen = self
			.storage
			.retrieve_snapshot::<OrderRequest>(Collection::ConsumerOrders.as_str(), order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		let handshake = match seen.value.reassignment.as_ref() {
			Some(r) if r.to_admin_id == actor.id => r,
			_ => {
				return Err(TriageError::Forbidden(
					"no reassignment is addressed to this admin".to_string(),
				))
			},
		};
		if handshake.status != ReassignmentStatus::Pending {
			return Err(TriageError::Conflict(
				"reassignment has already been decided".to_string(),
			));
		}

		let decided_at = Utc::now();
		let mut updated = seen.value.clone();
		if let Some(r) = updated.reassignment.as_mut() {
			r.status = match decision {
				ReassignmentDecision::Accept => ReassignmentStatus::Accepted,
				ReassignmentDecision::Decline => ReassignmentStatus::Declined,
			};
			r.decided_at = Some(decided_at);
		}
		if decision == ReassignmentDecision::Accept {
			updated.assigned_admin_id = Some(handshake.to_admin_id.clone());
			updated.assigned_admin_name = Some(handshake.to_admin_name.clone());
			updated.assigned_admin_email = handshake.to_admin_email.clone();
		}
		updated.updated_at = decided_at;

		self.storage
			.update_guarded(Collection::ConsumerOrders.as_str(), order_id, &seen, &updated)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		tracing::info!(
			component = "core",
			order_id = %order_id,
			decision = %decision,
			"Reassignment decided"
		);

		Ok(updated)
	}

	/// Removes an order outright.
	///
	/// Deleting an order that is already gone is not an error.
	pub async fn delete_order(&self, order_id: &str) -> Result<(), TriageError> {
		self.storage
			.remove(Collection::ConsumerOrders.as_str(), order_id)
			.await
			.map_err(|e| TriageError::Storage(e.to_string()))?;

		tracing::info!(component = "core", order_id = %order_id, "Order deleted");
		Ok(())
	}

	/// Lists orders visible to an admin, newest first.
	///
	/// Visibility covers their own assignments, the unassigned pool, and
	/// any order where they are a party to the reassignment handshake.
	pub async fn list_orders_for_admin(
		&self,
		admin_id: &str,
	) -> Result<Vec<OrderRequest>, TriageError> {
		let mut orders: Vec<OrderRequest> = self
			.storage
			.retrieve_all(Collection::ConsumerOrders.as_str())
			.await
			.map_err(|e| TriageError::Storage(e.to_string()))?;

		orders.retain(|o| o.visible_to_admin(admin_id));
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(orders)
	}

	/// Lists a customer's own orders, newest first, capped at
	/// [`CUSTOMER_LIST_LIMIT`].
	pub async fn list_orders_for_customer(
		&self,
		customer_id: &str,
	) -> Result<Vec<OrderRequest>, TriageError> {
		let mut orders: Vec<OrderRequest> = self
			.storage
			.retrieve_all(Collection::ConsumerOrders.as_str())
			.await
			.map_err(|e| TriageError::Storage(e.to_string()))?;

		orders.retain(|o| o.owned_by(customer_id));
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		orders.truncate(CUSTOMER_LIST_LIMIT);
		Ok(orders)
	}

	/// Returns the customer-facing tracking summary for an order.
	///
	/// Orders owned by other customers read as missing rather than
	/// forbidden, so the endpoint does not leak which ids exist.
	pub async fn track_order(
		&self,
		order_id: &str,
		customer_id: &str,
	) -> Result<OrderTrackingResponse, TriageError> {
		let order = self.get_order(order_id).await?;
		if !order.owned_by(customer_id) {
			return Err(TriageError::NotFound(order_id.to_string()));
		}
		Ok(OrderTrackingResponse::from(&order))
	}
}
