//! Order request types for the triage system.
//!
//! This module defines the order document persisted in the `consumer_orders`
//! collection, its status vocabulary, and the reassignment record through
//! which responsibility for an order is handed from one admin to another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer-submitted order request tracked through triage.
///
/// Order requests are created from the public portal and worked by admins:
/// the status moves freely through the triage vocabulary, `details` may be
/// amended, and responsibility can be offered to another admin through the
/// [`Reassignment`] handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
	/// Unique identifier for this order, assigned at creation.
	pub id: String,
	/// Identifier of the customer who submitted the order.
	pub customer_id: String,
	/// Contact name supplied by the customer.
	pub name: String,
	/// Contact email supplied by the customer.
	pub email: String,
	/// Free-text description of what the customer needs.
	pub details: String,
	/// Optional budget estimate. Values that do not parse as a finite
	/// number are stored as absent rather than rejected.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub budget: Option<f64>,
	/// Identifier of the admin currently responsible, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_admin_id: Option<String>,
	/// Display name of the assigned admin.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_admin_name: Option<String>,
	/// Email of the assigned admin.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_admin_email: Option<String>,
	/// Current triage status.
	pub status: OrderStatus,
	/// The most recent reassignment handshake. Kept as history once
	/// decided; a new request overwrites it regardless of its state.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reassignment: Option<Reassignment>,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
}

impl OrderRequest {
	/// Whether no admin currently holds this order.
	pub fn is_unassigned(&self) -> bool {
		self.assigned_admin_id.is_none()
	}

	/// Whether this order belongs to the given customer.
	pub fn owned_by(&self, customer_id: &str) -> bool {
		self.customer_id == customer_id
	}

	/// Triage visibility rule for admins.
	///
	/// An admin sees an order when they are the assignee, when the order is
	/// unassigned (the shared pool), or when they are a party to its
	/// reassignment handshake.
	pub fn visible_to_admin(&self, admin_id: &str) -> bool {
		match self.assigned_admin_id.as_deref() {
			None => return true,
			Some(assigned) if assigned == admin_id => return true,
			Some(_) => {}
		}
		self.reassignment
			.as_ref()
			.is_some_and(|r| r.to_admin_id == admin_id || r.from_admin_id == admin_id)
	}

	/// Whether this order has been handed away from the given admin.
	///
	/// True once a reassignment whose origin they were has been accepted
	/// and they are no longer the assignee. Such admins keep read access
	/// through the visibility rule but may no longer move the status.
	pub fn transferred_away_from(&self, admin_id: &str) -> bool {
		if self.assigned_admin_id.as_deref() == Some(admin_id) {
			return false;
		}
		self.reassignment.as_ref().is_some_and(|r| {
			r.status == ReassignmentStatus::Accepted && r.from_admin_id == admin_id
		})
	}
}

/// Status of an order request in the triage queue.
///
/// No transition table constrains movement between statuses; an admin may
/// set any value at any time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Newly submitted, not yet picked up.
	PendingReview,
	/// An admin is actively working the order.
	InProgress,
	/// Order accepted for fulfillment.
	Approved,
	/// Order turned down.
	Rejected,
	/// Withdrawn by the customer or voided by an admin.
	Cancelled,
}

impl OrderStatus {
	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::PendingReview => "pending_review",
			OrderStatus::InProgress => "in_progress",
			OrderStatus::Approved => "approved",
			OrderStatus::Rejected => "rejected",
			OrderStatus::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An admin-to-admin hand-off of order responsibility.
///
/// Requested on behalf of the current assignee and decided only by the
/// target admin. At most one record exists per order; the latest request
/// wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassignment {
	/// Admin the order is moving away from.
	pub from_admin_id: String,
	/// Display name for the origin admin.
	pub from_admin_name: String,
	/// Admin asked to take the order over.
	pub to_admin_id: String,
	/// Display name for the target admin.
	pub to_admin_name: String,
	/// Email for the target admin, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to_admin_email: Option<String>,
	/// Handshake state.
	pub status: ReassignmentStatus,
	/// Timestamp when the transfer was requested.
	pub created_at: DateTime<Utc>,
	/// Timestamp when the target admin decided, once they have.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub decided_at: Option<DateTime<Utc>>,
}

/// State of a reassignment handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReassignmentStatus {
	/// Waiting on the target admin.
	Pending,
	/// Target admin took the order; assignment fields were updated.
	Accepted,
	/// Target admin declined; assignment is unchanged.
	Declined,
}

impl fmt::Display for ReassignmentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ReassignmentStatus::Pending => write!(f, "pending"),
			ReassignmentStatus::Accepted => write!(f, "accepted"),
			ReassignmentStatus::Declined => write!(f, "declined"),
		}
	}
}

/// Decision a target admin takes on a pending reassignment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReassignmentDecision {
	/// Take the order over.
	Accept,
	/// Leave the order with the current assignee.
	Decline,
}

impl fmt::Display for ReassignmentDecision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ReassignmentDecision::Accept => write!(f, "accept"),
			ReassignmentDecision::Decline => write!(f, "decline"),
		}
	}
}

/// Target admin named in a reassignment request.
///
/// Only the identifier is required; missing display fields fall back to the
/// identifier when the handshake record is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignmentTarget {
	/// Identifier of the admin being asked to take the order over.
	pub admin_id: String,
	/// Display name for the target admin, when the requester supplied one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub admin_name: Option<String>,
	/// Email for the target admin, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub admin_email: Option<String>,
}

/// Customer-facing tracking summary of an order.
///
/// The public tracking endpoint exposes only this subset of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTrackingResponse {
	/// Unique identifier for this order.
	pub id: String,
	/// Contact name on the order.
	pub name: String,
	/// Current triage status.
	pub status: OrderStatus,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
}

impl From<&OrderRequest> for OrderTrackingResponse {
	fn from(order: &OrderRequest) -> Self {
		Self {
			id: order.id.clone(),
			name: order.name.clone(),
			status: order.status,
			created_at: order.created_at,
			updated_at: order.updated_at,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_order() -> OrderRequest {
		let now = Utc::now();
		OrderRequest {
			id: "o-1".to_string(),
			customer_id: "c-1".to_string(),
			name: "Jane".to_string(),
			email: "jane@example.com".to_string(),
			details: "need 10 widgets".to_string(),
			budget: Some(1500.0),
			assigned_admin_id: Some("A1".to_string()),
			assigned_admin_name: Some("Admin One".to_string()),
			assigned_admin_email: None,
			status: OrderStatus::PendingReview,
			reassignment: None,
			created_at: now,
			updated_at: now,
		}
	}

	fn reassignment(status: ReassignmentStatus) -> Reassignment {
		Reassignment {
			from_admin_id: "A1".to_string(),
			from_admin_name: "Admin One".to_string(),
			to_admin_id: "A2".to_string(),
			to_admin_name: "Admin Two".to_string(),
			to_admin_email: None,
			status,
			created_at: Utc::now(),
			decided_at: None,
		}
	}

	#[test]
	fn assignee_and_pool_visibility() {
		let mut order = sample_order();
		assert!(order.visible_to_admin("A1"));
		assert!(!order.visible_to_admin("A2"));

		order.assigned_admin_id = None;
		assert!(order.visible_to_admin("A2"));
		assert!(order.visible_to_admin("A3"));
	}

	#[test]
	fn reassignment_parties_keep_visibility() {
		let mut order = sample_order();
		order.reassignment = Some(reassignment(ReassignmentStatus::Pending));
		assert!(order.visible_to_admin("A1"));
		assert!(order.visible_to_admin("A2"));
		assert!(!order.visible_to_admin("A3"));
	}

	#[test]
	fn transferred_away_requires_accepted_handoff() {
		let mut order = sample_order();
		assert!(!order.transferred_away_from("A1"));

		order.reassignment = Some(reassignment(ReassignmentStatus::Pending));
		assert!(!order.transferred_away_from("A1"));

		// Accepted hand-off moves the assignment to A2.
		order.assigned_admin_id = Some("A2".to_string());
		order.reassignment = Some(reassignment(ReassignmentStatus::Accepted));
		assert!(order.transferred_away_from("A1"));
		assert!(!order.transferred_away_from("A2"));
	}

	#[test]
	fn transfer_back_to_origin_is_not_away() {
		let mut order = sample_order();
		order.reassignment = Some(reassignment(ReassignmentStatus::Accepted));
		// A1 is still the assignee, so they are not locked out.
		assert!(!order.transferred_away_from("A1"));
	}

	#[test]
	fn status_wire_format_is_snake_case() {
		let json = serde_json::to_string(&OrderStatus::PendingReview).unwrap();
		assert_eq!(json, "\"pending_review\"");
		let back: OrderStatus = serde_json::from_str("\"in_progress\"").unwrap();
		assert_eq!(back, OrderStatus::InProgress);
	}

	#[test]
	fn order_serializes_camel_case() {
		let order = sample_order();
		let value = serde_json::to_value(&order).unwrap();
		assert!(value.get("customerId").is_some());
		assert!(value.get("assignedAdminId").is_some());
		assert!(value.get("createdAt").is_some());
		// Absent options are omitted entirely.
		assert!(value.get("reassignment").is_none());
		assert!(value.get("assignedAdminEmail").is_none());
	}
}
