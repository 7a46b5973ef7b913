//! API types for the order triage HTTP API.
//!
//! This module defines the request and response types for the triage API
//! endpoints, mirroring the camelCase wire contract the customer portal and
//! admin dashboard speak.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::order::{OrderRequest, OrderStatus, ReassignmentDecision};

/// Request body for submitting a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	/// Contact name for the order.
	pub name: String,
	/// Contact email for the order.
	pub email: String,
	/// Free-text description of what is needed.
	pub details: String,
	/// Optional budget estimate. The portal form submits this as a string,
	/// so both JSON numbers and numeric strings are accepted.
	#[serde(default, with = "budget_serde")]
	pub budget: Option<f64>,
	/// Admin chosen by the customer at submission.
	pub admin_id: String,
	/// Display name of the chosen admin.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub admin_name: Option<String>,
	/// Email of the chosen admin.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub admin_email: Option<String>,
}

/// Request body for the admin PATCH endpoint.
///
/// Carries the order id plus any combination of actions: a status change, a
/// details edit, a reassignment request (with `assignedAdmin*` naming the
/// target), or a decision on a pending reassignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
	/// Identifier of the order to update.
	pub id: String,
	/// New status, when changing it.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
	/// Replacement details text, when editing it.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
	/// When true, starts a reassignment to the admin named in the
	/// `assignedAdmin*` fields.
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub reassignment_request: bool,
	/// Target admin id for a reassignment request.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_admin_id: Option<String>,
	/// Target admin display name for a reassignment request.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_admin_name: Option<String>,
	/// Target admin email for a reassignment request.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_admin_email: Option<String>,
	/// Decision on a pending reassignment addressed to the caller.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reassignment_decision: Option<ReassignmentDecision>,
}

impl UpdateOrderRequest {
	/// Whether the body selects at least one action.
	pub fn has_action(&self) -> bool {
		self.status.is_some()
			|| self.details.is_some()
			|| self.reassignment_request
			|| self.reassignment_decision.is_some()
	}
}

/// Response body for a successful order submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
	/// Always true on success.
	pub ok: bool,
	/// The created order document.
	pub order: OrderRequest,
}

/// Minimal acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
	/// Always true on success.
	pub ok: bool,
}

impl OkResponse {
	pub fn new() -> Self {
		Self { ok: true }
	}
}

impl Default for OkResponse {
	fn default() -> Self {
		Self::new()
	}
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
	/// Bad request with validation errors (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Missing or malformed actor identity (401)
	Unauthorized { message: String },
	/// Actor is not allowed to perform the operation (403)
	Forbidden { message: String },
	/// Requested document does not exist or is out of scope (404)
	NotFound { message: String },
	/// Operation lost against a concurrent or earlier write (409)
	Conflict { message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::BadRequest { .. } => 400,
			ApiError::Unauthorized { .. } => 401,
			ApiError::Forbidden { .. } => 403,
			ApiError::NotFound { .. } => 404,
			ApiError::Conflict { .. } => 409,
			ApiError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			ApiError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			ApiError::Unauthorized { message } => ErrorResponse {
				error: "unauthorized".to_string(),
				message: message.clone(),
				details: None,
			},
			ApiError::Forbidden { message } => ErrorResponse {
				error: "forbidden".to_string(),
				message: message.clone(),
				details: None,
			},
			ApiError::NotFound { message } => ErrorResponse {
				error: "not_found".to_string(),
				message: message.clone(),
				details: None,
			},
			ApiError::Conflict { message } => ErrorResponse {
				error: "conflict".to_string(),
				message: message.clone(),
				details: None,
			},
			ApiError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			ApiError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
			ApiError::Forbidden { message } => write!(f, "Forbidden: {}", message),
			ApiError::NotFound { message } => write!(f, "Not Found: {}", message),
			ApiError::Conflict { message } => write!(f, "Conflict: {}", message),
			ApiError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = match self.status_code() {
			400 => StatusCode::BAD_REQUEST,
			401 => StatusCode::UNAUTHORIZED,
			403 => StatusCode::FORBIDDEN,
			404 => StatusCode::NOT_FOUND,
			409 => StatusCode::CONFLICT,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}

/// Serde module for budget deserialization.
///
/// The portal form posts budgets as strings ("1500"), older clients post
/// numbers, and both may be null. Anything that does not resolve to a
/// finite number becomes `None`.
pub mod budget_serde {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawBudget {
		Number(f64),
		Text(String),
	}

	pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = Option::<RawBudget>::deserialize(deserializer)?;
		Ok(match raw {
			Some(RawBudget::Number(n)) if n.is_finite() => Some(n),
			Some(RawBudget::Number(_)) => None,
			Some(RawBudget::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
			None => None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_create(json: &str) -> CreateOrderRequest {
		serde_json::from_str(json).unwrap()
	}

	#[test]
	fn budget_accepts_numbers_and_numeric_strings() {
		let req = parse_create(
			r#"{"name":"Jane","email":"jane@x.com","details":"widgets","budget":1500,"adminId":"A1"}"#,
		);
		assert_eq!(req.budget, Some(1500.0));

		let req = parse_create(
			r#"{"name":"Jane","email":"jane@x.com","details":"widgets","budget":" 250.5 ","adminId":"A1"}"#,
		);
		assert_eq!(req.budget, Some(250.5));
	}

	#[test]
	fn budget_tolerates_junk() {
		let req = parse_create(
			r#"{"name":"Jane","email":"jane@x.com","details":"widgets","budget":"a lot","adminId":"A1"}"#,
		);
		assert_eq!(req.budget, None);

		// "inf" parses as f64 but is not a usable estimate.
		let req = parse_create(
			r#"{"name":"Jane","email":"jane@x.com","details":"widgets","budget":"inf","adminId":"A1"}"#,
		);
		assert_eq!(req.budget, None);

		let req = parse_create(
			r#"{"name":"Jane","email":"jane@x.com","details":"widgets","budget":null,"adminId":"A1"}"#,
		);
		assert_eq!(req.budget, None);

		let req =
			parse_create(r#"{"name":"Jane","email":"jane@x.com","details":"widgets","adminId":"A1"}"#);
		assert_eq!(req.budget, None);
	}

	#[test]
	fn update_request_reports_selected_actions() {
		let body: UpdateOrderRequest =
			serde_json::from_str(r#"{"id":"o-1","status":"approved"}"#).unwrap();
		assert!(body.has_action());

		let body: UpdateOrderRequest = serde_json::from_str(r#"{"id":"o-1"}"#).unwrap();
		assert!(!body.has_action());

		let body: UpdateOrderRequest = serde_json::from_str(
			r#"{"id":"o-1","reassignmentRequest":true,"assignedAdminId":"A2"}"#,
		)
		.unwrap();
		assert!(body.reassignment_request);
		assert_eq!(body.assigned_admin_id.as_deref(), Some("A2"));
	}

	#[test]
	fn error_status_codes() {
		let err = ApiError::Conflict {
			message: "decided".to_string(),
		};
		assert_eq!(err.status_code(), 409);
		assert_eq!(err.to_error_response().error, "conflict");
	}
}
