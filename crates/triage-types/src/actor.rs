//! Actor identity types resolved at the service boundary.
//!
//! Authentication happens upstream of this service; the auth proxy injects
//! the resolved identity as request headers, handlers extract it into an
//! [`Actor`] and pass it explicitly into every operation instead of reading
//! ambient session state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::ApiError;

/// Header carrying the actor's stable identifier.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the actor's display name, when the directory has one.
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
/// Header carrying the actor's email, when known.
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
/// Header carrying the actor's role (`admin` or `customer`).
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The role an authenticated actor holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
	/// Internal staff working the triage queue.
	Admin,
	/// A customer submitting and tracking order requests.
	Customer,
}

impl ActorRole {
	/// Returns the wire representation of the role.
	pub fn as_str(&self) -> &'static str {
		match self {
			ActorRole::Admin => "admin",
			ActorRole::Customer => "customer",
		}
	}
}

impl fmt::Display for ActorRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ActorRole {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(Self::Admin),
			"customer" => Ok(Self::Customer),
			_ => Err(()),
		}
	}
}

/// A resolved identity acting on the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
	/// Stable identifier issued by the identity provider.
	pub id: String,
	/// Display name, when the identity provider supplies one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Email address, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Role granted by the identity provider.
	pub role: ActorRole,
}

impl Actor {
	/// Creates an admin actor with only an id, for contexts where the
	/// directory supplied no profile fields.
	pub fn admin(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: None,
			email: None,
			role: ActorRole::Admin,
		}
	}

	/// Creates a customer actor with only an id.
	pub fn customer(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: None,
			email: None,
			role: ActorRole::Customer,
		}
	}

	/// Whether this actor holds the admin role.
	pub fn is_admin(&self) -> bool {
		self.role == ActorRole::Admin
	}

	/// Best display label for the actor: name, then email, then id.
	pub fn display_label(&self) -> &str {
		self.name
			.as_deref()
			.or(self.email.as_deref())
			.unwrap_or(&self.id)
	}
}

impl<S> FromRequestParts<S> for Actor
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let header = |name: &str| -> Option<String> {
			parts
				.headers
				.get(name)
				.and_then(|value| value.to_str().ok())
				.map(str::to_string)
		};

		let id = header(ACTOR_ID_HEADER)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| ApiError::Unauthorized {
				message: "missing actor identity".to_string(),
			})?;
		let role = header(ACTOR_ROLE_HEADER)
			.and_then(|value| value.parse::<ActorRole>().ok())
			.ok_or_else(|| ApiError::Unauthorized {
				message: "missing or unknown actor role".to_string(),
			})?;

		Ok(Actor {
			id,
			name: header(ACTOR_NAME_HEADER).filter(|value| !value.is_empty()),
			email: header(ACTOR_EMAIL_HEADER).filter(|value| !value.is_empty()),
			role,
		})
	}
}
