//! Storage-related types for the triage system.

use std::str::FromStr;

/// Document collections persisted by the triage service.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
	/// Customer-submitted order requests.
	ConsumerOrders,
}

impl Collection {
	/// Returns the string representation of the collection.
	pub fn as_str(&self) -> &'static str {
		match self {
			Collection::ConsumerOrders => "consumer_orders",
		}
	}

	/// Returns an iterator over all Collection variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::ConsumerOrders].into_iter()
	}
}

impl FromStr for Collection {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"consumer_orders" => Ok(Self::ConsumerOrders),
			_ => Err(()),
		}
	}
}

impl From<Collection> for &'static str {
	fn from(collection: Collection) -> Self {
		collection.as_str()
	}
}
