use std::fmt;
use std::sync::Arc;

macro_rules! string_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(Arc<str>);

		impl $name {
			/// Creates an identifier from any string-like value.
			pub fn new(id: impl AsRef<str>) -> Self {
				Self(Arc::from(id.as_ref()))
			}

			/// Returns the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self::new(id)
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(Arc::from(id))
			}
		}

		impl std::borrow::Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}

		#[cfg(feature = "serde")]
		impl serde::Serialize for $name {
			fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(&self.0)
			}
		}

		#[cfg(feature = "serde")]
		impl<'de> serde::Deserialize<'de> for $name {
			fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				<String as serde::Deserialize>::deserialize(deserializer).map(Self::from)
			}
		}
	};
}

string_id!(
	/// Identifier of a participant (friend or collaborator).
	ParticipantId
);

string_id!(
	/// Identifier of a splittable line item.
	LineItemId
);
