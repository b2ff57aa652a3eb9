//! # Identity Newtypes
//!
//! UUID newtypes for the identifiers that define tenancy and authorship.
//! Each is a distinct type: a [`BranchId`] cannot be passed where an
//! [`OrganizationId`] is expected, and neither can be confused with the
//! plain record UUIDs used as primary keys.
//!
//! All newtypes serialize transparently as the bare UUID string so the wire
//! format stays `"created_by_id": "550e8400-..."`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Unwrap into the underlying UUID.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_newtype!(
    /// The authenticated principal (a user account).
    UserId
);

uuid_newtype!(
    /// A cooperative organization: the outer tenant boundary.
    OrganizationId
);

uuid_newtype!(
    /// A branch of an organization: the inner tenant boundary.
    BranchId
);

uuid_newtype!(
    /// An uploaded media object (logo, profile picture, document scan).
    MediaId
);
