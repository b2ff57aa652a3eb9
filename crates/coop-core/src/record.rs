//! # Record Traits and Lifecycle Stamps
//!
//! Every persisted entity implements [`Record`]. Entities that live inside a
//! branch additionally implement [`BranchScoped`], which exposes the
//! [`BranchScope`] they were created under and their [`Stamps`].
//!
//! Deletion is soft: [`Record::mark_deleted`] sets the deletion stamps and the
//! record disappears from every read path, but the row stays in storage for
//! audit purposes.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{BranchId, OrganizationId, UserId};
use crate::scope::BranchScope;

/// Creation, update and deletion stamps carried by branch-scoped records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamps {
    pub created_at: DateTime<Utc>,
    pub created_by_id: UserId,
    pub updated_at: DateTime<Utc>,
    pub updated_by_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by_id: Option<UserId>,
}

impl Stamps {
    /// Stamps for a record created now by `actor`.
    pub fn created_by(actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            created_by_id: actor,
            updated_at: at,
            updated_by_id: actor,
            deleted_at: None,
            deleted_by_id: None,
        }
    }

    pub fn touch(&mut self, actor: UserId, at: DateTime<Utc>) {
        self.updated_at = at;
        self.updated_by_id = actor;
    }

    pub fn delete(&mut self, actor: Option<UserId>, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.deleted_by_id = actor;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A persisted entity addressable by UUID.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Storage discriminator. Unique per entity type.
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn is_deleted(&self) -> bool;

    /// Soft-delete the record.
    fn mark_deleted(&mut self, actor: Option<UserId>, at: DateTime<Utc>);

    fn organization_id(&self) -> Option<OrganizationId> {
        None
    }

    fn branch_id(&self) -> Option<BranchId> {
        None
    }
}

/// A record owned by exactly one branch.
pub trait BranchScoped: Record {
    fn scope(&self) -> BranchScope;

    fn stamps(&self) -> &Stamps;

    fn stamps_mut(&mut self) -> &mut Stamps;

    /// Whether the record is visible to `scope`.
    fn visible_to(&self, scope: &BranchScope) -> bool {
        !self.stamps().is_deleted() && self.scope() == *scope
    }
}

/// Implement [`Record`] and [`BranchScoped`] for a struct with `id: Uuid`,
/// `scope: BranchScope` and `stamps: Stamps` fields.
#[macro_export]
macro_rules! branch_scoped_record {
    ($ty:ty, $kind:literal) => {
        impl $crate::record::Record for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.stamps.created_at
            }

            fn is_deleted(&self) -> bool {
                self.stamps.is_deleted()
            }

            fn mark_deleted(
                &mut self,
                actor: Option<$crate::identity::UserId>,
                at: ::chrono::DateTime<::chrono::Utc>,
            ) {
                self.stamps.delete(actor, at);
            }

            fn organization_id(&self) -> Option<$crate::identity::OrganizationId> {
                Some(self.scope.organization_id)
            }

            fn branch_id(&self) -> Option<$crate::identity::BranchId> {
                Some(self.scope.branch_id)
            }
        }

        impl $crate::record::BranchScoped for $ty {
            fn scope(&self) -> $crate::scope::BranchScope {
                self.scope
            }

            fn stamps(&self) -> &$crate::record::Stamps {
                &self.stamps
            }

            fn stamps_mut(&mut self) -> &mut $crate::record::Stamps {
                &mut self.stamps
            }
        }
    };
}
