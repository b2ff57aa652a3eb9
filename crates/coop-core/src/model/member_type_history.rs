use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::model::MemberProfile;
use crate::record::Stamps;
use crate::scope::BranchScope;

/// One assignment of a member type to a member profile.
///
/// Entries are append-only: a new one is written whenever a profile gets a
/// member type it did not have before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTypeHistory {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub member_profile_id: Uuid,
    pub member_type_id: Uuid,
}

crate::branch_scoped_record!(MemberTypeHistory, "member_type_history");

impl MemberTypeHistory {
    /// The entry for `after`, if its member type differs from `before`'s.
    pub fn on_change(
        before: Option<&MemberProfile>,
        after: &MemberProfile,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Option<Self> {
        let member_type_id = after.member_type_id?;
        if before.and_then(|p| p.member_type_id) == Some(member_type_id) {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            scope: after.scope,
            stamps: Stamps::created_by(actor, at),
            member_profile_id: after.id,
            member_type_id,
        })
    }
}
