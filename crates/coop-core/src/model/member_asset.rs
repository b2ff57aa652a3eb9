use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::MediaId;
use crate::record::Stamps;
use crate::scope::BranchScope;

/// An asset declared by a member. `cost` is a decimal string so amounts
/// survive the round trip without float rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAsset {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub member_profile_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub media_id: Option<MediaId>,
}

crate::branch_scoped_record!(MemberAsset, "member_asset");
