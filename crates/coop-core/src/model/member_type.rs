use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Stamps;
use crate::scope::BranchScope;

/// A membership class (regular, associate, ...). `prefix` is prepended to
/// passbook numbers of members of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberType {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub description: String,
}

crate::branch_scoped_record!(MemberType, "member_type");
