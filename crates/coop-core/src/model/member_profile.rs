use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Stamps;
use crate::scope::BranchScope;

/// A cooperative member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub suffix: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub passbook: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub member_type_id: Option<Uuid>,
}

crate::branch_scoped_record!(MemberProfile, "member_profile");

/// `First Middle Last Suffix`, skipping blank parts.
pub fn full_name(first: &str, middle: Option<&str>, last: &str, suffix: Option<&str>) -> String {
    [Some(first), middle, Some(last), suffix]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl MemberProfile {
    pub fn refresh_full_name(&mut self) {
        self.full_name = full_name(
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
            self.suffix.as_deref(),
        );
    }
}
