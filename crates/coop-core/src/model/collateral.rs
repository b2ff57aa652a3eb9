use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Stamps;
use crate::scope::BranchScope;

/// A kind of collateral accepted against loans (land title, vehicle, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collateral {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

crate::branch_scoped_record!(Collateral, "collateral");
