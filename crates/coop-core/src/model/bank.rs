use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::MediaId;
use crate::record::Stamps;
use crate::scope::BranchScope;

/// A bank the cooperative deals with (deposits, check remittances).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media_id: Option<MediaId>,
}

crate::branch_scoped_record!(Bank, "bank");
