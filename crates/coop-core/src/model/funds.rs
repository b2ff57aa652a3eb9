use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Stamps;
use crate::scope::BranchScope;

/// A fund source, optionally tied to a ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funds {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub fund_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub gl_books: String,
}

crate::branch_scoped_record!(Funds, "funds");
