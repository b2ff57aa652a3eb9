use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Stamps;
use crate::scope::BranchScope;

/// The grouping a tag template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "alert")]
    Alert,
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "transaction type")]
    TransactionType,
    #[serde(rename = "account type")]
    AccountType,
    #[serde(rename = "special")]
    Special,
    #[serde(rename = "calculation")]
    Calculation,
    #[serde(rename = "cooperative")]
    Cooperative,
    #[serde(rename = "loan")]
    Loan,
    #[serde(rename = "community")]
    Community,
    #[serde(rename = "insurance")]
    Insurance,
    #[serde(rename = "governance")]
    Governance,
    #[serde(rename = "reserves")]
    Reserves,
    #[serde(rename = "digital")]
    Digital,
    #[serde(rename = "membership")]
    Membership,
    #[serde(rename = "security")]
    Security,
}

/// A reusable label (name, color, icon) that can be attached to records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagTemplate {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BranchScope,
    #[serde(flatten)]
    pub stamps: Stamps,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<TagCategory>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

crate::branch_scoped_record!(TagTemplate, "tag_template");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_word_categories_keep_their_spaces() {
        let json = serde_json::to_string(&TagCategory::TransactionType).unwrap();
        assert_eq!(json, "\"transaction type\"");
        let parsed: TagCategory = serde_json::from_str("\"account type\"").unwrap();
        assert_eq!(parsed, TagCategory::AccountType);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(serde_json::from_str::<TagCategory>("\"misc\"").is_err());
    }
}
