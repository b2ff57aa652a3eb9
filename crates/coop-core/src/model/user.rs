use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::PasswordHash;
use crate::identity::{BranchId, MediaId, OrganizationId, UserId};
use crate::record::Record;

/// A user account. The password hash never leaves the service: API
/// projections copy every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    pub user_name: String,
    pub email: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub media_id: Option<MediaId>,
    pub password: PasswordHash,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub is_contact_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Change the email, clearing verification when it actually differs.
    pub fn set_email(&mut self, email: String) {
        if self.email != email {
            self.email = email;
            self.is_email_verified = false;
        }
    }

    /// Change the contact number, clearing verification when it actually differs.
    pub fn set_contact_number(&mut self, contact_number: String) {
        if self.contact_number != contact_number {
            self.contact_number = contact_number;
            self.is_contact_verified = false;
        }
    }

    pub fn refresh_full_name(&mut self) {
        self.full_name = crate::model::member_profile::full_name(
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
            self.suffix.as_deref(),
        );
    }
}

impl Record for User {
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id.into_uuid()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    fn mark_deleted(&mut self, _actor: Option<UserId>, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn organization_id(&self) -> Option<OrganizationId> {
        Some(self.organization_id)
    }

    fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }
}
