use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
    Alert,
}

/// A message addressed to one user. Notifications belong to the user, not to
/// a branch, so they implement [`Record`] without [`BranchScoped`](crate::BranchScoped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub is_viewed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        notification_type: NotificationType,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: description.into(),
            notification_type,
            is_viewed: false,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    /// Mark as viewed. Returns `false` when it already was.
    pub fn mark_viewed(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_viewed {
            return false;
        }
        self.is_viewed = true;
        self.updated_at = at;
        true
    }

    pub fn belongs_to(&self, user_id: UserId) -> bool {
        self.user_id == user_id && self.deleted_at.is_none()
    }
}

impl Record for Notification {
    const KIND: &'static str = "notification";

    fn id(&self) -> Uuid {
        self.id
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
}
