//! # Footsteps: Audit Vocabulary and Hash Chain
//!
//! A footstep records the outcome of one user-initiated mutating action:
//! which module it touched, what happened (`create-success`,
//! `bulk-delete-error`, ...) and a free-text description.
//!
//! Footsteps are append-only. Each entry carries the hash of its predecessor
//! and its own hash over `previous_hash || activity || module || description
//! || actor || created_at`, so any edit or removal breaks the chain and is
//! detected by [`verify_chain`].

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::identity::{BranchId, OrganizationId, UserId};

/// Hash used as `previous_hash` of the first footstep.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// The kind of mutating action being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Create,
    Update,
    Delete,
    BulkDelete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::BulkDelete => "bulk-delete",
        }
    }

    pub fn success(self) -> Activity {
        Activity {
            operation: self,
            succeeded: true,
        }
    }

    pub fn error(self) -> Activity {
        Activity {
            operation: self,
            succeeded: false,
        }
    }
}

/// An operation paired with its outcome. Renders as `<operation>-<outcome>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Activity {
    pub operation: Operation,
    pub succeeded: bool,
}

impl Activity {
    pub fn as_tag(&self) -> String {
        let outcome = if self.succeeded { "success" } else { "error" };
        format!("{}-{}", self.operation.as_str(), outcome)
    }

    /// Parse a tag such as `bulk-delete-error`.
    pub fn parse(tag: &str) -> Option<Self> {
        let (op, outcome) = tag.rsplit_once('-')?;
        let operation = match op {
            "create" => Operation::Create,
            "update" => Operation::Update,
            "delete" => Operation::Delete,
            "bulk-delete" => Operation::BulkDelete,
            _ => return None,
        };
        let succeeded = match outcome {
            "success" => true,
            "error" => false,
            _ => return None,
        };
        Some(Self {
            operation,
            succeeded,
        })
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_tag())
    }
}

impl Serialize for Activity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_tag())
    }
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Activity::parse(&tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown activity: {tag}")))
    }
}

/// What the emitting handler knows about an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootstepEvent {
    pub activity: Activity,
    pub description: String,
    pub module: String,
}

impl FootstepEvent {
    pub fn new(activity: Activity, module: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            activity,
            description: description.into(),
            module: module.into(),
        }
    }
}

/// A persisted, chained audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footstep {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub organization_id: Option<OrganizationId>,
    pub branch_id: Option<BranchId>,
    pub module: String,
    pub activity: Activity,
    pub description: String,
    pub previous_hash: String,
    pub event_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The actor an event is attributed to. All fields are empty when the
/// request failed before an identity could be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub organization_id: Option<OrganizationId>,
    pub branch_id: Option<BranchId>,
}

impl Footstep {
    /// Build the entry that follows `previous_hash` in the chain.
    pub fn chain(previous_hash: &str, actor: Actor, event: FootstepEvent, at: DateTime<Utc>) -> Self {
        let mut step = Self {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            organization_id: actor.organization_id,
            branch_id: actor.branch_id,
            module: event.module,
            activity: event.activity,
            description: event.description,
            previous_hash: previous_hash.to_string(),
            event_hash: String::new(),
            created_at: at,
        };
        step.event_hash = step.compute_hash();
        step
    }

    /// Digest over every field except `event_hash`.
    ///
    /// Each field is length-prefixed so that no two distinct entries encode
    /// to the same input. Absent identifiers encode as empty fields.
    pub fn compute_hash(&self) -> String {
        fn optional(id: Option<impl ToString>) -> String {
            id.map(|v| v.to_string()).unwrap_or_default()
        }
        let fields = [
            self.previous_hash.clone(),
            self.id.to_string(),
            optional(self.user_id),
            optional(self.organization_id),
            optional(self.branch_id),
            self.module.clone(),
            self.activity.as_tag(),
            self.description.clone(),
            self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ];
        let mut hasher = Sha256::new();
        for field in &fields {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        to_hex(&hasher.finalize())
    }
}

/// Check hash continuity. Returns the index of the first broken entry.
pub fn verify_chain(steps: &[Footstep]) -> Result<(), usize> {
    let mut expected_prev = GENESIS_HASH;
    for (i, step) in steps.iter().enumerate() {
        if step.previous_hash != expected_prev || step.event_hash != step.compute_hash() {
            return Err(i);
        }
        expected_prev = &step.event_hash;
    }
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
