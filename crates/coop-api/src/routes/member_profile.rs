//! # Member Profiles
//!
//! Cooperative members, under `/api/v1/member-profile`. `full_name` is
//! derived from the name parts on every write; clients never set it.
//! A profile may reference a member type of the same branch; every new
//! assignment is appended to the member type history.

use std::future::Future;

use axum::Router;
use chrono::Utc;
use coop_core::model::member_profile::full_name;
use coop_core::model::{MemberProfile, MemberTypeHistory};
use coop_core::{BranchScope, Stamps, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::Validate;
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberProfileRequest {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub passbook: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub member_type_id: Option<Uuid>,
}

impl Validate for MemberProfileRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("first_name", &self.first_name, 1, 255)?;
        ValidationError::check_required("last_name", &self.last_name, 1, 255)?;
        ValidationError::check_optional("middle_name", self.middle_name.as_deref(), 255)?;
        ValidationError::check_optional("suffix", self.suffix.as_deref(), 50)?;
        ValidationError::check_optional("passbook", self.passbook.as_deref(), 255)?;
        ValidationError::check_optional("contact_number", self.contact_number.as_deref(), 20)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberProfileResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub full_name: String,
    pub passbook: Option<String>,
    pub contact_number: Option<String>,
    pub member_type_id: Option<Uuid>,
}

impl Entity for MemberProfile {
    type Response = MemberProfileResponse;
    const MODULE: &'static str = "MemberProfile";

    fn to_model(&self) -> MemberProfileResponse {
        MemberProfileResponse {
            meta: RecordMeta::of(self),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            suffix: self.suffix.clone(),
            full_name: self.full_name.clone(),
            passbook: self.passbook.clone(),
            contact_number: self.contact_number.clone(),
            member_type_id: self.member_type_id,
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.member_profiles
    }
}

impl ScopedEntity for MemberProfile {
    type Request = MemberProfileRequest;
    const PATH: &'static str = "member-profile";

    fn from_request(request: MemberProfileRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        let full_name = full_name(
            &request.first_name,
            request.middle_name.as_deref(),
            &request.last_name,
            request.suffix.as_deref(),
        );
        Self {
            id,
            scope,
            stamps,
            first_name: request.first_name,
            middle_name: request.middle_name,
            last_name: request.last_name,
            suffix: request.suffix,
            full_name,
            passbook: request.passbook,
            contact_number: request.contact_number,
            member_type_id: request.member_type_id,
        }
    }

    fn apply(&mut self, request: MemberProfileRequest) {
        self.first_name = request.first_name;
        self.middle_name = request.middle_name;
        self.last_name = request.last_name;
        self.suffix = request.suffix;
        self.passbook = request.passbook;
        self.contact_number = request.contact_number;
        self.member_type_id = request.member_type_id;
        self.refresh_full_name();
    }

    fn display_name(&self) -> String {
        self.full_name.clone()
    }

    fn check_references(
        request: &MemberProfileRequest,
        state: &AppState,
        scope: &BranchScope,
    ) -> Result<(), AppError> {
        if let Some(member_type_id) = request.member_type_id {
            state
                .member_types
                .get_scoped(member_type_id, scope)
                .map_err(|_| ValidationError::UnknownReference {
                    field: "member_type_id",
                    target: "member type",
                    id: member_type_id.to_string(),
                })?;
        }
        Ok(())
    }

    fn after_write(
        state: &AppState,
        before: Option<&Self>,
        after: &Self,
        actor: UserId,
    ) -> impl Future<Output = Result<(), AppError>> + Send {
        let entry = MemberTypeHistory::on_change(before, after, actor, Utc::now());
        let histories = state.member_type_histories.clone();
        async move {
            if let Some(entry) = entry {
                let entry = histories.create(entry).await?;
                tracing::debug!(
                    member_profile_id = %entry.member_profile_id,
                    member_type_id = %entry.member_type_id,
                    "member type history recorded"
                );
            }
            Ok(())
        }
    }
}

scoped_routes! {
    entity = MemberProfile,
    request = MemberProfileRequest,
    response = MemberProfileResponse,
    tag = "member profiles",
    base = "/api/v1/member-profile",
    search = "/api/v1/member-profile/search",
    item = "/api/v1/member-profile/{id}",
    bulk = "/api/v1/member-profile/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coop_core::{BranchId, OrganizationId};

    fn request() -> MemberProfileRequest {
        MemberProfileRequest {
            first_name: "Ana".into(),
            middle_name: Some("M.".into()),
            last_name: "Cruz".into(),
            suffix: None,
            passbook: Some("PB-0001".into()),
            contact_number: None,
            member_type_id: None,
        }
    }

    #[test]
    fn full_name_derived_on_create_and_update() {
        let scope = BranchScope::new(OrganizationId::new(), BranchId::new());
        let stamps = Stamps::created_by(UserId::new(), Utc::now());
        let mut profile = MemberProfile::from_request(request(), Uuid::new_v4(), scope, stamps);
        assert_eq!(profile.full_name, "Ana M. Cruz");

        let mut changed = request();
        changed.middle_name = None;
        changed.suffix = Some("Jr.".into());
        profile.apply(changed);
        assert_eq!(profile.full_name, "Ana Cruz Jr.");
    }

    #[test]
    fn last_name_required() {
        let mut req = request();
        req.last_name = String::new();
        assert_eq!(req.validate(), Err(ValidationError::Required { field: "last_name" }));
    }

    #[tokio::test]
    async fn member_type_must_exist_in_branch() {
        let state = AppState::new();
        let scope = BranchScope::new(OrganizationId::new(), BranchId::new());
        let mut req = request();
        req.member_type_id = Some(Uuid::new_v4());
        assert!(matches!(
            MemberProfile::check_references(&req, &state, &scope),
            Err(AppError::Validation(_))
        ));

        let member_type = coop_core::model::MemberType {
            id: Uuid::new_v4(),
            scope,
            stamps: Stamps::created_by(UserId::new(), Utc::now()),
            name: "Regular".into(),
            prefix: "REG".into(),
            description: String::new(),
        };
        state.member_types.create(member_type.clone()).await.unwrap();
        req.member_type_id = Some(member_type.id);
        assert!(MemberProfile::check_references(&req, &state, &scope).is_ok());

        let elsewhere = BranchScope::new(scope.organization_id, BranchId::new());
        assert!(MemberProfile::check_references(&req, &state, &elsewhere).is_err());
    }

    #[tokio::test]
    async fn new_member_type_appends_history() {
        let state = AppState::new();
        let scope = BranchScope::new(OrganizationId::new(), BranchId::new());
        let actor = UserId::new();
        let stamps = Stamps::created_by(actor, Utc::now());
        let mut req = request();
        req.member_type_id = Some(Uuid::new_v4());
        let profile = MemberProfile::from_request(req, Uuid::new_v4(), scope, stamps);

        MemberProfile::after_write(&state, None, &profile, actor).await.unwrap();
        MemberProfile::after_write(&state, Some(&profile), &profile, actor).await.unwrap();

        let entries = state.member_type_histories.list_scoped(&scope);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].member_profile_id, profile.id);
        assert_eq!(entries[0].stamps.created_by_id, actor);
    }
}
