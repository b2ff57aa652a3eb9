//! # Member Assets
//!
//! Assets a member declares (land, vehicles, equipment), under
//! `/api/v1/member-asset`. Every asset belongs to a member profile of the
//! same branch.
//!
//! Besides the shared CRUD routes:
//! - `GET /api/v1/member-asset/member-profile/{member_profile_id}`: assets of one member.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use coop_core::model::MemberAsset;
use coop_core::{BranchScope, BranchScoped, MediaId, Stamps, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_path, Validate};
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

fn zero_cost() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberAssetRequest {
    pub member_profile_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    /// Decimal amount with at most two fraction digits, e.g. `"150000.00"`.
    #[serde(default = "zero_cost")]
    pub cost: String,
    #[serde(default)]
    pub media_id: Option<Uuid>,
}

impl Validate for MemberAssetRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("name", &self.name, 1, 255)?;
        ValidationError::check_decimal("cost", &self.cost)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberAssetResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub member_profile_id: Uuid,
    pub name: String,
    pub entry_date: Option<NaiveDate>,
    pub description: String,
    pub cost: String,
    pub media_id: Option<Uuid>,
}

impl Entity for MemberAsset {
    type Response = MemberAssetResponse;
    const MODULE: &'static str = "MemberAsset";

    fn to_model(&self) -> MemberAssetResponse {
        MemberAssetResponse {
            meta: RecordMeta::of(self),
            member_profile_id: self.member_profile_id,
            name: self.name.clone(),
            entry_date: self.entry_date,
            description: self.description.clone(),
            cost: self.cost.clone(),
            media_id: self.media_id.map(MediaId::into_uuid),
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.member_assets
    }
}

impl ScopedEntity for MemberAsset {
    type Request = MemberAssetRequest;
    const PATH: &'static str = "member-asset";

    fn from_request(request: MemberAssetRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        Self {
            id,
            scope,
            stamps,
            member_profile_id: request.member_profile_id,
            name: request.name,
            entry_date: request.entry_date,
            description: request.description,
            cost: request.cost,
            media_id: request.media_id.map(MediaId::from_uuid),
        }
    }

    fn apply(&mut self, request: MemberAssetRequest) {
        self.member_profile_id = request.member_profile_id;
        self.name = request.name;
        self.entry_date = request.entry_date;
        self.description = request.description;
        self.cost = request.cost;
        self.media_id = request.media_id.map(MediaId::from_uuid);
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn check_references(
        request: &MemberAssetRequest,
        state: &AppState,
        scope: &BranchScope,
    ) -> Result<(), AppError> {
        state
            .member_profiles
            .get_scoped(request.member_profile_id, scope)
            .map_err(|_| ValidationError::UnknownReference {
                field: "member_profile_id",
                target: "member profile",
                id: request.member_profile_id.to_string(),
            })?;
        Ok(())
    }
}

scoped_routes! {
    entity = MemberAsset,
    request = MemberAssetRequest,
    response = MemberAssetResponse,
    tag = "member assets",
    base = "/api/v1/member-asset",
    search = "/api/v1/member-asset/search",
    item = "/api/v1/member-asset/{id}",
    bulk = "/api/v1/member-asset/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router().route(
        "/api/v1/member-asset/member-profile/{member_profile_id}",
        get(list_by_member_profile),
    )
}

/// GET /api/v1/member-asset/member-profile/{member_profile_id}
#[utoipa::path(
    get,
    path = "/api/v1/member-asset/member-profile/{member_profile_id}",
    params(("member_profile_id" = Uuid, Path, description = "Member profile id")),
    responses(
        (status = 200, description = "Assets of the member, newest first", body = Vec<MemberAssetResponse>),
        (status = 404, description = "Member profile not in the caller's branch", body = ErrorBody),
    ),
    tag = "member assets"
)]
pub(crate) async fn list_by_member_profile(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<MemberAssetResponse>>, AppError> {
    let member_profile_id = extract_path(path)?;
    let scope = principal.branch_scope()?;
    state.member_profiles.get_scoped(member_profile_id, &scope)?;

    let assets = state
        .member_assets
        .find(|a| a.member_profile_id == member_profile_id && a.scope() == scope);
    Ok(Json(state.member_assets.to_models(&assets)))
}
