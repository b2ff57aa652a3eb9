//! # Member Type History
//!
//! Read-only log of member type assignments. Entries are written by the
//! member profile routes whenever a profile gets a new member type.
//!
//! - `GET /api/v1/member-type-history`: every entry of the caller's branch
//! - `GET /api/v1/member-type-history/member-profile/{member_profile_id}/search`:
//!   paginated entries of one member

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use coop_core::model::MemberTypeHistory;
use coop_core::{BranchScoped, Page, PageQuery};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_path, extract_query};
use crate::manager::{Entity, Manager};
use crate::routes::crud::RecordMeta;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberTypeHistoryResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub member_profile_id: Uuid,
    pub member_type_id: Uuid,
}

impl Entity for MemberTypeHistory {
    type Response = MemberTypeHistoryResponse;
    const MODULE: &'static str = "MemberTypeHistory";

    fn to_model(&self) -> MemberTypeHistoryResponse {
        MemberTypeHistoryResponse {
            meta: RecordMeta::of(self),
            member_profile_id: self.member_profile_id,
            member_type_id: self.member_type_id,
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.member_type_histories
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/member-type-history", get(list_history))
        .route(
            "/api/v1/member-type-history/member-profile/{member_profile_id}/search",
            get(search_by_member_profile),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/member-type-history",
    responses(
        (status = 200, description = "History of the caller's branch, newest first", body = Vec<MemberTypeHistoryResponse>),
        (status = 400, description = "Caller has no branch", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    tag = "member types"
)]
pub(crate) async fn list_history(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<MemberTypeHistoryResponse>>, AppError> {
    let scope = principal.branch_scope()?;
    let manager = &state.member_type_histories;
    Ok(Json(manager.to_models(&manager.list_scoped(&scope))))
}

#[utoipa::path(
    get,
    path = "/api/v1/member-type-history/member-profile/{member_profile_id}/search",
    params(
        ("member_profile_id" = Uuid, Path, description = "Member profile id"),
        ("pageIndex" = Option<usize>, Query, description = "Zero-based page index"),
        ("pageSize" = Option<usize>, Query, description = "Records per page, 1..=1000"),
        ("sort" = Option<String>, Query, description = "e.g. `created_at:desc`"),
    ),
    responses(
        (status = 200, description = "Page envelope of history entries", body = serde_json::Value),
        (status = 404, description = "Member profile not in the caller's branch", body = ErrorBody),
    ),
    tag = "member types"
)]
pub(crate) async fn search_by_member_profile(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<MemberTypeHistoryResponse>>, AppError> {
    let member_profile_id = extract_path(path)?;
    let request = extract_query(query)?.into_request()?;
    let scope = principal.branch_scope()?;
    state.member_profiles.get_scoped(member_profile_id, &scope)?;

    let page = state.member_type_histories.normal_pagination(&request, |h| {
        h.member_profile_id == member_profile_id && h.scope() == scope
    })?;
    Ok(Json(page))
}
