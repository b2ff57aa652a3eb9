//! Member classifications (regular, associate, ...) under `/api/v1/member-type`.

use axum::Router;
use coop_core::model::MemberType;
use coop_core::{BranchScope, Stamps, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::Validate;
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberTypeRequest {
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for MemberTypeRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("name", &self.name, 1, 255)?;
        ValidationError::check_length("prefix", &self.prefix, 0, 50)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberTypeResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub prefix: String,
    pub description: String,
}

impl Entity for MemberType {
    type Response = MemberTypeResponse;
    const MODULE: &'static str = "MemberType";

    fn to_model(&self) -> MemberTypeResponse {
        MemberTypeResponse {
            meta: RecordMeta::of(self),
            name: self.name.clone(),
            prefix: self.prefix.clone(),
            description: self.description.clone(),
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.member_types
    }
}

impl ScopedEntity for MemberType {
    type Request = MemberTypeRequest;
    const PATH: &'static str = "member-type";

    fn from_request(request: MemberTypeRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        Self {
            id,
            scope,
            stamps,
            name: request.name,
            prefix: request.prefix,
            description: request.description,
        }
    }

    fn apply(&mut self, request: MemberTypeRequest) {
        self.name = request.name;
        self.prefix = request.prefix;
        self.description = request.description;
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

scoped_routes! {
    entity = MemberType,
    request = MemberTypeRequest,
    response = MemberTypeResponse,
    tag = "member types",
    base = "/api/v1/member-type",
    search = "/api/v1/member-type/search",
    item = "/api/v1/member-type/{id}",
    bulk = "/api/v1/member-type/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router()
}
