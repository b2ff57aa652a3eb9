//! Collateral kinds accepted against loans, under `/api/v1/collateral`.

use axum::Router;
use coop_core::model::Collateral;
use coop_core::{BranchScope, Stamps, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::Validate;
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CollateralRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

impl Validate for CollateralRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("name", &self.name, 1, 255)?;
        ValidationError::check_length("icon", &self.icon, 0, 255)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollateralResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl Entity for Collateral {
    type Response = CollateralResponse;
    const MODULE: &'static str = "Collateral";

    fn to_model(&self) -> CollateralResponse {
        CollateralResponse {
            meta: RecordMeta::of(self),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.collaterals
    }
}

impl ScopedEntity for Collateral {
    type Request = CollateralRequest;
    const PATH: &'static str = "collateral";

    fn from_request(request: CollateralRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        Self {
            id,
            scope,
            stamps,
            name: request.name,
            description: request.description,
            icon: request.icon,
        }
    }

    fn apply(&mut self, request: CollateralRequest) {
        self.name = request.name;
        self.description = request.description;
        self.icon = request.icon;
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

scoped_routes! {
    entity = Collateral,
    request = CollateralRequest,
    response = CollateralResponse,
    tag = "collateral",
    base = "/api/v1/collateral",
    search = "/api/v1/collateral/search",
    item = "/api/v1/collateral/{id}",
    bulk = "/api/v1/collateral/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router()
}
