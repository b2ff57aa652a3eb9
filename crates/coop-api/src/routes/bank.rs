//! # Banks
//!
//! Banks the cooperative deposits with or receives checks from.
//! Served by the generic CRUD handlers under `/api/v1/bank`.

use axum::Router;
use coop_core::model::Bank;
use coop_core::{BranchScope, MediaId, Stamps, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::Validate;
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BankRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media_id: Option<Uuid>,
}

impl Validate for BankRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("name", &self.name, 1, 255)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BankResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub description: String,
    pub media_id: Option<Uuid>,
}

impl Entity for Bank {
    type Response = BankResponse;
    const MODULE: &'static str = "Bank";

    fn to_model(&self) -> BankResponse {
        BankResponse {
            meta: RecordMeta::of(self),
            name: self.name.clone(),
            description: self.description.clone(),
            media_id: self.media_id.map(MediaId::into_uuid),
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.banks
    }
}

impl ScopedEntity for Bank {
    type Request = BankRequest;
    const PATH: &'static str = "bank";

    fn from_request(request: BankRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        Self {
            id,
            scope,
            stamps,
            name: request.name,
            description: request.description,
            media_id: request.media_id.map(MediaId::from_uuid),
        }
    }

    fn apply(&mut self, request: BankRequest) {
        self.name = request.name;
        self.description = request.description;
        self.media_id = request.media_id.map(MediaId::from_uuid);
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

scoped_routes! {
    entity = Bank,
    request = BankRequest,
    response = BankResponse,
    tag = "banks",
    base = "/api/v1/bank",
    search = "/api/v1/bank/search",
    item = "/api/v1/bank/{id}",
    bulk = "/api/v1/bank/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router()
}
