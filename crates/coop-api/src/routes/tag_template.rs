//! # Tag Templates
//!
//! Reusable labels (name, color, icon, category) that can be attached to
//! transactions and accounts. Served under `/api/v1/tag-template`.

use axum::Router;
use coop_core::model::{TagCategory, TagTemplate};
use coop_core::{BranchScope, Stamps, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::Validate;
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TagTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// One of the fixed categories, e.g. `"transaction type"`.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub category: Option<TagCategory>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

impl Validate for TagTemplateRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("name", &self.name, 1, 50)?;
        ValidationError::check_length("color", &self.color, 0, 50)?;
        ValidationError::check_length("icon", &self.icon, 0, 255)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagTemplateResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub description: String,
    #[schema(value_type = Option<String>)]
    pub category: Option<TagCategory>,
    pub color: String,
    pub icon: String,
}

impl Entity for TagTemplate {
    type Response = TagTemplateResponse;
    const MODULE: &'static str = "TagTemplate";

    fn to_model(&self) -> TagTemplateResponse {
        TagTemplateResponse {
            meta: RecordMeta::of(self),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category,
            color: self.color.clone(),
            icon: self.icon.clone(),
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.tag_templates
    }
}

impl ScopedEntity for TagTemplate {
    type Request = TagTemplateRequest;
    const PATH: &'static str = "tag-template";

    fn from_request(request: TagTemplateRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        Self {
            id,
            scope,
            stamps,
            name: request.name,
            description: request.description,
            category: request.category,
            color: request.color,
            icon: request.icon,
        }
    }

    fn apply(&mut self, request: TagTemplateRequest) {
        self.name = request.name;
        self.description = request.description;
        self.category = request.category;
        self.color = request.color;
        self.icon = request.icon;
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

scoped_routes! {
    entity = TagTemplate,
    request = TagTemplateRequest,
    response = TagTemplateResponse,
    tag = "tag templates",
    base = "/api/v1/tag-template",
    search = "/api/v1/tag-template/search",
    item = "/api/v1/tag-template/{id}",
    bulk = "/api/v1/tag-template/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router()
}
