//! Fund types (share capital, savings, ...) under `/api/v1/funds`.

use axum::Router;
use coop_core::model::Funds;
use coop_core::{BranchScope, Stamps, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::Validate;
use crate::manager::{Entity, Manager};
use crate::routes::crud::{scoped_routes, RecordMeta, ScopedEntity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FundsRequest {
    #[serde(rename = "type")]
    pub fund_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub gl_books: String,
}

impl Validate for FundsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("type", &self.fund_type, 1, 255)?;
        ValidationError::check_length("gl_books", &self.gl_books, 0, 255)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FundsResponse {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(rename = "type")]
    pub fund_type: String,
    pub description: String,
    pub icon: String,
    pub account_id: Option<Uuid>,
    pub gl_books: String,
}

impl Entity for Funds {
    type Response = FundsResponse;
    const MODULE: &'static str = "Funds";

    fn to_model(&self) -> FundsResponse {
        FundsResponse {
            meta: RecordMeta::of(self),
            fund_type: self.fund_type.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            account_id: self.account_id,
            gl_books: self.gl_books.clone(),
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.funds
    }
}

impl ScopedEntity for Funds {
    type Request = FundsRequest;
    const PATH: &'static str = "funds";

    fn from_request(request: FundsRequest, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self {
        Self {
            id,
            scope,
            stamps,
            account_id: request.account_id,
            fund_type: request.fund_type,
            description: request.description,
            icon: request.icon,
            gl_books: request.gl_books,
        }
    }

    fn apply(&mut self, request: FundsRequest) {
        self.account_id = request.account_id;
        self.fund_type = request.fund_type;
        self.description = request.description;
        self.icon = request.icon;
        self.gl_books = request.gl_books;
    }

    fn display_name(&self) -> String {
        self.fund_type.clone()
    }
}

scoped_routes! {
    entity = Funds,
    request = FundsRequest,
    response = FundsResponse,
    tag = "funds",
    base = "/api/v1/funds",
    search = "/api/v1/funds/search",
    item = "/api/v1/funds/{id}",
    bulk = "/api/v1/funds/bulk-delete",
}

pub fn router() -> Router<AppState> {
    crud_router()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_is_required() {
        let req: FundsRequest = serde_json::from_str(r#"{"type":""}"#).unwrap();
        assert_eq!(req.validate(), Err(ValidationError::Required { field: "type" }));
    }

    #[test]
    fn missing_type_fails_to_deserialize() {
        assert!(serde_json::from_str::<FundsRequest>(r#"{"description":"x"}"#).is_err());
    }
}
