//! # Custom Extractors & Validation
//!
//! The [`Validate`] trait for request DTOs, helpers that turn axum
//! rejections into [`AppError`], and the shared `{"ids": [...]}` body used by
//! bulk operations.

use std::collections::HashSet;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use coop_core::ValidationError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Request types that check business rules beyond what serde enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// A set of record ids for bulk operations. Must be non-empty and unique.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdsRequest {
    pub ids: Vec<Uuid>,
}

impl Validate for IdsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.ids.is_empty() {
            return Err(ValidationError::Empty { field: "ids" });
        }
        let mut seen = HashSet::with_capacity(self.ids.len());
        for id in &self.ids {
            if !seen.insert(id) {
                return Err(ValidationError::Duplicate {
                    field: "ids",
                    id: id.to_string(),
                });
            }
        }
        Ok(())
    }
}
