//! # Users & Profile Settings
//!
//! ## Endpoints
//!
//! - `GET /api/v1/user/{id}`                 A user of the caller's organization
//! - `GET /api/v1/profile`                   The caller
//! - `PUT /api/v1/profile`                   Names and birthdate
//! - `PUT /api/v1/profile/password`          Change password (old password required)
//! - `PUT /api/v1/profile/profile-picture`   Change profile picture
//! - `PUT /api/v1/profile/general`           User name, email, contact number, description
//!
//! Every profile mutation is recorded under module `User` and refreshes the
//! caller's entry in [`UserSessions`](crate::auth::UserSessions), so
//! `GET /api/v1/profile` never serves a stale copy. The password hash never
//! appears in a response.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use coop_core::model::User;
use coop_core::{CredentialError, IdentityContext, MediaId, Operation, PasswordHash, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_json, extract_path, Validate};
use crate::manager::{Entity, Manager};
use crate::state::AppState;

const MODULE: &str = "User";

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub user_name: String,
    pub email: String,
    pub contact_number: String,
    pub description: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub full_name: String,
    pub birthdate: Option<NaiveDate>,
    pub media_id: Option<Uuid>,
    pub is_email_verified: bool,
    pub is_contact_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileRequest {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
}

impl Validate for ProfileRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("first_name", &self.first_name, 1, 255)?;
        ValidationError::check_required("last_name", &self.last_name, 1, 255)?;
        ValidationError::check_optional("middle_name", self.middle_name.as_deref(), 255)?;
        ValidationError::check_optional("suffix", self.suffix.as_deref(), 50)
    }
}

/// Custom `Debug` keeps passwords out of logs.
#[derive(Clone, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordRequest").finish_non_exhaustive()
    }
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_length("old_password", &self.old_password, 8, 255)?;
        ValidationError::check_length("new_password", &self.new_password, 8, 255)?;
        ValidationError::check_length("confirm_password", &self.confirm_password, 8, 255)?;
        if self.new_password != self.confirm_password {
            return Err(ValidationError::Mismatch {
                field: "confirm_password",
                other: "new_password",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfilePictureRequest {
    pub media_id: Uuid,
}

impl Validate for ProfilePictureRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeneralSettingsRequest {
    pub user_name: String,
    pub email: String,
    pub contact_number: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for GeneralSettingsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_required("user_name", &self.user_name, 3, 100)?;
        ValidationError::check_required("email", &self.email, 3, 255)?;
        ValidationError::check_email("email", &self.email)?;
        ValidationError::check_required("contact_number", &self.contact_number, 7, 20)?;
        ValidationError::check_length("description", &self.description, 0, 2000)
    }
}

impl Entity for User {
    type Response = UserResponse;
    const MODULE: &'static str = MODULE;

    fn to_model(&self) -> UserResponse {
        UserResponse {
            id: self.id.into_uuid(),
            organization_id: self.organization_id.into_uuid(),
            branch_id: self.branch_id.map(Into::into),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            contact_number: self.contact_number.clone(),
            description: self.description.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            suffix: self.suffix.clone(),
            full_name: self.full_name.clone(),
            birthdate: self.birthdate,
            media_id: self.media_id.map(MediaId::into_uuid),
            is_email_verified: self.is_email_verified,
            is_contact_verified: self.is_contact_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.users
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/user/{id}", get(get_user))
        .route("/api/v1/profile", get(get_profile).put(update_profile))
        .route("/api/v1/profile/password", put(change_password))
        .route("/api/v1/profile/profile-picture", put(change_profile_picture))
        .route("/api/v1/profile/general", put(update_general))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The caller's own user record. A token naming a user that no longer
/// exists is treated as unauthenticated.
fn current_user(state: &AppState, identity: &IdentityContext) -> Result<User, AppError> {
    if let Some(user) = state.sessions.get(identity.user_id) {
        return Ok(user);
    }
    let user = state
        .users
        .get_by_id(identity.user_id.into_uuid())
        .map_err(|_| AppError::Unauthenticated(format!("user {} does not exist", identity.user_id)))?;
    state.sessions.set(user.clone());
    Ok(user)
}

/// Apply `change` to the caller's record, then refresh the session copy.
async fn modify_current_user(
    state: &AppState,
    identity: &IdentityContext,
    change: impl FnOnce(&mut User) -> Result<(), AppError>,
) -> Result<User, AppError> {
    let organization_id = identity.organization_id;
    let updated = state
        .users
        .modify(
            identity.user_id.into_uuid(),
            |u| u.organization_id == organization_id,
            |user| {
                change(user)?;
                user.updated_at = Utc::now();
                Ok(())
            },
        )
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => {
                AppError::Unauthenticated(format!("user {} does not exist", identity.user_id))
            }
            other => other,
        })?;
    state.sessions.set(updated.clone());
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/user/{id}
#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "Not found in the caller's organization", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let id = extract_path(path)?;
    let identity = principal.identity()?;
    let user = state.users.get_by_id(id)?;
    if user.organization_id != identity.organization_id {
        return Err(AppError::NotFound(format!("user {id} not found")));
    }
    Ok(Json(user.to_model()))
}

/// GET /api/v1/profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "The caller", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn get_profile(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<UserResponse>, AppError> {
    let identity = principal.identity()?;
    Ok(Json(current_user(&state, &identity)?.to_model()))
}

/// PUT /api/v1/profile
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid names", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let outcome: Result<User, AppError> = async {
        let request = extract_json(body)?;
        let identity = principal.identity()?;
        state.users.validate(&request)?;
        modify_current_user(&state, &identity, |user| {
            user.first_name = request.first_name;
            user.middle_name = request.middle_name;
            user.last_name = request.last_name;
            user.suffix = request.suffix;
            user.birthdate = request.birthdate;
            user.refresh_full_name();
            Ok(())
        })
        .await
    }
    .await;

    let user = state
        .footsteps
        .conclude(&principal, MODULE, Operation::Update, outcome, |u| {
            format!("Updated profile: {}", u.full_name)
        })?;
    Ok(Json(user.to_model()))
}

/// PUT /api/v1/profile/password
#[utoipa::path(
    put,
    path = "/api/v1/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = UserResponse),
        (status = 400, description = "Too short or confirmation mismatch", body = ErrorBody),
        (status = 401, description = "Old password is wrong", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let outcome: Result<User, AppError> = async {
        let request = extract_json(body)?;
        let identity = principal.identity()?;
        state.users.validate(&request)?;

        let current = state
            .users
            .get_by_id(identity.user_id.into_uuid())
            .map_err(|_| AppError::Unauthenticated(format!("user {} does not exist", identity.user_id)))?;

        // Key derivation is CPU-bound; run it on the blocking pool and outside the store lock.
        let ChangePasswordRequest {
            old_password,
            new_password,
            ..
        } = request;
        let stored = current.password.clone();
        let replacement = tokio::task::spawn_blocking(move || {
            let matches = stored.verify(&old_password)?;
            Ok::<_, CredentialError>(matches.then(|| PasswordHash::generate(&new_password)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| {
            AppError::Internal(format!("stored password hash for {} is unusable: {e}", identity.user_id))
        })?;
        let Some(replacement) = replacement else {
            return Err(AppError::Unauthenticated("Invalid credentials".into()));
        };

        let expected = current.password;
        modify_current_user(&state, &identity, move |user| {
            if user.password != expected {
                return Err(AppError::Conflict("password was changed concurrently".into()));
            }
            user.password = replacement;
            Ok(())
        })
        .await
    }
    .await;

    let user = state
        .footsteps
        .conclude(&principal, MODULE, Operation::Update, outcome, |u| {
            format!("Changed password: {}", u.user_name)
        })?;
    Ok(Json(user.to_model()))
}

/// PUT /api/v1/profile/profile-picture
#[utoipa::path(
    put,
    path = "/api/v1/profile/profile-picture",
    request_body = ProfilePictureRequest,
    responses(
        (status = 200, description = "Picture changed", body = UserResponse),
        (status = 400, description = "Same picture as the current one", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn change_profile_picture(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<ProfilePictureRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let outcome: Result<User, AppError> = async {
        let request = extract_json(body)?;
        let identity = principal.identity()?;
        state.users.validate(&request)?;
        let media_id = MediaId::from_uuid(request.media_id);
        modify_current_user(&state, &identity, |user| {
            if user.media_id == Some(media_id) {
                return Err(ValidationError::Unchanged { field: "media_id" }.into());
            }
            user.media_id = Some(media_id);
            Ok(())
        })
        .await
    }
    .await;

    let user = state
        .footsteps
        .conclude(&principal, MODULE, Operation::Update, outcome, |u| {
            format!("Changed profile picture: {}", u.user_name)
        })?;
    Ok(Json(user.to_model()))
}

/// PUT /api/v1/profile/general
#[utoipa::path(
    put,
    path = "/api/v1/profile/general",
    request_body = GeneralSettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = UserResponse),
        (status = 400, description = "Invalid field", body = ErrorBody),
        (status = 409, description = "User name or email taken", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn update_general(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<GeneralSettingsRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let outcome: Result<User, AppError> = async {
        let request = extract_json(body)?;
        let identity = principal.identity()?;
        state.users.validate(&request)?;

        let taken = state.users.find(|u| {
            u.id != identity.user_id
                && (u.user_name.eq_ignore_ascii_case(&request.user_name)
                    || u.email.eq_ignore_ascii_case(&request.email))
        });
        if let Some(other) = taken.first() {
            let field = if other.user_name.eq_ignore_ascii_case(&request.user_name) {
                "user_name"
            } else {
                "email"
            };
            return Err(AppError::Conflict(format!("{field} is already in use")));
        }

        modify_current_user(&state, &identity, |user| {
            user.user_name = request.user_name;
            user.set_email(request.email);
            user.set_contact_number(request.contact_number);
            user.description = request.description;
            Ok(())
        })
        .await
    }
    .await;

    let user = state
        .footsteps
        .conclude(&principal, MODULE, Operation::Update, outcome, |u| {
            format!("Updated general settings: {}", u.user_name)
        })?;
    Ok(Json(user.to_model()))
}
