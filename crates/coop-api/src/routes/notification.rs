//! # Notifications
//!
//! Messages addressed to one user. Notifications are scoped by recipient,
//! not by branch: every route needs an authenticated identity and only ever
//! sees the caller's own notifications.
//!
//! ## Endpoints
//!
//! - `GET    /api/v1/notification/me`                Caller's notifications, newest first
//! - `GET    /api/v1/notification/me/unviewed-count` Number not yet viewed
//! - `GET    /api/v1/notification/{id}`              One notification
//! - `PUT    /api/v1/notification/view`              Mark the given ids viewed
//! - `PUT    /api/v1/notification/view-all`          Mark every unviewed one viewed
//! - `DELETE /api/v1/notification/{id}`              Delete one
//! - `DELETE /api/v1/notification/bulk-delete`       Delete many
//!
//! Both mark-viewed routes are one unit of work: every targeted notification
//! is checked before any changes, and a storage failure puts them all back.
//! Notifications that were already viewed are left untouched.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use coop_core::model::{Notification, NotificationType};
use coop_core::Operation;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_json, extract_path, IdsRequest};
use crate::manager::{Entity, Manager};
use crate::state::AppState;

const MODULE: &str = "Notification";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    /// `info`, `success`, `warning`, `error` or `alert`.
    #[schema(value_type = String)]
    pub notification_type: NotificationType,
    pub is_viewed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnviewedCountResponse {
    pub count: usize,
}

impl Entity for Notification {
    type Response = NotificationResponse;
    const MODULE: &'static str = MODULE;

    fn to_model(&self) -> NotificationResponse {
        NotificationResponse {
            id: self.id,
            user_id: self.user_id.into_uuid(),
            title: self.title.clone(),
            description: self.description.clone(),
            notification_type: self.notification_type,
            is_viewed: self.is_viewed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn manager(state: &AppState) -> &Manager<Self> {
        &state.notifications
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/notification/me", get(list_mine))
        .route("/api/v1/notification/me/unviewed-count", get(unviewed_count))
        .route("/api/v1/notification/view", put(view))
        .route("/api/v1/notification/view-all", put(view_all))
        .route("/api/v1/notification/bulk-delete", delete(bulk_delete))
        .route(
            "/api/v1/notification/{id}",
            get(get_notification).delete(delete_notification),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/notification/me
#[utoipa::path(
    get,
    path = "/api/v1/notification/me",
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = Vec<NotificationResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn list_mine(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let identity = principal.identity()?;
    let mine = state.notifications.find(|n| n.belongs_to(identity.user_id));
    Ok(Json(state.notifications.to_models(&mine)))
}

/// GET /api/v1/notification/me/unviewed-count
#[utoipa::path(
    get,
    path = "/api/v1/notification/me/unviewed-count",
    responses(
        (status = 200, description = "Number of unviewed notifications", body = UnviewedCountResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn unviewed_count(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<UnviewedCountResponse>, AppError> {
    let identity = principal.identity()?;
    let count = state
        .notifications
        .find(|n| n.belongs_to(identity.user_id) && !n.is_viewed)
        .len();
    Ok(Json(UnviewedCountResponse { count }))
}

/// GET /api/v1/notification/{id}
#[utoipa::path(
    get,
    path = "/api/v1/notification/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification", body = NotificationResponse),
        (status = 404, description = "Not found or addressed to someone else", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn get_notification(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<NotificationResponse>, AppError> {
    let id = extract_path(path)?;
    let identity = principal.identity()?;
    let notification = state.notifications.get_by_id(id)?;
    if !notification.belongs_to(identity.user_id) {
        return Err(AppError::NotFound(format!("notification {id} not found")));
    }
    Ok(Json(notification.to_model()))
}

/// PUT /api/v1/notification/view
#[utoipa::path(
    put,
    path = "/api/v1/notification/view",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Targeted notifications after the change", body = Vec<NotificationResponse>),
        (status = 400, description = "Empty or duplicated ids", body = ErrorBody),
        (status = 404, description = "An id is unknown; nothing changed", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn view(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<IdsRequest>, JsonRejection>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let manager = &state.notifications;
    let outcome: Result<Vec<Notification>, AppError> = async {
        let request = extract_json(body)?;
        manager.validate(&request)?;
        let identity = principal.identity()?;
        let now = Utc::now();
        manager
            .apply_batch(&request.ids, |n| n.belongs_to(identity.user_id), |n| n.mark_viewed(now))
            .await
    }
    .await;

    let notifications = state
        .footsteps
        .conclude(&principal, MODULE, Operation::Update, outcome, |all| {
            format!("Marked {} notification(s) as viewed", all.len())
        })?;
    Ok(Json(manager.to_models(&notifications)))
}

/// PUT /api/v1/notification/view-all
#[utoipa::path(
    put,
    path = "/api/v1/notification/view-all",
    responses(
        (status = 200, description = "Caller's notifications after the change", body = Vec<NotificationResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn view_all(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let manager = &state.notifications;
    let outcome: Result<(usize, Vec<Notification>), AppError> = async {
        let identity = principal.identity()?;
        let now = Utc::now();
        let mut marked = 0;
        let mut mine = manager
            .apply_where(
                |n| n.belongs_to(identity.user_id),
                |n| {
                    let changed = n.mark_viewed(now);
                    marked += usize::from(changed);
                    changed
                },
            )
            .await?;
        mine.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok((marked, mine))
    }
    .await;

    let (_, mine) = state
        .footsteps
        .conclude(&principal, MODULE, Operation::Update, outcome, |(marked, _)| {
            format!("Marked all notifications as viewed ({marked} updated)")
        })?;
    Ok(Json(manager.to_models(&mine)))
}

/// DELETE /api/v1/notification/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/notification/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or addressed to someone else", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn delete_notification(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let outcome: Result<Notification, AppError> = async {
        let id = extract_path(path)?;
        let identity = principal.identity()?;
        state
            .notifications
            .delete(id, |n| n.belongs_to(identity.user_id), Some(identity.user_id))
            .await
    }
    .await;

    state
        .footsteps
        .conclude(&principal, MODULE, Operation::Delete, outcome, |n| {
            format!("Deleted notification: {}", n.title)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/notification/bulk-delete
#[utoipa::path(
    delete,
    path = "/api/v1/notification/bulk-delete",
    request_body = IdsRequest,
    responses(
        (status = 204, description = "All deleted"),
        (status = 400, description = "Empty or duplicated ids", body = ErrorBody),
        (status = 404, description = "An id is unknown; nothing deleted", body = ErrorBody),
    ),
    tag = "notifications"
)]
pub(crate) async fn bulk_delete(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<IdsRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let manager = &state.notifications;
    let outcome: Result<Vec<Notification>, AppError> = async {
        let request = extract_json(body)?;
        manager.validate(&request)?;
        let identity = principal.identity()?;
        manager
            .bulk_delete(&request.ids, |n| n.belongs_to(identity.user_id), Some(identity.user_id))
            .await
    }
    .await;

    state
        .footsteps
        .conclude(&principal, MODULE, Operation::BulkDelete, outcome, |deleted| {
            format!("Bulk deleted {} notification(s)", deleted.len())
        })?;
    Ok(StatusCode::NO_CONTENT)
}
