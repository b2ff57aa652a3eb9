//! # Generic Branch-Scoped CRUD
//!
//! One set of handlers serves every branch-scoped entity. An entity opts in
//! by implementing [`ScopedEntity`] and invoking [`scoped_routes!`], which
//! generates the documented per-entity handlers and `crud_router()`:
//!
//! | Method | Path                         | Success |
//! |--------|------------------------------|---------|
//! | GET    | `/api/v1/{path}`             | 200     |
//! | GET    | `/api/v1/{path}/search`      | 200     |
//! | GET    | `/api/v1/{path}/{id}`        | 200     |
//! | POST   | `/api/v1/{path}`             | 201     |
//! | PUT    | `/api/v1/{path}/{id}`        | 200     |
//! | DELETE | `/api/v1/{path}/{id}`        | 204     |
//! | DELETE | `/api/v1/{path}/bulk-delete` | 204     |
//!
//! Mutating handlers run their steps inside one async block and pass the
//! outcome to [`Footsteps::conclude`](crate::footstep::Footsteps::conclude),
//! so every path out of the handler (bad body, no token, no branch, invalid
//! payload, missing record, storage failure, success) records exactly one
//! footstep. Reads never record one.

use std::future::Future;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use coop_core::{BranchScope, BranchScoped, Operation, Page, PageQuery, Stamps, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query, IdsRequest, Validate};
use crate::manager::Entity;
use crate::state::AppState;

/// A branch-scoped entity exposed through the generic CRUD routes.
pub trait ScopedEntity: Entity + BranchScoped {
    type Request: DeserializeOwned + Validate + Send + 'static;

    /// Route segment under `/api/v1/`.
    const PATH: &'static str;

    fn from_request(request: Self::Request, id: Uuid, scope: BranchScope, stamps: Stamps) -> Self;

    /// Replace the client-editable fields with those of `request`.
    fn apply(&mut self, request: Self::Request);

    /// Human-readable label used in footstep descriptions.
    fn display_name(&self) -> String;

    /// Check that ids referenced by `request` exist in `scope`.
    fn check_references(
        _request: &Self::Request,
        _state: &AppState,
        _scope: &BranchScope,
    ) -> Result<(), AppError> {
        Ok(())
    }

    /// Dependent writes after `after` was saved. `before` is `None` on create.
    fn after_write(
        _state: &AppState,
        _before: Option<&Self>,
        _after: &Self,
        _actor: UserId,
    ) -> impl Future<Output = Result<(), AppError>> + Send {
        async { Ok::<(), AppError>(()) }
    }
}

/// Identity and audit stamps shared by every branch-scoped response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordMeta {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub created_at: chrono::DateTime<Utc>,
    pub created_by_id: Uuid,
    pub updated_at: chrono::DateTime<Utc>,
    pub updated_by_id: Uuid,
}

impl RecordMeta {
    pub fn of<E: BranchScoped>(record: &E) -> Self {
        let scope = record.scope();
        let stamps = record.stamps();
        Self {
            id: record.id(),
            organization_id: scope.organization_id.into_uuid(),
            branch_id: scope.branch_id.into_uuid(),
            created_at: stamps.created_at,
            created_by_id: stamps.created_by_id.into_uuid(),
            updated_at: stamps.updated_at,
            updated_by_id: stamps.updated_by_id.into_uuid(),
        }
    }
}

/// Generate the shared CRUD routes of one entity.
///
/// Expands to one `#[utoipa::path]` handler per route delegating to the
/// generic handlers below, a `CrudApi` document listing them, and
/// `crud_router()` mounting them. utoipa needs literal paths, so every route
/// path is spelled out by the caller.
macro_rules! scoped_routes {
    (
        entity = $entity:ident,
        request = $request:ident,
        response = $response:ident,
        tag = $tag:tt,
        base = $base:tt,
        search = $search:tt,
        item = $item:tt,
        bulk = $bulk:tt $(,)?
    ) => {
        /// OpenAPI paths of the shared CRUD routes.
        #[derive(utoipa::OpenApi)]
        #[openapi(paths(list, search, get_one, create, update, delete_one, bulk_delete))]
        pub struct CrudApi;

        pub fn crud_router() -> axum::Router<crate::state::AppState> {
            axum::Router::new()
                .route($base, axum::routing::get(list).post(create))
                .route($search, axum::routing::get(search))
                .route($bulk, axum::routing::delete(bulk_delete))
                .route($item, axum::routing::get(get_one).put(update).delete(delete_one))
        }

        #[utoipa::path(
            get,
            path = $base,
            responses(
                (status = 200, description = "Live records of the caller's branch, newest first", body = Vec<$response>),
                (status = 400, description = "Caller has no branch", body = crate::error::ErrorBody),
                (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn list(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
        ) -> Result<axum::Json<Vec<$response>>, crate::error::AppError> {
            crate::routes::crud::list::<$entity>(state, principal).await
        }

        #[utoipa::path(
            get,
            path = $search,
            params(
                ("pageIndex" = Option<usize>, Query, description = "Zero-based page index"),
                ("pageSize" = Option<usize>, Query, description = "Records per page, 1..=1000"),
                ("sort" = Option<String>, Query, description = "e.g. `name:asc,created_at:desc`"),
                ("search" = Option<String>, Query, description = "Case-insensitive substring over text fields"),
            ),
            responses(
                (status = 200, description = "Page envelope: data, pageIndex, totalPage, pageSize, totalSize, sort", body = serde_json::Value),
                (status = 400, description = "Bad paging parameters or no branch", body = crate::error::ErrorBody),
                (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn search(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
            query: Result<
                axum::extract::Query<coop_core::PageQuery>,
                axum::extract::rejection::QueryRejection,
            >,
        ) -> Result<axum::Json<coop_core::Page<$response>>, crate::error::AppError> {
            crate::routes::crud::search::<$entity>(state, principal, query).await
        }

        #[utoipa::path(
            get,
            path = $item,
            params(("id" = uuid::Uuid, Path, description = "Record id")),
            responses(
                (status = 200, description = "The record", body = $response),
                (status = 404, description = "Not found in the caller's branch", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn get_one(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
            path: Result<axum::extract::Path<uuid::Uuid>, axum::extract::rejection::PathRejection>,
        ) -> Result<axum::Json<$response>, crate::error::AppError> {
            crate::routes::crud::get_one::<$entity>(state, principal, path).await
        }

        #[utoipa::path(
            post,
            path = $base,
            request_body = $request,
            responses(
                (status = 201, description = "Created", body = $response),
                (status = 400, description = "Invalid payload, unknown reference or no branch", body = crate::error::ErrorBody),
                (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn create(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
            body: Result<axum::Json<$request>, axum::extract::rejection::JsonRejection>,
        ) -> Result<(axum::http::StatusCode, axum::Json<$response>), crate::error::AppError> {
            crate::routes::crud::create::<$entity>(state, principal, body).await
        }

        #[utoipa::path(
            put,
            path = $item,
            params(("id" = uuid::Uuid, Path, description = "Record id")),
            request_body = $request,
            responses(
                (status = 200, description = "Updated", body = $response),
                (status = 400, description = "Invalid payload, unknown reference or no branch", body = crate::error::ErrorBody),
                (status = 404, description = "Not found in the caller's branch", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn update(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
            path: Result<axum::extract::Path<uuid::Uuid>, axum::extract::rejection::PathRejection>,
            body: Result<axum::Json<$request>, axum::extract::rejection::JsonRejection>,
        ) -> Result<axum::Json<$response>, crate::error::AppError> {
            crate::routes::crud::update::<$entity>(state, principal, path, body).await
        }

        #[utoipa::path(
            delete,
            path = $item,
            params(("id" = uuid::Uuid, Path, description = "Record id")),
            responses(
                (status = 204, description = "Deleted"),
                (status = 404, description = "Not found in the caller's branch", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn delete_one(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
            path: Result<axum::extract::Path<uuid::Uuid>, axum::extract::rejection::PathRejection>,
        ) -> Result<axum::http::StatusCode, crate::error::AppError> {
            crate::routes::crud::delete_one::<$entity>(state, principal, path).await
        }

        #[utoipa::path(
            delete,
            path = $bulk,
            request_body = crate::extractors::IdsRequest,
            responses(
                (status = 204, description = "Every id deleted"),
                (status = 400, description = "Empty or duplicated ids", body = crate::error::ErrorBody),
                (status = 404, description = "Some id is not in the caller's branch; nothing deleted", body = crate::error::ErrorBody),
            ),
            tag = $tag
        )]
        pub(crate) async fn bulk_delete(
            state: axum::extract::State<crate::state::AppState>,
            principal: crate::auth::Principal,
            body: Result<axum::Json<crate::extractors::IdsRequest>, axum::extract::rejection::JsonRejection>,
        ) -> Result<axum::http::StatusCode, crate::error::AppError> {
            crate::routes::crud::bulk_delete::<$entity>(state, principal, body).await
        }
    };
}

pub(crate) use scoped_routes;

fn endpoint<E: ScopedEntity>() -> String {
    format!("/api/v1/{}", E::PATH)
}

// -- Reads --------------------------------------------------------------------

pub(crate) async fn list<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<E::Response>>, AppError> {
    let scope = principal.branch_scope()?;
    let manager = E::manager(&state);
    Ok(Json(manager.to_models(&manager.list_scoped(&scope))))
}

pub(crate) async fn search<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<E::Response>>, AppError> {
    let request = extract_query(query)?.into_request()?;
    let scope = principal.branch_scope()?;
    let page = E::manager(&state).normal_pagination(&request, |r| r.scope() == scope)?;
    Ok(Json(page))
}

pub(crate) async fn get_one<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<E::Response>, AppError> {
    let id = extract_path(path)?;
    let scope = principal.branch_scope()?;
    let record = E::manager(&state).get_scoped(id, &scope)?;
    Ok(Json(record.to_model()))
}

// -- Mutations ----------------------------------------------------------------

pub(crate) async fn create<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<E::Request>, JsonRejection>,
) -> Result<(StatusCode, Json<E::Response>), AppError> {
    let manager = E::manager(&state);
    let outcome: Result<E, AppError> = async {
        let request = extract_json(body)?;
        let identity = principal.identity()?;
        let scope = principal.branch_scope()?;
        manager.validate(&request)?;
        E::check_references(&request, &state, &scope)?;

        let stamps = Stamps::created_by(identity.user_id, Utc::now());
        let record = manager
            .create(E::from_request(request, Uuid::new_v4(), scope, stamps))
            .await?;
        E::after_write(&state, None, &record, identity.user_id).await?;
        Ok(record)
    }
    .await;

    let record = state
        .footsteps
        .conclude(&principal, E::MODULE, Operation::Create, outcome, |r| {
            format!("Created {} ({}): {}", E::MODULE, endpoint::<E>(), r.display_name())
        })?;
    Ok((StatusCode::CREATED, Json(record.to_model())))
}

pub(crate) async fn update<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<E::Request>, JsonRejection>,
) -> Result<Json<E::Response>, AppError> {
    let manager = E::manager(&state);
    let outcome: Result<E, AppError> = async {
        let id = extract_path(path)?;
        let request = extract_json(body)?;
        let identity = principal.identity()?;
        let scope = principal.branch_scope()?;
        manager.validate(&request)?;
        E::check_references(&request, &state, &scope)?;

        let now = Utc::now();
        let mut before = None;
        let record = manager
            .modify(id, |r| r.visible_to(&scope), |record| {
                before = Some(record.clone());
                record.apply(request);
                record.stamps_mut().touch(identity.user_id, now);
                Ok(())
            })
            .await?;
        E::after_write(&state, before.as_ref(), &record, identity.user_id).await?;
        Ok(record)
    }
    .await;

    let record = state
        .footsteps
        .conclude(&principal, E::MODULE, Operation::Update, outcome, |r| {
            format!("Updated {} ({}): {}", E::MODULE, endpoint::<E>(), r.display_name())
        })?;
    Ok(Json(record.to_model()))
}

pub(crate) async fn delete_one<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let manager = E::manager(&state);
    let outcome: Result<E, AppError> = async {
        let id = extract_path(path)?;
        let identity = principal.identity()?;
        let scope = principal.branch_scope()?;
        manager
            .delete(id, |r| r.visible_to(&scope), Some(identity.user_id))
            .await
    }
    .await;

    state
        .footsteps
        .conclude(&principal, E::MODULE, Operation::Delete, outcome, |r| {
            format!("Deleted {} ({}): {}", E::MODULE, endpoint::<E>(), r.display_name())
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn bulk_delete<E: ScopedEntity>(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<IdsRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let manager = E::manager(&state);
    let outcome: Result<Vec<E>, AppError> = async {
        let request = extract_json(body)?;
        // An empty or duplicated id set is rejected before identity or storage.
        manager.validate(&request)?;
        let identity = principal.identity()?;
        let scope = principal.branch_scope()?;
        manager
            .bulk_delete(&request.ids, |r| r.visible_to(&scope), Some(identity.user_id))
            .await
    }
    .await;

    state
        .footsteps
        .conclude(&principal, E::MODULE, Operation::BulkDelete, outcome, |deleted| {
            let names: Vec<String> = deleted.iter().map(ScopedEntity::display_name).collect();
            format!(
                "Bulk deleted {} {} ({}): {}",
                deleted.len(),
                E::MODULE,
                endpoint::<E>(),
                names.join(", ")
            )
        })?;
    Ok(StatusCode::NO_CONTENT)
}
