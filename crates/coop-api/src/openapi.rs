//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented handlers and DTO schemas into one
//! document served at `/openapi.json`. Each branch-scoped entity contributes
//! its own `CrudApi` document (generated alongside its routes), merged into
//! [`ApiDoc`] by [`document`].

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::routes;
use crate::state::AppState;

/// Adds the Bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Token `{user_id}:{organization_id}:{branch_id}:{secret}`; branch_id may be empty.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cooperative Backend API",
        version = "0.1.0",
        description = "Tenant-scoped records for cooperatives: banks, collateral, funds, member profiles and assets, member types, tag templates, notifications and user settings.\n\nEvery branch-scoped entity exposes `GET /api/v1/{entity}`, `GET /api/v1/{entity}/search`, `GET /api/v1/{entity}/{id}`, `POST /api/v1/{entity}`, `PUT /api/v1/{entity}/{id}`, `DELETE /api/v1/{entity}/{id}` and `DELETE /api/v1/{entity}/bulk-delete`.\n\nErrors are returned as `{\"error\": \"<message>\"}`."
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Branch-scoped extras ────────────────────────────────────────
        crate::routes::member_asset::list_by_member_profile,
        crate::routes::member_type_history::list_history,
        crate::routes::member_type_history::search_by_member_profile,
        // ── Notifications ───────────────────────────────────────────────
        crate::routes::notification::list_mine,
        crate::routes::notification::unviewed_count,
        crate::routes::notification::get_notification,
        crate::routes::notification::view,
        crate::routes::notification::view_all,
        crate::routes::notification::delete_notification,
        crate::routes::notification::bulk_delete,
        // ── Users & profile ─────────────────────────────────────────────
        crate::routes::user::get_user,
        crate::routes::user::get_profile,
        crate::routes::user::update_profile,
        crate::routes::user::change_password,
        crate::routes::user::change_profile_picture,
        crate::routes::user::update_general,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::extractors::IdsRequest,
            crate::routes::crud::RecordMeta,
            // ── Branch-scoped entities ──────────────────────────────────
            crate::routes::bank::BankRequest,
            crate::routes::bank::BankResponse,
            crate::routes::collateral::CollateralRequest,
            crate::routes::collateral::CollateralResponse,
            crate::routes::funds::FundsRequest,
            crate::routes::funds::FundsResponse,
            crate::routes::member_asset::MemberAssetRequest,
            crate::routes::member_asset::MemberAssetResponse,
            crate::routes::member_profile::MemberProfileRequest,
            crate::routes::member_profile::MemberProfileResponse,
            crate::routes::member_type::MemberTypeRequest,
            crate::routes::member_type::MemberTypeResponse,
            crate::routes::member_type_history::MemberTypeHistoryResponse,
            crate::routes::tag_template::TagTemplateRequest,
            crate::routes::tag_template::TagTemplateResponse,
            // ── Notifications & users ───────────────────────────────────
            crate::routes::notification::NotificationResponse,
            crate::routes::notification::UnviewedCountResponse,
            crate::routes::user::UserResponse,
            crate::routes::user::ProfileRequest,
            crate::routes::user::ChangePasswordRequest,
            crate::routes::user::ProfilePictureRequest,
            crate::routes::user::GeneralSettingsRequest,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "banks", description = "Banks the cooperative deposits with"),
        (name = "collateral", description = "Collateral kinds accepted for loans"),
        (name = "funds", description = "Fund types"),
        (name = "member assets", description = "Assets declared by members"),
        (name = "member profiles", description = "Cooperative members"),
        (name = "member types", description = "Membership classes and their assignment history"),
        (name = "tag templates", description = "Reusable tags"),
        (name = "notifications", description = "The caller's notifications"),
        (name = "users", description = "Users of the caller's organization and the caller's own profile"),
    )
)]
pub struct ApiDoc;

/// The complete document: [`ApiDoc`] plus every entity's CRUD paths.
pub fn document() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    for part in [
        routes::bank::CrudApi::openapi(),
        routes::collateral::CrudApi::openapi(),
        routes::funds::CrudApi::openapi(),
        routes::member_asset::CrudApi::openapi(),
        routes::member_profile::CrudApi::openapi(),
        routes::member_type::CrudApi::openapi(),
        routes::tag_template::CrudApi::openapi(),
    ] {
        doc.merge(part);
    }
    doc
}

/// Serves the OpenAPI JSON document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(document())
}
