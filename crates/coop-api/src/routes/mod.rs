//! # Route Modules
//!
//! Branch-scoped entities share the generic handlers in [`crud`]; each
//! entity module supplies its request/response shapes and validation.
//! Member type history, notifications and user settings have bespoke
//! handlers. Routers are assembled in `lib.rs`.

pub mod bank;
pub mod collateral;
pub mod crud;
pub mod funds;
pub mod member_asset;
pub mod member_profile;
pub mod member_type;
pub mod member_type_history;
pub mod notification;
pub mod tag_template;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Every `/api/v1` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(bank::router())
        .merge(collateral::router())
        .merge(funds::router())
        .merge(member_asset::router())
        .merge(member_profile::router())
        .merge(member_type::router())
        .merge(member_type_history::router())
        .merge(tag_template::router())
        .merge(notification::router())
        .merge(user::router())
}
