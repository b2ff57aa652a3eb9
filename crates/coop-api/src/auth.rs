//! # Identity Context Resolution
//!
//! Resolves every request into a [`Principal`]: either the caller's
//! [`IdentityContext`] or the reason it could not be established.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {user_id}:{organization_id}:{branch_id}:{secret}
//! ```
//!
//! `branch_id` may be empty for principals not yet assigned to a branch.
//! When [`AuthConfig::secret`] is set, the secret segment is compared in
//! constant time; when it is `None` (development) the segment is ignored.
//!
//! ## Why the middleware never rejects
//!
//! Mutating handlers audit every outcome, including authentication failures.
//! The middleware therefore only attaches the [`Principal`] to the request
//! extensions; handlers call [`Principal::identity`] (401 on failure) and
//! [`Principal::branch_scope`] (400 when no branch is assigned).

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use coop_core::footstep::Actor;
use coop_core::model::User;
use coop_core::{BranchId, BranchScope, IdentityContext, OrganizationId, UserId};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::Store;

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the secret to prevent credential leakage in logs.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Principal ───────────────────────────────────────────────────────────────

/// The resolved caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Authenticated(IdentityContext),
    Anonymous { reason: String },
}

impl Principal {
    pub fn identity(&self) -> Result<IdentityContext, AppError> {
        match self {
            Self::Authenticated(identity) => Ok(*identity),
            Self::Anonymous { reason } => Err(AppError::Unauthenticated(reason.clone())),
        }
    }

    /// The caller's branch scope. Authentication is checked first, so a
    /// missing token is always 401 and a missing branch always 400.
    pub fn branch_scope(&self) -> Result<BranchScope, AppError> {
        Ok(self.identity()?.branch_scope()?)
    }

    /// Attribution for footsteps; empty when unauthenticated.
    pub fn actor(&self) -> Actor {
        match self {
            Self::Authenticated(identity) => Actor {
                user_id: Some(identity.user_id),
                organization_id: Some(identity.organization_id),
                branch_id: identity.branch_id,
            },
            Self::Anonymous { .. } => Actor::default(),
        }
    }
}

/// Reads the [`Principal`] the middleware attached. Never rejects: a request
/// that bypassed the middleware is anonymous.
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Principal>()
            .cloned()
            .unwrap_or_else(|| Principal::Anonymous {
                reason: "missing authorization header".into(),
            }))
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of token secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        // Dummy comparison to keep timing constant regardless of length match.
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse `{user_id}:{organization_id}:{branch_id}:{secret}`.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&str>,
) -> Result<IdentityContext, String> {
    let parts: Vec<&str> = provided.splitn(4, ':').collect();
    let [user, org, branch, secret] = parts.as_slice() else {
        return Err(
            "invalid token format, expected {user_id}:{organization_id}:{branch_id}:{secret}"
                .into(),
        );
    };

    if let Some(expected) = expected_secret {
        if !constant_time_token_eq(secret, expected) {
            return Err("invalid bearer token".into());
        }
    }

    let user_id = user
        .parse::<Uuid>()
        .map(UserId::from_uuid)
        .map_err(|e| format!("invalid user_id: {e}"))?;
    let organization_id = org
        .parse::<Uuid>()
        .map(OrganizationId::from_uuid)
        .map_err(|e| format!("invalid organization_id: {e}"))?;
    let branch_id = if branch.is_empty() {
        None
    } else {
        Some(
            branch
                .parse::<Uuid>()
                .map(BranchId::from_uuid)
                .map_err(|e| format!("invalid branch_id: {e}"))?,
        )
    };

    Ok(IdentityContext::new(user_id, organization_id, branch_id))
}

/// Build a token for `identity`. Used by the demo seeder and tests.
pub fn issue_token(identity: &IdentityContext, secret: &str) -> String {
    let branch = identity
        .branch_id
        .map(|b| b.to_string())
        .unwrap_or_default();
    format!(
        "{}:{}:{}:{}",
        identity.user_id, identity.organization_id, branch, secret
    )
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the `Authorization: Bearer` header into a [`Principal`] and attach
/// it to the request.
pub async fn auth_middleware(
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let principal = match bearer {
        Ok(TypedHeader(Authorization(bearer))) => {
            match parse_bearer_token(bearer.token(), config.secret.as_deref()) {
                Ok(identity) => {
                    tracing::debug!(user_id = %identity.user_id, "request authenticated");
                    Principal::Authenticated(identity)
                }
                Err(reason) => {
                    tracing::warn!(reason = %reason, "authentication failed: invalid bearer token");
                    Principal::Anonymous { reason }
                }
            }
        }
        Err(rejection) if rejection.is_missing() => Principal::Anonymous {
            reason: "missing authorization header".into(),
        },
        Err(_) => {
            tracing::warn!("authentication failed: malformed authorization header");
            Principal::Anonymous {
                reason: "authorization header must use Bearer scheme".into(),
            }
        }
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

// ── Session cache ───────────────────────────────────────────────────────────

/// Session-bound copies of user records, keyed by user id.
///
/// "Current user" lookups read from here first. Every profile mutation must
/// call [`UserSessions::set`] so the cached copy never lags the store.
#[derive(Debug, Clone, Default)]
pub struct UserSessions {
    users: Store<User>,
}

impl UserSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: UserId) -> Option<User> {
        self.users.get(user_id.as_uuid())
    }

    pub fn set(&self, user: User) {
        self.users.insert(user.id.into_uuid(), user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn identity(branch: bool) -> IdentityContext {
        IdentityContext::new(
            UserId::new(),
            OrganizationId::new(),
            branch.then(BranchId::new),
        )
    }

    async fn describe(principal: Principal) -> String {
        match principal.branch_scope() {
            Ok(scope) => format!("scoped:{}", scope.branch_id),
            Err(err) => format!("{}:{}", err.status().as_u16(), err.public_message()),
        }
    }

    fn test_app(secret: Option<&str>) -> Router {
        let auth_config = AuthConfig {
            secret: secret.map(String::from),
        };
        Router::new()
            .route("/test", get(describe))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(auth_config))
    }

    async fn call(app: Router, auth: Option<&str>) -> String {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn token_round_trip() {
        let id = identity(true);
        let token = issue_token(&id, "s3cret");
        assert_eq!(parse_bearer_token(&token, Some("s3cret")), Ok(id));
    }

    #[test]
    fn empty_branch_segment_means_no_branch() {
        let id = identity(false);
        let token = issue_token(&id, "x");
        let parsed = parse_bearer_token(&token, None).unwrap();
        assert_eq!(parsed.branch_id, None);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue_token(&identity(true), "guess");
        assert!(parse_bearer_token(&token, Some("s3cret")).is_err());
    }

    #[test]
    fn secret_ignored_without_configuration() {
        let token = issue_token(&identity(true), "anything");
        assert!(parse_bearer_token(&token, None).is_ok());
    }

    #[test]
    fn malformed_tokens_rejected() {
        assert!(parse_bearer_token("just-a-secret", None).is_err());
        assert!(parse_bearer_token("not-a-uuid:also-not::s", None).is_err());
    }

    #[test]
    fn auth_config_debug_redacts_secret() {
        let config = AuthConfig {
            secret: Some("super-secret".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let out = call(test_app(Some("s")), None).await;
        assert!(out.starts_with("401:"), "{out}");
        assert!(out.contains("missing"));
    }

    #[tokio::test]
    async fn basic_scheme_is_unauthenticated() {
        let out = call(test_app(Some("s")), Some("Basic dXNlcjpwYXNz")).await;
        assert!(out.starts_with("401:"), "{out}");
    }

    #[tokio::test]
    async fn principal_without_branch_gets_400() {
        let token = issue_token(&identity(false), "s");
        let out = call(test_app(Some("s")), Some(&format!("Bearer {token}"))).await;
        assert!(out.starts_with("400:"), "{out}");
        assert!(out.contains("not assigned to a branch"));
    }

    #[tokio::test]
    async fn valid_token_resolves_scope() {
        let id = identity(true);
        let token = issue_token(&id, "s");
        let out = call(test_app(Some("s")), Some(&format!("Bearer {token}"))).await;
        assert_eq!(out, format!("scoped:{}", id.branch_id.unwrap()));
    }

    #[test]
    fn sessions_cache_set_and_replace() {
        let sessions = UserSessions::new();
        let user = crate::seed::demo_user(&identity(true), "password123");
        let id = user.id;
        sessions.set(user);
        assert!(sessions.get(id).is_some());

        let mut renamed = sessions.get(id).unwrap();
        renamed.first_name = "Renamed".into();
        sessions.set(renamed);
        assert_eq!(sessions.get(id).unwrap().first_name, "Renamed");
        assert!(sessions.get(UserId::new()).is_none());
    }
}
