//! # coop-core: Domain Types for the Cooperative Backend
//!
//! Every crate in the workspace builds on the types defined here. The crate
//! is pure: no async, no I/O, no HTTP. It only knows what a record looks
//! like, who is allowed to see it, and how an action on it is recorded.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for tenant identifiers.** [`UserId`],
//!    [`OrganizationId`], [`BranchId`] and [`MediaId`] are distinct types.
//!    A branch can never be passed where an organization is expected.
//!
//! 2. **Tenant scope is resolved, never supplied.** [`IdentityContext`] comes
//!    from the authenticated principal; [`BranchScope`] is derived from it and
//!    stamped onto records. Request payloads carry no tenant fields.
//!
//! 3. **One audit vocabulary.** [`Operation`] and [`Activity`] are the only
//!    way to name what happened; footsteps chain by SHA-256 so the log is
//!    tamper-evident.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `coop-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod credential;
pub mod error;
pub mod footstep;
pub mod identity;
pub mod model;
pub mod pagination;
pub mod record;
pub mod scope;

pub use credential::{CredentialError, PasswordHash};
pub use error::ValidationError;
pub use footstep::{verify_chain, Activity, Actor, Footstep, FootstepEvent, Operation, GENESIS_HASH};
pub use identity::{BranchId, MediaId, OrganizationId, UserId};
pub use pagination::{paginate, Page, PageQuery, PageRequest, PaginationError, SortField, SortOrder};
pub use record::{BranchScoped, Record, Stamps};
pub use scope::{BranchScope, IdentityContext, ScopeError};
