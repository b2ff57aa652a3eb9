//! # Tenant Scope
//!
//! The (organization, branch) pair that restricts which records a principal
//! may read or write.
//!
//! An [`IdentityContext`] is resolved from the request by the service layer.
//! It always carries an organization, but the branch is optional: a user can
//! belong to an organization before being assigned to a branch. Operations on
//! branch-scoped records call [`IdentityContext::branch_scope`], which turns
//! that absence into [`ScopeError::MissingBranch`]. This is a client error
//! (the principal is authenticated, just not assigned), distinct from an
//! authentication failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{BranchId, OrganizationId, UserId};

/// Who is acting, and within which tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub branch_id: Option<BranchId>,
}

impl IdentityContext {
    pub fn new(user_id: UserId, organization_id: OrganizationId, branch_id: Option<BranchId>) -> Self {
        Self {
            user_id,
            organization_id,
            branch_id,
        }
    }

    /// The branch scope required by branch-scoped records.
    pub fn branch_scope(&self) -> Result<BranchScope, ScopeError> {
        self.branch_id
            .map(|branch_id| BranchScope {
                organization_id: self.organization_id,
                branch_id,
            })
            .ok_or(ScopeError::MissingBranch {
                user_id: self.user_id,
            })
    }
}

/// A fully resolved tenant: the organization and the branch inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchScope {
    pub organization_id: OrganizationId,
    pub branch_id: BranchId,
}

impl BranchScope {
    pub fn new(organization_id: OrganizationId, branch_id: BranchId) -> Self {
        Self {
            organization_id,
            branch_id,
        }
    }
}

/// Scope resolution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The principal is authenticated but not assigned to any branch.
    #[error("user {user_id} is not assigned to a branch")]
    MissingBranch { user_id: UserId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_scope_resolves_when_assigned() {
        let org = OrganizationId::new();
        let branch = BranchId::new();
        let identity = IdentityContext::new(UserId::new(), org, Some(branch));

        let scope = identity.branch_scope().unwrap();
        assert_eq!(scope.organization_id, org);
        assert_eq!(scope.branch_id, branch);
    }

    #[test]
    fn missing_branch_is_a_scope_error() {
        let user = UserId::new();
        let identity = IdentityContext::new(user, OrganizationId::new(), None);

        let err = identity.branch_scope().unwrap_err();
        assert_eq!(err, ScopeError::MissingBranch { user_id: user });
        assert!(err.to_string().contains("not assigned to a branch"));
    }

    #[test]
    fn scopes_from_different_branches_differ() {
        let org = OrganizationId::new();
        assert_ne!(
            BranchScope::new(org, BranchId::new()),
            BranchScope::new(org, BranchId::new())
        );
    }
}
