//! Demo data for local development (`--seed-demo`).
//!
//! Creates a fresh organization and branch with one user, a bank, a member
//! type, a handful of tag templates and welcome notifications, then logs a
//! bearer token for that user.

use chrono::Utc;
use coop_core::model::{Bank, MemberType, Notification, NotificationType, TagCategory, TagTemplate, User};
use coop_core::{BranchId, BranchScope, IdentityContext, OrganizationId, PasswordHash, Stamps, UserId};
use uuid::Uuid;

use crate::auth::issue_token;
use crate::error::AppError;
use crate::state::AppState;

const DEMO_PASSWORD: &str = "password123";

/// A verified user account for `identity`.
pub fn demo_user(identity: &IdentityContext, password: &str) -> User {
    let now = Utc::now();
    let mut user = User {
        id: identity.user_id,
        organization_id: identity.organization_id,
        branch_id: identity.branch_id,
        user_name: "demo".into(),
        email: "demo@coop.local".into(),
        contact_number: "09170000000".into(),
        description: "Demo account".into(),
        first_name: "Demo".into(),
        middle_name: None,
        last_name: "Member".into(),
        suffix: None,
        full_name: String::new(),
        birthdate: None,
        media_id: None,
        password: PasswordHash::generate(password),
        is_email_verified: true,
        is_contact_verified: true,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    user.refresh_full_name();
    user
}

fn tag(scope: BranchScope, stamps: &Stamps, name: &str, category: TagCategory, color: &str, icon: &str) -> TagTemplate {
    TagTemplate {
        id: Uuid::new_v4(),
        scope,
        stamps: stamps.clone(),
        name: name.into(),
        description: String::new(),
        category: Some(category),
        color: color.into(),
        icon: icon.into(),
    }
}

/// Populate `state` with demo records and return the demo identity.
pub async fn seed_demo(state: &AppState) -> Result<IdentityContext, AppError> {
    let identity = IdentityContext::new(UserId::new(), OrganizationId::new(), Some(BranchId::new()));
    let scope = identity.branch_scope()?;
    let stamps = Stamps::created_by(identity.user_id, Utc::now());

    let user = state.users.create(demo_user(&identity, DEMO_PASSWORD)).await?;
    state.sessions.set(user);

    state
        .banks
        .create(Bank {
            id: Uuid::new_v4(),
            scope,
            stamps: stamps.clone(),
            name: "Main Bank".into(),
            description: "Head office depository".into(),
            media_id: None,
        })
        .await?;

    state
        .member_types
        .create(MemberType {
            id: Uuid::new_v4(),
            scope,
            stamps: stamps.clone(),
            name: "Regular".into(),
            prefix: "REG".into(),
            description: "Full voting member".into(),
        })
        .await?;

    for template in [
        tag(scope, &stamps, "Deposit", TagCategory::TransactionType, "#16a34a", "arrow-down"),
        tag(scope, &stamps, "Withdrawal", TagCategory::TransactionType, "#dc2626", "arrow-up"),
        tag(scope, &stamps, "Urgent", TagCategory::Priority, "#f97316", "alert"),
        tag(scope, &stamps, "Savings", TagCategory::AccountType, "#2563eb", "piggy-bank"),
    ] {
        state.tag_templates.create(template).await?;
    }

    let now = Utc::now();
    for (title, description, kind) in [
        ("Welcome", "Your demo cooperative is ready.", NotificationType::Info),
        ("Profile incomplete", "Add a birthdate to your profile.", NotificationType::Warning),
    ] {
        state
            .notifications
            .create(Notification::new(identity.user_id, title, description, kind, now))
            .await?;
    }

    let token = issue_token(&identity, state.config.auth_secret.as_deref().unwrap_or("dev"));
    tracing::info!(
        user_id = %identity.user_id,
        organization_id = %identity.organization_id,
        token = %token,
        "Seeded demo data (password: {DEMO_PASSWORD})"
    );

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coop_core::{BranchScoped, Record};

    #[tokio::test]
    async fn seeds_one_branch_worth_of_records() {
        let state = AppState::new();
        let identity = seed_demo(&state).await.unwrap();
        let scope = identity.branch_scope().unwrap();

        assert_eq!(state.banks.list_scoped(&scope).len(), 1);
        assert_eq!(state.member_types.list_scoped(&scope).len(), 1);
        assert_eq!(state.tag_templates.list_scoped(&scope).len(), 4);
        assert_eq!(state.notifications.find(|n| n.belongs_to(identity.user_id)).len(), 2);

        let user = state.sessions.get(identity.user_id).unwrap();
        assert!(user.password.verify(DEMO_PASSWORD).unwrap());
        assert_eq!(user.full_name, "Demo Member");

        let bank = &state.banks.list_scoped(&scope)[0];
        assert!(bank.visible_to(&scope));
        assert!(!bank.is_deleted());
    }
}
