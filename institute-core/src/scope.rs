//! Role-based access scoping.
//!
//! Every read and write against admissions, payments, and installments is
//! implicitly filtered by the actor's role. The scope is derived once from
//! the token claims and consumed uniformly by the repository layer, so no
//! handler re-implements the branch/student checks.

use bson::{doc, Document};

use crate::auth::{AuthClaims, Role};
use crate::error::AppError;

/// Scoping filter derived from the authenticated actor.
///
/// Out-of-scope documents resolve to "not found", never "forbidden": a
/// role-mismatched ID must not reveal whether the record exists.
#[derive(Debug, Clone)]
pub struct AccessScope {
    pub role: Role,
    pub user_id: String,
    pub branch_id: Option<String>,
}

impl AccessScope {
    pub fn from_claims(claims: &AuthClaims) -> Self {
        Self {
            role: claims.role,
            user_id: claims.sub.clone(),
            branch_id: claims.branch_id.clone(),
        }
    }

    /// Mandatory filter applied to every admission query.
    ///
    /// Branch admins are pinned to their own branch, students to their own
    /// records. Admin and staff see everything (and may pass explicit
    /// filters on top).
    pub fn admission_filter(&self) -> Document {
        match self.role {
            Role::Admin | Role::Staff => doc! {},
            Role::BranchAdmin => match &self.branch_id {
                Some(branch) => doc! { "course_details.branch_id": branch },
                // A branch admin without a branch matches nothing.
                None => doc! { "course_details.branch_id": "" },
            },
            Role::Student => doc! { "student_id": &self.user_id },
        }
    }

    /// Equivalent filter for payment documents.
    pub fn payment_filter(&self) -> Document {
        match self.role {
            Role::Admin | Role::Staff => doc! {},
            Role::BranchAdmin => match &self.branch_id {
                Some(branch) => doc! { "branch_id": branch },
                None => doc! { "branch_id": "" },
            },
            Role::Student => doc! { "student_id": &self.user_id },
        }
    }

    /// Whether the caller-supplied branch filter is honored. Branch admins
    /// may not widen their scope by passing a different branch.
    pub fn allows_explicit_filters(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff)
    }

    /// Require one of the listed roles, or fail with the 403 contract.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let required = allowed
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join("|");
        Err(AppError::Forbidden {
            required,
            current: self.role.to_string(),
        })
    }
}
