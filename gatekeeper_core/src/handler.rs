//! Requirement handlers.
//!
//! Handlers inspect the pending requirements of an
//! [`AuthorizationContext`], mark the ones the principal satisfies and
//! record why the others are not.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AuthorizationContext;
use crate::requirement::PermissionRequirement;

/// Default claim type that carries permissions.
pub const DEFAULT_PERMISSION_CLAIM_TYPE: &str = "permission";

/// How the permissions of a requirement combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionOperator {
    /// Every permission is required.
    #[default]
    #[serde(alias = "all")]
    And,

    /// Any one permission is enough.
    #[serde(alias = "any")]
    Or,
}

/// Interface for requirement handlers.
pub trait RequirementHandler: Send + Sync {
    /// Evaluate the pending requirements this handler understands.
    fn handle(&self, context: &mut AuthorizationContext<'_>);
}

/// Handler for [`PermissionRequirement`].
#[derive(Debug, Clone)]
pub struct PermissionHandler {
    claim_type: String,
    operator: PermissionOperator,
}

impl PermissionHandler {
    /// Create a new permission handler.
    pub fn new(claim_type: impl Into<String>, operator: PermissionOperator) -> Self {
        Self {
            claim_type: claim_type.into(),
            operator,
        }
    }

    /// Claim type permissions are looked up under.
    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    /// How the permissions of a requirement combine.
    pub fn operator(&self) -> PermissionOperator {
        self.operator
    }

    /// Permissions of `requirement` the principal is missing, or `None`
    /// when the requirement is satisfied.
    fn missing_permissions<'r>(
        &self,
        context: &AuthorizationContext<'_>,
        requirement: &'r PermissionRequirement,
    ) -> Option<Vec<&'r str>> {
        let principal = context.principal();
        let missing: Vec<&str> = requirement
            .iter()
            .filter(|permission| !principal.has_claim(&self.claim_type, permission))
            .collect();

        let satisfied = match self.operator {
            PermissionOperator::And => missing.is_empty(),
            PermissionOperator::Or => requirement.is_empty() || missing.len() < requirement.len(),
        };

        if satisfied {
            None
        } else {
            Some(missing)
        }
    }
}

impl Default for PermissionHandler {
    fn default() -> Self {
        Self::new(DEFAULT_PERMISSION_CLAIM_TYPE, PermissionOperator::default())
    }
}

impl RequirementHandler for PermissionHandler {
    fn handle(&self, context: &mut AuthorizationContext<'_>) {
        if !context.principal().is_authenticated() {
            return;
        }

        let pending: Vec<_> = context.pending().collect();

        for (index, requirement) in pending {
            let Some(requirement) = requirement.as_any().downcast_ref::<PermissionRequirement>()
            else {
                continue;
            };

            match self.missing_permissions(context, requirement) {
                None => {
                    debug!("Permission requirement [{}] satisfied", requirement);
                    context.succeed(index);
                }
                Some(missing) => {
                    let reason = match self.operator {
                        PermissionOperator::And => {
                            format!("missing permissions [{}]", missing.join(","))
                        }
                        PermissionOperator::Or => {
                            format!("missing any of permissions [{}]", missing.join(","))
                        }
                    };
                    debug!("Permission requirement [{}] not satisfied: {}", requirement, reason);
                    context.fail_requirement(index, reason);
                }
            }
        }
    }
}
