//! Authorization policies.
//!
//! A policy is a named, ordered list of requirements. Policies are stored
//! in a [`PolicyStore`] and resolved by name through a [`PolicyProvider`].

mod provider;
mod store;

pub use provider::{PolicyProvider, PERMISSION_POLICY_PREFIX};
pub use store::{MemoryPolicyStore, PolicyStore};

use std::sync::Arc;

use crate::error::{GatekeeperError, Result};
use crate::requirement::{AuthorizationRequirement, PermissionRequirement};

/// A named set of requirements a principal must satisfy.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    name: String,
    requirements: Vec<Arc<dyn AuthorizationRequirement>>,
}

impl AuthorizationPolicy {
    /// Start building a policy.
    pub fn builder(name: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder {
            name: name.into(),
            requirements: Vec::new(),
        }
    }

    /// Policy with a single permission requirement.
    pub fn from_permissions(name: impl Into<String>, permissions: Option<&str>) -> Result<Self> {
        Self::builder(name).require_permissions(permissions)?.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirements(&self) -> &[Arc<dyn AuthorizationRequirement>] {
        &self.requirements
    }
}

/// Builder for [`AuthorizationPolicy`].
#[derive(Debug)]
pub struct PolicyBuilder {
    name: String,
    requirements: Vec<Arc<dyn AuthorizationRequirement>>,
}

impl PolicyBuilder {
    /// Require the permissions listed in a comma-separated string.
    ///
    /// Fails with [`GatekeeperError::InvalidArgument`] when the string is absent.
    pub fn require_permissions(self, raw: Option<&str>) -> Result<Self> {
        let requirement = PermissionRequirement::from_raw(raw)?;
        Ok(self.require(requirement))
    }

    /// Add an arbitrary requirement.
    pub fn require(mut self, requirement: impl AuthorizationRequirement + 'static) -> Self {
        self.requirements.push(Arc::new(requirement));
        self
    }

    pub fn build(self) -> Result<AuthorizationPolicy> {
        if self.name.trim().is_empty() {
            return Err(GatekeeperError::InvalidArgument(
                "policy name must not be empty".to_string(),
            ));
        }
        if self.requirements.is_empty() {
            return Err(GatekeeperError::InvalidArgument(format!(
                "policy {} has no requirements",
                self.name
            )));
        }

        Ok(AuthorizationPolicy {
            name: self.name,
            requirements: self.requirements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_policy() {
        let policy = AuthorizationPolicy::builder("orders")
            .require_permissions(Some("orders.read, orders.write"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(policy.name(), "orders");
        assert_eq!(policy.requirements().len(), 1);

        let requirement = policy.requirements()[0]
            .as_any()
            .downcast_ref::<PermissionRequirement>()
            .unwrap();
        assert_eq!(requirement.permissions(), ["orders.read", "orders.write"]);
    }

    #[test]
    fn test_absent_permissions_fail_fast() {
        let result = AuthorizationPolicy::from_permissions("orders", None);
        assert!(matches!(result, Err(GatekeeperError::InvalidArgument(_))));
    }

    #[test]
    fn test_policy_needs_requirements_and_name() {
        let result = AuthorizationPolicy::builder("empty").build();
        assert!(matches!(result, Err(GatekeeperError::InvalidArgument(_))));

        let result = AuthorizationPolicy::from_permissions(" ", Some("a"));
        assert!(matches!(result, Err(GatekeeperError::InvalidArgument(_))));
    }
}
