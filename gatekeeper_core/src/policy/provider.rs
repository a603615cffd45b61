//! Policy resolution by name.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{AuthorizationPolicy, PolicyStore};
use crate::error::{GatekeeperError, Result};

/// Prefix marking a policy name that lists its permissions inline,
/// e.g. `permissions:orders.read,orders.write`.
pub const PERMISSION_POLICY_PREFIX: &str = "permissions:";

/// Resolves policy names against a store, building inline permission
/// policies on demand.
pub struct PolicyProvider {
    store: Arc<dyn PolicyStore>,

    /// Inline permission policies, built once per name.
    inline_policies: DashMap<String, Arc<AuthorizationPolicy>>,
}

impl PolicyProvider {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self {
            store,
            inline_policies: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Resolve a policy by name.
    ///
    /// Registered policies take precedence over inline ones.
    pub fn get_policy(&self, name: &str) -> Result<Arc<AuthorizationPolicy>> {
        if let Some(policy) = self.store.get_policy(name) {
            return Ok(policy);
        }

        let Some(raw) = name.strip_prefix(PERMISSION_POLICY_PREFIX) else {
            return Err(GatekeeperError::PolicyNotFound(name.to_string()));
        };

        if let Some(policy) = self.inline_policies.get(name) {
            return Ok(policy.value().clone());
        }

        debug!("Building inline permission policy {}", name);
        let policy = Arc::new(AuthorizationPolicy::from_permissions(name, Some(raw))?);
        let policy = self
            .inline_policies
            .entry(name.to_string())
            .or_insert(policy)
            .value()
            .clone();

        Ok(policy)
    }

    /// Number of inline policies built so far.
    pub fn inline_policy_count(&self) -> usize {
        self.inline_policies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MemoryPolicyStore;
    use crate::requirement::PermissionRequirement;

    fn provider() -> PolicyProvider {
        let store = MemoryPolicyStore::new();
        let policy = AuthorizationPolicy::from_permissions("orders", Some("orders.read")).unwrap();
        store.add_policy(policy).unwrap();
        PolicyProvider::new(Arc::new(store))
    }

    #[test]
    fn test_registered_policy() {
        let provider = provider();
        let policy = provider.get_policy("orders").unwrap();
        assert_eq!(policy.name(), "orders");
        assert_eq!(provider.inline_policy_count(), 0);
    }

    #[test]
    fn test_unknown_policy() {
        let provider = provider();
        assert!(matches!(
            provider.get_policy("billing"),
            Err(GatekeeperError::PolicyNotFound(_))
        ));
    }

    #[test]
    fn test_inline_policy_is_built_and_cached() {
        let provider = provider();
        let name = "permissions:orders.read, orders.write";

        let first = provider.get_policy(name).unwrap();
        let second = provider.get_policy(name).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.inline_policy_count(), 1);

        let requirement = first.requirements()[0]
            .as_any()
            .downcast_ref::<PermissionRequirement>()
            .unwrap();
        assert_eq!(requirement.permissions(), ["orders.read", "orders.write"]);
    }
}
