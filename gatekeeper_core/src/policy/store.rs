//! Policy storage.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::AuthorizationPolicy;
use crate::error::{GatekeeperError, Result};

/// Interface for policy storage.
pub trait PolicyStore: Send + Sync {
    /// Add a policy. Names are unique.
    fn add_policy(&self, policy: AuthorizationPolicy) -> Result<()>;

    /// Remove a policy by name.
    fn remove_policy(&self, name: &str) -> Result<()>;

    /// Get a policy by name.
    fn get_policy(&self, name: &str) -> Option<Arc<AuthorizationPolicy>>;

    /// Names of all stored policies, sorted.
    fn policy_names(&self) -> Vec<String>;
}

/// In-memory policy store.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    policies: DashMap<String, Arc<AuthorizationPolicy>>,
}

impl MemoryPolicyStore {
    /// Create a new in-memory policy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no policies are stored.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn add_policy(&self, policy: AuthorizationPolicy) -> Result<()> {
        let name = policy.name().to_string();

        match self.policies.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                Err(GatekeeperError::PolicyAlreadyExists(entry.key().clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!("Registering policy {}", entry.key());
                entry.insert(Arc::new(policy));
                Ok(())
            }
        }
    }

    fn remove_policy(&self, name: &str) -> Result<()> {
        if self.policies.remove(name).is_none() {
            return Err(GatekeeperError::PolicyNotFound(name.to_string()));
        }

        debug!("Removed policy {}", name);
        Ok(())
    }

    fn get_policy(&self, name: &str) -> Option<Arc<AuthorizationPolicy>> {
        self.policies.get(name).map(|entry| entry.value().clone())
    }

    fn policy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .policies
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
