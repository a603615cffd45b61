//! TOML configuration.
//!
//! ```toml
//! claim_type = "permission"
//! operator = "and"
//! expand_scope_claims = false
//! audit_capacity = 1024
//!
//! [[policies]]
//! name = "orders"
//! permissions = "orders.read, orders.write"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GatekeeperError, Result};
use crate::handler::{PermissionHandler, PermissionOperator, DEFAULT_PERMISSION_CLAIM_TYPE};
use crate::policy::{AuthorizationPolicy, MemoryPolicyStore, PolicyProvider, PolicyStore};
use crate::principal::Principal;
use crate::service::{AuthorizationService, DEFAULT_AUDIT_CAPACITY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Claim type that carries permissions
    #[serde(default = "default_claim_type")]
    pub claim_type: String,

    /// How the permissions of a policy combine
    #[serde(default)]
    pub operator: PermissionOperator,

    /// Split whitespace-separated values of `claim_type` claims before evaluation
    #[serde(default)]
    pub expand_scope_claims: bool,

    /// Maximum number of audit entries kept in memory
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,

    /// Named permission policies
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Name the policy is resolved by
    pub name: String,

    /// Comma-separated permission names
    pub permissions: Option<String>,
}

fn default_claim_type() -> String {
    DEFAULT_PERMISSION_CLAIM_TYPE.to_string()
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            claim_type: default_claim_type(),
            operator: PermissionOperator::default(),
            expand_scope_claims: false,
            audit_capacity: default_audit_capacity(),
            policies: Vec::new(),
        }
    }
}

impl AuthorizationConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading authorization config from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.claim_type.trim().is_empty() {
            return Err(GatekeeperError::InvalidConfig(
                "claim_type cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for policy in &self.policies {
            if policy.name.trim().is_empty() {
                return Err(GatekeeperError::InvalidConfig(
                    "policy name cannot be empty".to_string(),
                ));
            }
            if policy.permissions.is_none() {
                return Err(GatekeeperError::InvalidArgument(format!(
                    "policy {} has no permissions",
                    policy.name
                )));
            }
            if !seen.insert(policy.name.as_str()) {
                return Err(GatekeeperError::InvalidConfig(format!(
                    "policy {} is declared more than once",
                    policy.name
                )));
            }
        }

        Ok(())
    }

    /// Prepare a principal for evaluation under this configuration.
    pub fn prepare_principal(&self, principal: Principal) -> Principal {
        if self.expand_scope_claims {
            principal.expand_scope_claims(&self.claim_type)
        } else {
            principal
        }
    }

    /// Build an authorization service with every configured policy registered.
    pub fn build_service(&self) -> Result<AuthorizationService> {
        self.validate()?;

        let store = MemoryPolicyStore::new();
        for policy in &self.policies {
            store.add_policy(AuthorizationPolicy::from_permissions(
                policy.name.as_str(),
                policy.permissions.as_deref(),
            )?)?;
        }

        info!(
            "Registered {} policies (claim type {}, operator {:?})",
            store.len(),
            self.claim_type,
            self.operator
        );

        let provider = PolicyProvider::new(Arc::new(store));
        let handler = PermissionHandler::new(self.claim_type.as_str(), self.operator);

        Ok(
            AuthorizationService::new(Arc::new(provider), vec![Arc::new(handler)])
                .with_audit_capacity(self.audit_capacity),
        )
    }
}
