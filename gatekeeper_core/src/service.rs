//! Authorization service.
//!
//! Ties policy resolution, requirement handlers and the audit trail
//! together. A decision is reached by running every handler over the
//! policy's requirements; the policy passes only when every requirement
//! was satisfied and no handler recorded a failure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::AuthorizationContext;
use crate::error::Result;
use crate::handler::RequirementHandler;
use crate::policy::{AuthorizationPolicy, PolicyProvider};
use crate::principal::Principal;

/// Number of audit entries kept when no capacity is configured.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuthorizationDecision {
    Allowed,
    Denied { reasons: Vec<String> },
}

impl AuthorizationDecision {
    /// Whether access was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Audit entry for an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Unique audit ID.
    pub id: u64,

    /// Name of the principal, if any.
    pub principal: Option<String>,

    /// Policy that was evaluated.
    pub policy: String,

    /// Whether access was granted.
    pub allowed: bool,

    /// Additional details.
    pub details: String,

    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

/// Evaluates principals against named policies.
///
/// The audit log keeps at most `audit_capacity` entries; the oldest are
/// evicted first.
pub struct AuthorizationService {
    provider: Arc<PolicyProvider>,
    handlers: Vec<Arc<dyn RequirementHandler>>,
    audit_log: DashMap<u64, AuditEntry>,
    audit_capacity: usize,

    /// Oldest audit ID that may still be in the log.
    min_audit_id: AtomicU64,

    /// Next audit ID.
    next_audit_id: AtomicU64,
}

impl AuthorizationService {
    /// Create a new authorization service.
    pub fn new(provider: Arc<PolicyProvider>, handlers: Vec<Arc<dyn RequirementHandler>>) -> Self {
        Self {
            provider,
            handlers,
            audit_log: DashMap::new(),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            min_audit_id: AtomicU64::new(1),
            next_audit_id: AtomicU64::new(1),
        }
    }

    /// Set how many audit entries are kept.
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// The policy provider names are resolved through.
    pub fn provider(&self) -> &Arc<PolicyProvider> {
        &self.provider
    }

    /// Authorize a principal against a policy resolved by name.
    ///
    /// Errors only when the policy cannot be resolved; a denial is
    /// returned as [`AuthorizationDecision::Denied`].
    pub fn authorize(
        &self,
        principal: &Principal,
        policy_name: &str,
    ) -> Result<AuthorizationDecision> {
        let policy = self.provider.get_policy(policy_name)?;
        Ok(self.authorize_policy(principal, &policy))
    }

    /// Authorize a principal against an already resolved policy.
    pub fn authorize_policy(
        &self,
        principal: &Principal,
        policy: &AuthorizationPolicy,
    ) -> AuthorizationDecision {
        let mut context = AuthorizationContext::new(principal, policy.requirements());

        for handler in &self.handlers {
            handler.handle(&mut context);
        }

        let decision = if context.has_succeeded() {
            AuthorizationDecision::Allowed
        } else {
            AuthorizationDecision::Denied {
                reasons: denial_reasons(&context),
            }
        };

        let principal_name = principal.name().unwrap_or("<anonymous>");
        match &decision {
            AuthorizationDecision::Allowed => {
                info!("Policy {} allowed for {}", policy.name(), principal_name);
            }
            AuthorizationDecision::Denied { reasons } => {
                warn!(
                    "Policy {} denied for {}: {}",
                    policy.name(),
                    principal_name,
                    reasons.join("; ")
                );
            }
        }

        self.record_decision(principal, policy.name(), &decision);
        decision
    }

    /// Record a decision in the audit log.
    fn record_decision(
        &self,
        principal: &Principal,
        policy: &str,
        decision: &AuthorizationDecision,
    ) -> u64 {
        let id = self.next_audit_id.fetch_add(1, Ordering::SeqCst);
        let details = match decision {
            AuthorizationDecision::Allowed => "Allowed by policy".to_string(),
            AuthorizationDecision::Denied { reasons } => format!("Denied: {}", reasons.join("; ")),
        };

        let entry = AuditEntry {
            id,
            principal: principal.name().map(str::to_string),
            policy: policy.to_string(),
            allowed: decision.is_allowed(),
            details,
            timestamp: Utc::now(),
        };

        self.audit_log.insert(id, entry);

        while self.audit_log.len() > self.audit_capacity {
            let oldest = self.min_audit_id.fetch_add(1, Ordering::SeqCst);
            if oldest > id {
                break;
            }
            self.audit_log.remove(&oldest);
        }

        id
    }

    /// Get recent decisions, newest first.
    pub fn recent_decisions(&self, limit: usize) -> Vec<AuditEntry> {
        let oldest = self.min_audit_id.load(Ordering::SeqCst);
        let next = self.next_audit_id.load(Ordering::SeqCst);

        (oldest..next)
            .rev()
            .filter_map(|id| self.audit_log.get(&id).map(|entry| entry.value().clone()))
            .take(limit)
            .collect()
    }

    /// Number of entries currently held in the audit log.
    pub fn audit_len(&self) -> usize {
        self.audit_log.len()
    }
}

fn denial_reasons(context: &AuthorizationContext<'_>) -> Vec<String> {
    let mut reasons = context.failure_reasons().to_vec();

    if !context.principal().is_authenticated() {
        reasons.push("principal is not authenticated".to_string());
    }

    reasons.extend(
        context
            .pending()
            .filter(|(index, _)| !context.is_explained(*index))
            .map(|(_, requirement)| {
                format!("{} requirement not satisfied: [{}]", requirement.name(), requirement)
            }),
    );

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::PermissionHandler;
    use crate::policy::{MemoryPolicyStore, PolicyStore};
    use crate::GatekeeperError;

    fn service() -> AuthorizationService {
        let store = MemoryPolicyStore::new();
        store
            .add_policy(
                AuthorizationPolicy::from_permissions("orders", Some("orders.read, orders.write"))
                    .unwrap(),
            )
            .unwrap();

        AuthorizationService::new(
            Arc::new(PolicyProvider::new(Arc::new(store))),
            vec![Arc::new(PermissionHandler::default())],
        )
    }

    #[test]
    fn test_allowed_and_denied() {
        let service = service();
        let full = Principal::authenticated("alice")
            .with_claim("permission", "orders.read")
            .with_claim("permission", "orders.write");
        let partial = Principal::authenticated("bob").with_claim("permission", "orders.read");

        assert_eq!(
            service.authorize(&full, "orders").unwrap(),
            AuthorizationDecision::Allowed
        );

        let decision = service.authorize(&partial, "orders").unwrap();
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_anonymous_denial_reason() {
        let service = service();
        let decision = service.authorize(&Principal::anonymous(), "orders").unwrap();

        match decision {
            AuthorizationDecision::Denied { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("not authenticated")));
            }
            AuthorizationDecision::Allowed => panic!("anonymous principal was allowed"),
        }
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let service = service();
        let result = service.authorize(&Principal::authenticated("alice"), "billing");
        assert!(matches!(result, Err(GatekeeperError::PolicyNotFound(_))));
        assert!(service.recent_decisions(10).is_empty());
    }

    #[test]
    fn test_no_handlers_means_denied() {
        let service = AuthorizationService::new(
            Arc::new(PolicyProvider::new(Arc::new(MemoryPolicyStore::new()))),
            Vec::new(),
        );
        let principal = Principal::authenticated("alice").with_claim("permission", "a");

        let decision = service.authorize(&principal, "permissions:a").unwrap();
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_denial_reason_names_missing_permissions() {
        let service = service();
        let principal = Principal::authenticated("bob").with_claim("permission", "orders.read");

        let decision = service
            .authorize(&principal, "permissions:orders.read,orders.write")
            .unwrap();
        assert_eq!(
            decision,
            AuthorizationDecision::Denied {
                reasons: vec!["missing permissions [orders.write]".to_string()],
            }
        );
    }

    #[test]
    fn test_audit_log_is_capped() {
        let service = service().with_audit_capacity(16);
        let principal = Principal::authenticated("alice").with_claim("permission", "orders.read");

        for _ in 0..1000 {
            service.authorize(&principal, "permissions:orders.read").unwrap();
        }

        assert_eq!(service.audit_len(), 16);

        let entries = service.recent_decisions(usize::MAX);
        assert_eq!(entries.len(), 16);
        assert_eq!(entries[0].id, 1000);
        assert_eq!(entries[15].id, 985);
    }

    #[test]
    fn test_audit_log_is_newest_first() {
        let service = service();
        let principal = Principal::authenticated("alice").with_claim("permission", "orders.read");

        service.authorize(&principal, "orders").unwrap();
        service.authorize(&principal, "permissions:orders.read").unwrap();

        let entries = service.recent_decisions(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].policy, "permissions:orders.read");
        assert!(entries[0].allowed);
        assert_eq!(entries[1].policy, "orders");
        assert!(!entries[1].allowed);
        assert_eq!(entries[1].principal.as_deref(), Some("alice"));

        assert_eq!(service.recent_decisions(1).len(), 1);
    }
}
