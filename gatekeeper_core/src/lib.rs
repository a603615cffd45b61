//! # Gatekeeper
//!
//! Permission-based authorization. A [`PermissionRequirement`] is parsed
//! from a comma-separated permission string, attached to a named
//! [`AuthorizationPolicy`], and evaluated against a [`Principal`]'s claims
//! by the [`AuthorizationService`].

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod policy;
pub mod principal;
pub mod requirement;
pub mod service;

pub use config::{AuthorizationConfig, PolicyConfig};
pub use context::AuthorizationContext;
pub use error::{GatekeeperError, Result};
pub use handler::{PermissionHandler, PermissionOperator, RequirementHandler};
pub use policy::{AuthorizationPolicy, MemoryPolicyStore, PolicyProvider, PolicyStore};
pub use principal::{Claim, Principal};
pub use requirement::{AuthorizationRequirement, PermissionRequirement};
pub use service::{AuditEntry, AuthorizationDecision, AuthorizationService};
