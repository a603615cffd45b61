//! Authorization requirements.
//!
//! A requirement describes something that must hold for a principal before
//! access is granted. Requirements carry data only; handlers decide whether
//! a principal satisfies them.

mod permission;

pub use permission::PermissionRequirement;

use std::any::Any;
use std::fmt::{Debug, Display};

/// Capability contract for anything a policy can require.
///
/// Implementors are immutable once built and are shared between policies
/// and evaluations behind an `Arc`. `Display` renders the requirement's
/// data for denial reasons.
pub trait AuthorizationRequirement: Debug + Display + Send + Sync {
    /// Short name of the requirement kind, used in logs and audit entries.
    fn name(&self) -> &str;

    /// Access to the concrete type so handlers can pick the requirements
    /// they understand.
    fn as_any(&self) -> &dyn Any;
}
