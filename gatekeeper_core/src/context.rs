//! Per-evaluation authorization state.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::principal::Principal;
use crate::requirement::AuthorizationRequirement;

/// State shared between handlers while one policy is evaluated.
///
/// Handlers mark requirements as succeeded by index; any handler may
/// record an explicit failure, which overrides every success.
#[derive(Debug)]
pub struct AuthorizationContext<'a> {
    principal: &'a Principal,
    requirements: &'a [Arc<dyn AuthorizationRequirement>],
    succeeded: BTreeSet<usize>,
    explained: BTreeSet<usize>,
    failure_reasons: Vec<String>,
    failed: bool,
}

impl<'a> AuthorizationContext<'a> {
    pub fn new(
        principal: &'a Principal,
        requirements: &'a [Arc<dyn AuthorizationRequirement>],
    ) -> Self {
        Self {
            principal,
            requirements,
            succeeded: BTreeSet::new(),
            explained: BTreeSet::new(),
            failure_reasons: Vec::new(),
            failed: false,
        }
    }

    pub fn principal(&self) -> &'a Principal {
        self.principal
    }

    pub fn requirements(&self) -> &'a [Arc<dyn AuthorizationRequirement>] {
        self.requirements
    }

    /// Mark the requirement at `index` as satisfied.
    pub fn succeed(&mut self, index: usize) {
        if index < self.requirements.len() {
            self.succeeded.insert(index);
        }
    }

    /// Record an explicit failure.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failed = true;
        self.failure_reasons.push(reason.into());
    }

    /// Record a failure that explains why the requirement at `index` is unmet.
    pub fn fail_requirement(&mut self, index: usize, reason: impl Into<String>) {
        if index < self.requirements.len() {
            self.explained.insert(index);
        }
        self.fail(reason);
    }

    /// Whether a failure reason was recorded for the requirement at `index`.
    pub fn is_explained(&self, index: usize) -> bool {
        self.explained.contains(&index)
    }

    /// Requirements no handler has marked as satisfied.
    pub fn pending(
        &self,
    ) -> impl Iterator<Item = (usize, &'a Arc<dyn AuthorizationRequirement>)> + '_ {
        self.requirements
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.succeeded.contains(index))
    }

    /// Whether any handler recorded a failure.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Whether every requirement succeeded and nothing failed.
    pub fn has_succeeded(&self) -> bool {
        !self.failed && self.succeeded.len() == self.requirements.len()
    }

    /// Reasons recorded by failing handlers, in order.
    pub fn failure_reasons(&self) -> &[String] {
        &self.failure_reasons
    }
}
