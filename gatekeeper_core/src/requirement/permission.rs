//! Permission requirement.

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::AuthorizationRequirement;
use crate::error::{GatekeeperError, Result};

/// Separator between permission names in a raw permission string.
const PERMISSION_SEPARATOR: char = ',';

/// A requirement that the principal holds a set of permissions.
///
/// Built from a comma-separated string such as `"orders.read, orders.write"`.
/// Every stored permission is non-empty and trimmed. Order of appearance is
/// kept and duplicates are not removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionRequirement {
    permissions: Vec<String>,
}

impl PermissionRequirement {
    /// Build a requirement from a raw permission string that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`GatekeeperError::InvalidArgument`] when `raw` is `None`.
    /// Present but empty strings are valid and produce an empty requirement.
    pub fn from_raw(raw: Option<&str>) -> Result<Self> {
        let raw = raw.ok_or_else(|| {
            GatekeeperError::InvalidArgument("permissions must not be absent".to_string())
        })?;

        Ok(Self::parse(raw))
    }

    /// Build a requirement from a raw permission string.
    pub fn parse(raw: &str) -> Self {
        let permissions: Vec<String> = raw
            .split(PERMISSION_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        debug!("Parsed {} permission(s) from {:?}", permissions.len(), raw);

        Self { permissions }
    }

    /// The parsed permission names, in order of appearance.
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Iterate over the permission names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Check whether `permission` is listed, compared exactly.
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Number of permissions, duplicates included.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Whether no permissions are listed.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl AuthorizationRequirement for PermissionRequirement {
    fn name(&self) -> &str {
        "permission"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl FromStr for PermissionRequirement {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for PermissionRequirement {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for PermissionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.permissions.join(","))
    }
}
