//! Principals and their claims.

use serde::Serialize;

/// A single statement about a principal, such as a granted permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    /// The kind of claim (e.g. `permission`, `scope`, `role`)
    pub claim_type: String,

    /// The claimed value
    pub value: String,
}

impl Claim {
    /// Create a new claim.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The identity an authorization decision is made for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Principal {
    name: Option<String>,
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Principal {
    /// Create an authenticated principal with no claims.
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            authenticated: true,
            claims: Vec::new(),
        }
    }

    /// Create an unauthenticated principal.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add a claim.
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    /// Name of the principal, if authenticated under one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the principal has been authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// All claims, in the order they were added.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Values of all claims of the given type.
    ///
    /// Claim types compare ASCII case-insensitively.
    pub fn claim_values<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.claims
            .iter()
            .filter(move |claim| claim.claim_type.eq_ignore_ascii_case(claim_type))
            .map(|claim| claim.value.as_str())
    }

    /// Check for a claim with the given type and exact value.
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claim_values(claim_type).any(|v| v == value)
    }

    /// Split whitespace-separated claim values of `claim_type` into one claim per entry.
    ///
    /// OAuth access tokens put every granted scope into a single `scope`
    /// claim; expanding it lets each scope be checked as its own permission.
    pub fn expand_scope_claims(mut self, claim_type: &str) -> Self {
        let mut expanded = Vec::with_capacity(self.claims.len());

        for claim in self.claims.drain(..) {
            let is_list = claim.value.split_whitespace().nth(1).is_some();
            if is_list && claim.claim_type.eq_ignore_ascii_case(claim_type) {
                expanded.extend(
                    claim
                        .value
                        .split_whitespace()
                        .map(|value| Claim::new(claim.claim_type.clone(), value)),
                );
            } else {
                expanded.push(claim);
            }
        }

        self.claims = expanded;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_lookup() {
        let principal = Principal::authenticated("alice")
            .with_claim("permission", "orders.read")
            .with_claim("role", "admin");

        assert!(principal.is_authenticated());
        assert_eq!(principal.name(), Some("alice"));
        assert!(principal.has_claim("permission", "orders.read"));
        assert!(principal.has_claim("Permission", "orders.read"));
        assert!(!principal.has_claim("permission", "Orders.Read"));
        assert!(!principal.has_claim("permission", "admin"));
    }

    #[test]
    fn test_anonymous_principal() {
        let principal = Principal::anonymous();
        assert!(!principal.is_authenticated());
        assert!(principal.name().is_none());
        assert!(principal.claims().is_empty());
    }

    #[test]
    fn test_expand_scope_claims() {
        let principal = Principal::authenticated("svc")
            .with_claim("scope", "orders.read  orders.write")
            .with_claim("scope", "profile")
            .with_claim("name", "Service Account")
            .expand_scope_claims("scope");

        let scopes: Vec<&str> = principal.claim_values("scope").collect();
        assert_eq!(scopes, ["orders.read", "orders.write", "profile"]);
        assert!(principal.has_claim("name", "Service Account"));
    }

    #[test]
    fn test_expand_scope_claims_on_any_whitespace() {
        let principal = Principal::authenticated("svc")
            .with_claim("scope", "orders.read\torders.write\nprofile")
            .expand_scope_claims("scope");

        let scopes: Vec<&str> = principal.claim_values("scope").collect();
        assert_eq!(scopes, ["orders.read", "orders.write", "profile"]);
    }
}
