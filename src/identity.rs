//! Quota-holder identity resolution.

use crate::request::{CredentialLens, QuotaRequest};

/// Derives the identity key scoping a request's counter.
///
/// Authenticated holders are keyed by their identity attribute; everyone
/// else by network origin. Routes that carry their own limits get a
/// route-qualified key, so a route override never consumes quota from the
/// holder's default counter.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    lens: CredentialLens,
}

impl IdentityResolver {
    pub fn new(lens: CredentialLens) -> Self {
        Self { lens }
    }

    /// Resolve the identity key. `origin` is the already-resolved network
    /// origin; the engine resolves it once per request and reuses it for
    /// the allow-list check.
    pub fn resolve(&self, request: &dyn QuotaRequest, origin: &str) -> String {
        let base = request
            .credentials()
            .filter(|credentials| self.lens.applies_to(*credentials))
            .and_then(|credentials| self.lens.identity(credentials))
            .unwrap_or_else(|| origin.to_string());

        let route = request.route();
        match &route.quota {
            Some(quota) if quota.limits_requests() => format!("{}:{}", route.path, base),
            _ => base,
        }
    }
}
