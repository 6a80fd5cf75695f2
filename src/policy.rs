//! Effective quota resolution: which limits apply to this request.

use std::time::Duration;

use crate::request::{CredentialLens, QuotaRequest};

/// Resolved per-request input to the store call. Produced fresh per request,
/// never cached: identity and route differ every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveQuotaConfig {
    /// Opaque key scoping the holder's counter.
    pub identity_key: String,
    /// Max attempts in one window.
    pub max_attempts: u64,
    /// Window duration.
    pub window: Duration,
    /// Key prefix isolating deployments sharing one store.
    pub namespace: String,
}

/// Resolves the effective `(max, duration)` for a request.
///
/// Precedence, highest first: route override, authenticated holder's
/// personal limit, server default. The precedence chain is an explicit
/// ordered resolution rather than config merging, so each step is testable
/// in isolation. On routes with an override, the holder's personal limit is
/// ignored entirely: route limits model endpoint cost, user limits model
/// holder trust.
#[derive(Debug, Clone)]
pub struct QuotaPolicyResolver {
    default_max: u64,
    default_window: Duration,
    namespace: String,
    lens: CredentialLens,
}

impl QuotaPolicyResolver {
    pub fn new(
        default_max: u64,
        default_window: Duration,
        namespace: impl Into<String>,
        lens: CredentialLens,
    ) -> Self {
        Self { default_max, default_window, namespace: namespace.into(), lens }
    }

    pub fn resolve(&self, request: &dyn QuotaRequest, identity_key: String) -> EffectiveQuotaConfig {
        if let Some(route) = request.route().quota.as_ref().filter(|q| q.limits_requests()) {
            return EffectiveQuotaConfig {
                identity_key,
                max_attempts: route.max.unwrap_or(self.default_max),
                window: route.duration.unwrap_or(self.default_window),
                namespace: self.namespace.clone(),
            };
        }

        let max_attempts = request
            .credentials()
            .filter(|credentials| self.lens.applies_to(*credentials))
            .and_then(|credentials| self.lens.quota(credentials))
            .unwrap_or(self.default_max);

        EffectiveQuotaConfig {
            identity_key,
            max_attempts,
            window: self.default_window,
            namespace: self.namespace.clone(),
        }
    }
}
