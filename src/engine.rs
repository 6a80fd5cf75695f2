//! The admission decision engine.
//!
//! One request moves through `PENDING → SKIPPED | IN_QUOTA | EXCEEDED`.
//! Skip checks short-circuit in a fixed order: route toggle, origin
//! allow-list, user predicate. Skipped requests emit no events and carry no
//! snapshot. Everything else fires `attempt`, consults the store through
//! the identity and policy resolvers, attaches the snapshot to the request,
//! and classifies the outcome.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StoreFailurePolicy;
use crate::error::AdmissionError;
use crate::events::{EventSink, QuotaEvent};
use crate::identity::IdentityResolver;
use crate::origin::{BoxError, OriginResolver};
use crate::policy::QuotaPolicyResolver;
use crate::request::QuotaRequest;
use crate::snapshot::QuotaSnapshot;
use crate::store::QuotaStore;

/// Terminal admission outcome for one request.
///
/// Exceeding the quota is a designed outcome, not an error; store or
/// listener failures are the error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Admission did not apply; the request proceeds untouched, with no
    /// snapshot and no events.
    Skipped,
    /// The request fits its quota and proceeds.
    InQuota(QuotaSnapshot),
    /// The request exhausted its quota and must be rejected.
    Exceeded(QuotaSnapshot),
}

/// User-supplied predicate deciding whether to skip admission for a
/// request. May consult async sources.
#[async_trait]
pub trait SkipPolicy: Send + Sync {
    async fn should_skip(&self, request: &dyn QuotaRequest) -> Result<bool, BoxError>;
}

/// Default skip policy: never skip.
#[derive(Debug, Clone, Default)]
pub struct NeverSkip;

#[async_trait]
impl SkipPolicy for NeverSkip {
    async fn should_skip(&self, _request: &dyn QuotaRequest) -> Result<bool, BoxError> {
        Ok(false)
    }
}

/// Orchestrates skip checks, resolvers, the store call, and event emission.
pub struct AdmissionEngine {
    enabled: bool,
    ip_whitelist: Vec<String>,
    store_failure: StoreFailurePolicy,
    identity: IdentityResolver,
    policy: QuotaPolicyResolver,
    origin: Arc<dyn OriginResolver>,
    skip: Arc<dyn SkipPolicy>,
    sink: Arc<dyn EventSink>,
    store: Arc<dyn QuotaStore>,
}

impl AdmissionEngine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        enabled: bool,
        ip_whitelist: Vec<String>,
        store_failure: StoreFailurePolicy,
        identity: IdentityResolver,
        policy: QuotaPolicyResolver,
        origin: Arc<dyn OriginResolver>,
        skip: Arc<dyn SkipPolicy>,
        sink: Arc<dyn EventSink>,
        store: Arc<dyn QuotaStore>,
    ) -> Self {
        Self {
            enabled,
            ip_whitelist,
            store_failure,
            identity,
            policy,
            origin,
            skip,
            sink,
            store,
        }
    }

    /// Decide admission for one request.
    ///
    /// On an in-quota or exceeded outcome the snapshot is attached to the
    /// request before returning, so later pipeline stages can annotate the
    /// response. Event emission is awaited: a slow or failing listener
    /// delays or fails this request, deliberately.
    pub async fn admit(&self, request: &mut dyn QuotaRequest) -> Result<Admission, AdmissionError> {
        if !self.route_enabled(request) {
            tracing::debug!(route = %request.route().path, "admission disabled for route");
            return Ok(Admission::Skipped);
        }

        let origin = self
            .origin
            .origin(&*request)
            .await
            .map_err(|e| AdmissionError::Origin(e.to_string()))?;

        if self.ip_whitelist.iter().any(|allowed| *allowed == origin) {
            tracing::debug!(%origin, "origin allow-listed, skipping admission");
            return Ok(Admission::Skipped);
        }

        if self
            .skip
            .should_skip(&*request)
            .await
            .map_err(|e| AdmissionError::Skip(e.to_string()))?
        {
            tracing::debug!("skip predicate opted out of admission");
            return Ok(Admission::Skipped);
        }

        self.emit(QuotaEvent::Attempt, &*request).await?;

        let identity_key = self.identity.resolve(&*request, &origin);
        let config = self.policy.resolve(&*request, identity_key);

        let snapshot = match self
            .store
            .check(&config.identity_key, config.max_attempts, config.window, &config.namespace)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(error) => match self.store_failure {
                StoreFailurePolicy::FailClosed => return Err(error.into()),
                StoreFailurePolicy::FailOpen => {
                    tracing::warn!(%error, "quota store unavailable, admitting unchecked");
                    return Ok(Admission::Skipped);
                }
            },
        };

        request.set_quota(snapshot.clone());

        if snapshot.is_in_quota() {
            tracing::debug!(
                id = %config.identity_key,
                remaining = snapshot.reported_remaining(),
                "request in quota"
            );
            self.emit(QuotaEvent::InQuota, &*request).await?;
            Ok(Admission::InQuota(snapshot))
        } else {
            tracing::debug!(id = %config.identity_key, reset = snapshot.reset, "quota exceeded");
            self.emit(QuotaEvent::Exceeded, &*request).await?;
            Ok(Admission::Exceeded(snapshot))
        }
    }

    /// Route-level `enabled` overrides the server-wide setting in either
    /// direction.
    fn route_enabled(&self, request: &dyn QuotaRequest) -> bool {
        request
            .route()
            .quota
            .as_ref()
            .and_then(|quota| quota.enabled)
            .unwrap_or(self.enabled)
    }

    async fn emit(
        &self,
        event: QuotaEvent,
        request: &dyn QuotaRequest,
    ) -> Result<(), AdmissionError> {
        self.sink
            .emit(event, request)
            .await
            .map_err(|e| AdmissionError::Listener(e.to_string()))
    }
}
