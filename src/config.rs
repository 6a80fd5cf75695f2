//! Server-wide and per-route admission configuration.

use std::time::Duration;

/// Pipeline stage at which admission runs.
///
/// Admission itself does not register hooks; the framework adapter reads
/// this when wiring the layer into its request lifecycle. The default runs
/// after authentication so authenticated identity is available for
/// user-scoped quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtensionPoint {
    OnRequest,
    PreAuthentication,
    #[default]
    PostAuthentication,
    PreHandler,
}

impl std::fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OnRequest => "on-request",
            Self::PreAuthentication => "pre-authentication",
            Self::PostAuthentication => "post-authentication",
            Self::PreHandler => "pre-handler",
        };
        f.write_str(name)
    }
}

/// What to do when the quota store round trip fails.
///
/// The engine never retries; it either surfaces the failure (requests do
/// not silently bypass admission) or lets the request through unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreFailurePolicy {
    /// Surface the store failure as a server error.
    #[default]
    FailClosed,
    /// Admit the request without a quota check or quota headers.
    FailOpen,
}

/// Optional per-route override attached to route metadata.
///
/// A populated override models endpoint cost and takes precedence over the
/// holder's personal limit, which models holder trust.
///
/// This is the complete per-route surface: the store contract is the typed
/// `check(id, max, window, namespace)`, so there are no opaque fields
/// forwarded to the store beyond these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteQuotaOverride {
    /// Max attempts per window for this route.
    pub max: Option<u64>,
    /// Window duration for this route.
    pub duration: Option<Duration>,
    /// Enables or disables admission for this route, overriding the
    /// server-wide setting in either direction.
    pub enabled: Option<bool>,
}

impl RouteQuotaOverride {
    /// Whether this override carries its own limits (as opposed to only
    /// toggling `enabled`). Routes with their own limits get an
    /// independently scoped counter.
    ///
    /// A duration-only override counts as limiting: it changes the window
    /// shape, and sharing the holder's global counter across two window
    /// durations would corrupt both.
    pub fn limits_requests(&self) -> bool {
        self.max.is_some() || self.duration.is_some()
    }
}

/// Server-wide admission configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitorConfig {
    /// Default max attempts per window. Default 60.
    pub max: u64,
    /// Default window duration. Default 60 seconds.
    pub duration: Duration,
    /// Key prefix isolating deployments sharing one store. Default
    /// `"rate-limitor"`.
    pub namespace: String,
    /// Whether admission runs at all; routes may override either way.
    pub enabled: bool,
    /// Exact-match origins that are never rate limited. Their responses
    /// carry no quota headers and fire no events.
    pub ip_whitelist: Vec<String>,
    /// Credentials attribute naming the quota holder. Default `"id"`.
    pub user_attribute: String,
    /// Credentials attribute carrying the holder's personal limit.
    /// Default `"rateLimit"`.
    pub user_limit_attribute: String,
    /// Rejection view rendered instead of the structured 429 error.
    pub view: Option<String>,
    /// Pipeline stage hint for the framework adapter.
    pub extension_point: ExtensionPoint,
    /// Fail-open or fail-closed on store failure.
    pub store_failure: StoreFailurePolicy,
}

impl Default for RateLimitorConfig {
    fn default() -> Self {
        Self {
            max: 60,
            duration: Duration::from_secs(60),
            namespace: "rate-limitor".into(),
            enabled: true,
            ip_whitelist: Vec::new(),
            user_attribute: "id".into(),
            user_limit_attribute: "rateLimit".into(),
            view: None,
            extension_point: ExtensionPoint::default(),
            store_failure: StoreFailurePolicy::default(),
        }
    }
}

impl RateLimitorConfig {
    pub fn builder() -> RateLimitorConfigBuilder {
        RateLimitorConfigBuilder::default()
    }
}

/// Builder for [`RateLimitorConfig`].
#[derive(Debug, Default)]
pub struct RateLimitorConfigBuilder {
    config: RateLimitorConfig,
}

impl RateLimitorConfigBuilder {
    pub fn max(mut self, max: u64) -> Self {
        self.config.max = max;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn ip_whitelist<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ip_whitelist = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn user_attribute(mut self, name: impl Into<String>) -> Self {
        self.config.user_attribute = name.into();
        self
    }

    pub fn user_limit_attribute(mut self, name: impl Into<String>) -> Self {
        self.config.user_limit_attribute = name.into();
        self
    }

    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.config.view = Some(view.into());
        self
    }

    pub fn extension_point(mut self, point: ExtensionPoint) -> Self {
        self.config.extension_point = point;
        self
    }

    pub fn store_failure(mut self, policy: StoreFailurePolicy) -> Self {
        self.config.store_failure = policy;
        self
    }

    pub fn build(self) -> RateLimitorConfig {
        self.config
    }
}
