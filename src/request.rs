//! Request-side seams: what admission needs to know about a request.

use crate::config::RouteQuotaOverride;
use crate::snapshot::QuotaSnapshot;

/// Attributes of an authenticated principal, read-only.
///
/// The core never enumerates credentials; it reads exactly two configured
/// attribute names through a [`CredentialLens`].
pub trait Credentials: Send + Sync {
    /// Look up one attribute by name. Values are opaque strings.
    fn attribute(&self, name: &str) -> Option<String>;
}

/// Route metadata visible to admission.
#[derive(Debug, Clone, Default)]
pub struct RouteSettings {
    /// Route path, used to namespace route-scoped counters.
    pub path: String,
    /// Optional per-route quota override.
    pub quota: Option<RouteQuotaOverride>,
}

impl RouteSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), quota: None }
    }

    pub fn with_quota(mut self, quota: RouteQuotaOverride) -> Self {
        self.quota = Some(quota);
        self
    }
}

/// The request surface admission operates on.
///
/// Framework adapters implement this for their request type. The quota slot
/// carries the snapshot from the admission stage to the annotation stage;
/// it is owned by the request's processing scope and never shared across
/// requests.
pub trait QuotaRequest: Send + Sync {
    /// The transport-level peer address.
    fn remote_addr(&self) -> &str;

    /// A request header value, if present. Lookups are case-insensitive on
    /// the adapter side.
    fn header(&self, name: &str) -> Option<&str>;

    /// Metadata of the matched route.
    fn route(&self) -> &RouteSettings;

    /// Authenticated credentials, if any.
    fn credentials(&self) -> Option<&dyn Credentials>;

    /// The snapshot attached by admission, if admission ran.
    fn quota(&self) -> Option<&QuotaSnapshot>;

    /// Attach the admission snapshot for later pipeline stages.
    fn set_quota(&mut self, snapshot: QuotaSnapshot);
}

/// Reads the identity and personal-limit attributes off credentials.
///
/// Attribute names are fixed at construction, so call sites never do
/// stringly-typed lookups.
#[derive(Debug, Clone)]
pub struct CredentialLens {
    user_attribute: String,
    user_limit_attribute: String,
}

impl CredentialLens {
    pub fn new(user_attribute: impl Into<String>, user_limit_attribute: impl Into<String>) -> Self {
        Self {
            user_attribute: user_attribute.into(),
            user_limit_attribute: user_limit_attribute.into(),
        }
    }

    /// The holder identity, if the attribute is present and non-empty.
    pub fn identity(&self, credentials: &dyn Credentials) -> Option<String> {
        credentials.attribute(&self.user_attribute).filter(|value| !value.is_empty())
    }

    /// The holder's personal limit, if present and a positive integer.
    pub fn quota(&self, credentials: &dyn Credentials) -> Option<u64> {
        credentials
            .attribute(&self.user_limit_attribute)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|limit| *limit > 0)
    }

    /// Whether these credentials identify a quota holder: both attributes
    /// present and usable. Absence of either means "not an authenticated
    /// quota holder" and the request falls back to origin-scoped limiting.
    pub fn applies_to(&self, credentials: &dyn Credentials) -> bool {
        self.identity(credentials).is_some() && self.quota(credentials).is_some()
    }
}
