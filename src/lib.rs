#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # rate-limitor
//!
//! Request admission control: per request, resolve who the quota holder is,
//! ask a shared counter whether they have attempts left in the current
//! window, and either let the request through or reject it with a 429.
//! Every response gains `X-Rate-Limit-*` headers either way.
//!
//! ## Features
//!
//! - **Identity resolution**: authenticated-user key or network origin,
//!   with route-scoped counters for routes carrying their own limits
//! - **Quota precedence**: route override > personal user limit > server
//!   default, resolved explicitly per request
//! - **Skip policy**: per-route enable toggle, origin allow-list, and a
//!   pluggable async predicate
//! - **Lifecycle events**: `rate-limit:attempt`, `rate-limit:in-quota`,
//!   `rate-limit:exceeded`, awaited so listeners can audit or veto
//! - **Pluggable store**: any backend implementing [`QuotaStore`]; an
//!   in-memory fixed-window store ships for tests and single processes
//! - **Tower middleware**: [`RateLimitLayer`] wraps admission and response
//!   annotation around a service
//!
//! ## Quick Start
//!
//! ```rust
//! use rate_limitor::{RateLimitor, RateLimitorConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RateLimitorConfig::builder()
//!         .max(100)
//!         .duration(Duration::from_secs(60))
//!         .build();
//!
//!     let limitor = Arc::new(RateLimitor::builder(config).build());
//!     limitor.start().await.expect("store connects");
//!
//!     // Register limitor.layer() with your pipeline, then on shutdown:
//!     limitor.stop().await.expect("store closes");
//! }
//! ```

pub mod annotate;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod identity;
pub mod limitor;
pub mod middleware;
pub mod origin;
pub mod policy;
pub mod render;
pub mod request;
pub mod response;
pub mod snapshot;
pub mod store;

// Re-exports
pub use annotate::ResponseAnnotator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ExtensionPoint, RateLimitorConfig, RateLimitorConfigBuilder, RouteQuotaOverride,
    StoreFailurePolicy,
};
pub use engine::{Admission, AdmissionEngine, NeverSkip, SkipPolicy};
pub use error::{AdmissionError, ConfigError, RateLimitError, RenderError, StoreError};
pub use events::{BroadcastBus, EventSink, FanoutSink, NoopSink, QuotaEvent};
pub use identity::IdentityResolver;
pub use limitor::{RateLimitor, RateLimitorBuilder};
pub use middleware::{RateLimitLayer, RateLimitService};
pub use origin::{BoxError, ForwardedHeaderOrigin, OriginResolver};
pub use policy::{EffectiveQuotaConfig, QuotaPolicyResolver};
pub use render::{RejectionRenderer, StaticTemplates};
pub use request::{CredentialLens, Credentials, QuotaRequest, RouteSettings};
pub use response::{
    ErrorResponse, PipelineResponse, SuccessResponse, EXCEEDED_MESSAGE, LIMIT_HEADER,
    REMAINING_HEADER, RESET_HEADER,
};
pub use snapshot::QuotaSnapshot;
pub use store::{InMemoryQuotaStore, QuotaStore};
