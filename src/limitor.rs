//! The rate limitor facade: construction and lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::annotate::ResponseAnnotator;
use crate::config::RateLimitorConfig;
use crate::engine::{AdmissionEngine, NeverSkip, SkipPolicy};
use crate::error::{AdmissionError, ConfigError, StoreError};
use crate::events::{EventSink, NoopSink};
use crate::identity::IdentityResolver;
use crate::middleware::RateLimitLayer;
use crate::origin::{ForwardedHeaderOrigin, OriginResolver};
use crate::policy::QuotaPolicyResolver;
use crate::render::RejectionRenderer;
use crate::request::CredentialLens;
use crate::response::{ErrorResponse, PipelineResponse, SuccessResponse};
use crate::snapshot::QuotaSnapshot;
use crate::store::{InMemoryQuotaStore, QuotaStore};

/// Admission control for a request pipeline.
///
/// Bundles the engine, the response annotator, and the store lifecycle.
/// Construct one via [`builder`](Self::builder), wrap it in an `Arc`, call
/// [`start`](Self::start) before accepting traffic, and register
/// [`layer`](Self::layer) with the pipeline.
pub struct RateLimitor {
    config: RateLimitorConfig,
    engine: AdmissionEngine,
    annotator: ResponseAnnotator,
    renderer: Option<Arc<dyn RejectionRenderer>>,
    store: Arc<dyn QuotaStore>,
    started: AtomicBool,
}

impl RateLimitor {
    pub fn builder(config: RateLimitorConfig) -> RateLimitorBuilder {
        RateLimitorBuilder {
            config,
            store: None,
            origin: Arc::new(ForwardedHeaderOrigin),
            skip: Arc::new(NeverSkip),
            sink: Arc::new(NoopSink),
            renderer: None,
        }
    }

    /// Open the store connection, probing the rejection view first so a
    /// broken template fails startup rather than the first 429. The store
    /// connection stays lazy until this call.
    pub async fn start(&self) -> Result<(), ConfigError> {
        if let Some(view) = &self.config.view {
            let renderer = self.renderer.as_ref().ok_or_else(|| ConfigError::View {
                view: view.clone(),
                reason: "no rejection renderer configured".into(),
            })?;
            renderer.probe(view).map_err(|e| ConfigError::View {
                view: view.clone(),
                reason: e.to_string(),
            })?;
        }

        self.store.connect().await.map_err(ConfigError::Store)?;
        self.started.store(true, Ordering::SeqCst);
        tracing::info!(extension_point = %self.config.extension_point, "rate limitor started");
        Ok(())
    }

    /// Close the store connection. Safe to call without a successful
    /// `start`, and safe to call repeatedly.
    pub async fn stop(&self) -> Result<(), StoreError> {
        self.store.close().await?;
        self.started.store(false, Ordering::SeqCst);
        tracing::info!("rate limitor stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RateLimitorConfig {
        &self.config
    }

    pub fn engine(&self) -> &AdmissionEngine {
        &self.engine
    }

    pub fn annotator(&self) -> &ResponseAnnotator {
        &self.annotator
    }

    /// The tower layer enforcing admission around a service.
    pub fn layer(self: Arc<Self>) -> RateLimitLayer {
        RateLimitLayer::new(self)
    }

    /// Build the rejection for an exceeded request: the rendered takeover
    /// page when a view is configured, the structured 429 error otherwise.
    pub(crate) fn reject<B: From<String>>(
        &self,
        snapshot: &QuotaSnapshot,
    ) -> Result<PipelineResponse<B>, AdmissionError> {
        match (&self.config.view, &self.renderer) {
            (Some(view), Some(renderer)) => {
                let body = renderer.render(view, snapshot)?;
                Ok(PipelineResponse::Success(SuccessResponse::new(B::from(body)).with_status(429)))
            }
            _ => Ok(PipelineResponse::Error(ErrorResponse::too_many_requests())),
        }
    }
}

/// Builder wiring collaborators into a [`RateLimitor`].
///
/// Every collaborator has a default: in-memory store, forwarded-header
/// origin resolution, never-skip, no-op event sink, no renderer.
pub struct RateLimitorBuilder {
    config: RateLimitorConfig,
    store: Option<Arc<dyn QuotaStore>>,
    origin: Arc<dyn OriginResolver>,
    skip: Arc<dyn SkipPolicy>,
    sink: Arc<dyn EventSink>,
    renderer: Option<Arc<dyn RejectionRenderer>>,
}

impl RateLimitorBuilder {
    pub fn store(mut self, store: Arc<dyn QuotaStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn origin_resolver(mut self, origin: Arc<dyn OriginResolver>) -> Self {
        self.origin = origin;
        self
    }

    pub fn skip_policy(mut self, skip: Arc<dyn SkipPolicy>) -> Self {
        self.skip = skip;
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn RejectionRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> RateLimitor {
        let config = self.config;
        let lens =
            CredentialLens::new(config.user_attribute.clone(), config.user_limit_attribute.clone());
        let store = self.store.unwrap_or_else(|| Arc::new(InMemoryQuotaStore::default()));

        let engine = AdmissionEngine::new(
            config.enabled,
            config.ip_whitelist.clone(),
            config.store_failure,
            IdentityResolver::new(lens.clone()),
            QuotaPolicyResolver::new(config.max, config.duration, config.namespace.clone(), lens),
            self.origin,
            self.skip,
            self.sink,
            Arc::clone(&store),
        );

        RateLimitor {
            config,
            engine,
            annotator: ResponseAnnotator::new(),
            renderer: self.renderer,
            store,
            started: AtomicBool::new(false),
        }
    }
}
