//! Tower middleware enforcing admission around a service.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower_layer::Layer;
use tower_service::Service;

use crate::engine::Admission;
use crate::error::RateLimitError;
use crate::limitor::RateLimitor;
use crate::request::QuotaRequest;
use crate::response::PipelineResponse;

/// Layer wrapping a service with a [`RateLimitor`].
#[derive(Clone)]
pub struct RateLimitLayer {
    limitor: Arc<RateLimitor>,
}

impl RateLimitLayer {
    pub fn new(limitor: Arc<RateLimitor>) -> Self {
        Self { limitor }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService { inner: service, limitor: Arc::clone(&self.limitor) }
    }
}

/// Middleware running admission before the inner service and annotation
/// after it.
///
/// Skipped requests pass through untouched. In-quota requests reach the
/// inner service and their response, success or error shaped, gains the
/// quota headers. Exceeded requests never reach the inner service: the
/// middleware short-circuits with the takeover page or the structured 429
/// error, annotated like any other response.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limitor: Arc<RateLimitor>,
}

impl<S, R, B> Service<R> for RateLimitService<S>
where
    R: QuotaRequest + Send + 'static,
    B: From<String> + Send + 'static,
    S: Service<R, Response = PipelineResponse<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = PipelineResponse<B>;
    type Error = RateLimitError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(RateLimitError::Inner)
    }

    fn call(&mut self, mut request: R) -> Self::Future {
        let limitor = Arc::clone(&self.limitor);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let admission = limitor.engine().admit(&mut request).await?;
            match admission {
                Admission::Skipped => inner.call(request).await.map_err(RateLimitError::Inner),
                Admission::InQuota(snapshot) => {
                    let response = inner.call(request).await.map_err(RateLimitError::Inner)?;
                    Ok(limitor.annotator().annotate_with(&snapshot, response))
                }
                Admission::Exceeded(snapshot) => {
                    let rejection = limitor.reject::<B>(&snapshot)?;
                    Ok(limitor.annotator().annotate_with(&snapshot, rejection))
                }
            }
        })
    }
}
