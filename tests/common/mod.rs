#![allow(dead_code)]

//! Shared doubles for the integration tests.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tower_service::Service;

use rate_limitor::{
    BoxError, Credentials, ErrorResponse, EventSink, InMemoryQuotaStore, ManualClock,
    OriginResolver, PipelineResponse, QuotaEvent, QuotaRequest, QuotaSnapshot, QuotaStore,
    RateLimitor, RateLimitorConfig, RouteQuotaOverride, RouteSettings, SkipPolicy, StoreError,
    SuccessResponse,
};

/// Attribute-map credentials.
pub struct TestCredentials(HashMap<String, String>);

impl Credentials for TestCredentials {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// A pipeline request double with a quota slot.
pub struct TestRequest {
    remote: String,
    headers: HashMap<String, String>,
    route: RouteSettings,
    credentials: Option<TestCredentials>,
    quota: Option<QuotaSnapshot>,
}

impl TestRequest {
    pub fn from_ip(ip: &str) -> Self {
        Self {
            remote: ip.to_string(),
            headers: HashMap::new(),
            route: RouteSettings::new("/"),
            credentials: None,
            quota: None,
        }
    }

    pub fn on_route(mut self, path: &str) -> Self {
        let quota = self.route.quota.take();
        self.route = RouteSettings::new(path);
        self.route.quota = quota;
        self
    }

    pub fn with_route_quota(mut self, quota: RouteQuotaOverride) -> Self {
        self.route.quota = Some(quota);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn authenticated(mut self, attributes: &[(&str, &str)]) -> Self {
        self.credentials = Some(TestCredentials(
            attributes.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        ));
        self
    }
}

impl QuotaRequest for TestRequest {
    fn remote_addr(&self) -> &str {
        &self.remote
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    fn route(&self) -> &RouteSettings {
        &self.route
    }

    fn credentials(&self) -> Option<&dyn Credentials> {
        self.credentials.as_ref().map(|c| c as &dyn Credentials)
    }

    fn quota(&self) -> Option<&QuotaSnapshot> {
        self.quota.as_ref()
    }

    fn set_quota(&mut self, snapshot: QuotaSnapshot) {
        self.quota = Some(snapshot);
    }
}

/// Handler double counting invocations; answers 200 "ok" or a structured
/// 500, depending on construction.
#[derive(Clone, Default)]
pub struct TestHandler {
    pub calls: Arc<AtomicUsize>,
    respond_error: bool,
}

impl TestHandler {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { calls: Arc::new(AtomicUsize::new(0)), respond_error: true }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Service<TestRequest> for TestHandler {
    type Response = PipelineResponse<String>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _request: TestRequest) -> Self::Future {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = if self.respond_error {
            PipelineResponse::Error(ErrorResponse::new(500, "handler failed"))
        } else {
            PipelineResponse::Success(SuccessResponse::new("ok".to_string()))
        };
        ready(Ok(response))
    }
}

/// Records the names of emitted events.
#[derive(Default)]
pub struct CollectingSink {
    names: Mutex<Vec<&'static str>>,
}

impl CollectingSink {
    pub fn names(&self) -> Vec<&'static str> {
        self.names.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn emit(&self, event: QuotaEvent, _request: &dyn QuotaRequest) -> Result<(), BoxError> {
        self.names.lock().unwrap().push(event.name());
        Ok(())
    }
}

/// Fails every emission.
pub struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn emit(&self, _event: QuotaEvent, _request: &dyn QuotaRequest) -> Result<(), BoxError> {
        Err("listener exploded".into())
    }
}

/// Resolves the origin from a bespoke header, falling back to the peer
/// address.
pub struct HeaderOrigin {
    header: &'static str,
}

impl HeaderOrigin {
    pub fn new(header: &'static str) -> Self {
        Self { header }
    }
}

#[async_trait]
impl OriginResolver for HeaderOrigin {
    async fn origin(&self, request: &dyn QuotaRequest) -> Result<String, BoxError> {
        Ok(request
            .header(self.header)
            .map(str::to_string)
            .unwrap_or_else(|| request.remote_addr().to_string()))
    }
}

/// Fails every origin resolution.
pub struct FailingOrigin;

#[async_trait]
impl OriginResolver for FailingOrigin {
    async fn origin(&self, _request: &dyn QuotaRequest) -> Result<String, BoxError> {
        Err("address detector exploded".into())
    }
}

/// Skips every request.
pub struct SkipAll;

#[async_trait]
impl SkipPolicy for SkipAll {
    async fn should_skip(&self, _request: &dyn QuotaRequest) -> Result<bool, BoxError> {
        Ok(true)
    }
}

/// Store whose checks always fail.
pub struct FailingStore;

#[async_trait]
impl QuotaStore for FailingStore {
    async fn check(
        &self,
        _id: &str,
        _max: u64,
        _window: Duration,
        _namespace: &str,
    ) -> Result<QuotaSnapshot, StoreError> {
        Err(StoreError::Unavailable("injected outage".into()))
    }

    async fn connect(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store counting lifecycle calls.
#[derive(Default)]
pub struct CountingStore {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub fail_connect: bool,
}

impl CountingStore {
    pub fn failing_connect() -> Self {
        Self { fail_connect: true, ..Default::default() }
    }
}

#[async_trait]
impl QuotaStore for CountingStore {
    async fn check(
        &self,
        _id: &str,
        max: u64,
        _window: Duration,
        _namespace: &str,
    ) -> Result<QuotaSnapshot, StoreError> {
        Ok(QuotaSnapshot { total: max, remaining: max, reset: 0 })
    }

    async fn connect(&self) -> Result<(), StoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            Err(StoreError::Connection("refused".into()))
        } else {
            Ok(())
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A limitor on a manually clocked in-memory store.
pub fn clocked_limitor(config: RateLimitorConfig, clock: &ManualClock) -> Arc<RateLimitor> {
    let store = InMemoryQuotaStore::new(Arc::new(clock.clone()));
    Arc::new(RateLimitor::builder(config).store(Arc::new(store)).build())
}
