//! Admission lifecycle events.
//!
//! Emission is awaited by the engine: a listener runs to completion before
//! admission continues, so listeners can audit or veto at the cost of
//! adding their latency to the request. A listener error fails the
//! admission step for that request. No timeout is imposed here; listeners
//! needing bounded latency must enforce it themselves.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::origin::BoxError;
use crate::request::QuotaRequest;

/// Event name for each admission attempt. Fired before the quota check.
pub const ATTEMPT_EVENT: &str = "rate-limit:attempt";
/// Event name when the request fits its quota.
pub const IN_QUOTA_EVENT: &str = "rate-limit:in-quota";
/// Event name when the request exceeds its quota.
pub const EXCEEDED_EVENT: &str = "rate-limit:exceeded";

/// Admission lifecycle events, delivered with the request as payload.
///
/// For any single request, `Attempt` is always observed before `InQuota`
/// or `Exceeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaEvent {
    Attempt,
    InQuota,
    Exceeded,
}

impl QuotaEvent {
    /// The wire name of this event. Names are a public contract.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Attempt => ATTEMPT_EVENT,
            Self::InQuota => IN_QUOTA_EVENT,
            Self::Exceeded => EXCEEDED_EVENT,
        }
    }
}

impl std::fmt::Display for QuotaEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Consumer of admission events.
///
/// Injected at construction; there is no process-global fallback bus. The
/// default is [`NoopSink`].
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: QuotaEvent, request: &dyn QuotaRequest) -> Result<(), BoxError>;
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn emit(&self, _event: QuotaEvent, _request: &dyn QuotaRequest) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Delivers each event to every registered sink, in registration order.
/// The first sink error aborts delivery and fails the admission step.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl EventSink for FanoutSink {
    async fn emit(&self, event: QuotaEvent, request: &dyn QuotaRequest) -> Result<(), BoxError> {
        for sink in &self.sinks {
            sink.emit(event, request).await?;
        }
        Ok(())
    }
}

/// Locally scoped event bus over a tokio broadcast channel.
///
/// An alternative to injecting a bespoke sink: subscribers receive the
/// event names as they fire. Lagged or absent subscribers never fail
/// admission; this bus is observe-only, unlike a custom [`EventSink`]
/// which can veto.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<&'static str>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<&'static str> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl EventSink for BroadcastBus {
    async fn emit(&self, event: QuotaEvent, _request: &dyn QuotaRequest) -> Result<(), BoxError> {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(event.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_stable() {
        assert_eq!(QuotaEvent::Attempt.name(), "rate-limit:attempt");
        assert_eq!(QuotaEvent::InQuota.name(), "rate-limit:in-quota");
        assert_eq!(QuotaEvent::Exceeded.name(), "rate-limit:exceeded");
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(QuotaEvent::Exceeded.to_string(), "rate-limit:exceeded");
    }

    struct StubRequest {
        route: crate::request::RouteSettings,
    }

    impl QuotaRequest for StubRequest {
        fn remote_addr(&self) -> &str {
            "10.0.0.1"
        }
        fn header(&self, _name: &str) -> Option<&str> {
            None
        }
        fn route(&self) -> &crate::request::RouteSettings {
            &self.route
        }
        fn credentials(&self) -> Option<&dyn crate::request::Credentials> {
            None
        }
        fn quota(&self) -> Option<&crate::snapshot::QuotaSnapshot> {
            None
        }
        fn set_quota(&mut self, _snapshot: crate::snapshot::QuotaSnapshot) {}
    }

    #[tokio::test]
    async fn broadcast_bus_forwards_event_names() {
        let bus = BroadcastBus::new(4);
        let mut rx = bus.subscribe();
        let request = StubRequest { route: crate::request::RouteSettings::new("/") };

        bus.emit(QuotaEvent::Attempt, &request).await.unwrap();
        bus.emit(QuotaEvent::Exceeded, &request).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "rate-limit:attempt");
        assert_eq!(rx.recv().await.unwrap(), "rate-limit:exceeded");
    }

    #[tokio::test]
    async fn broadcast_bus_without_subscribers_never_fails_admission() {
        let bus = BroadcastBus::default();
        let request = StubRequest { route: crate::request::RouteSettings::new("/") };
        assert!(bus.emit(QuotaEvent::InQuota, &request).await.is_ok());
    }
}
