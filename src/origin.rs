//! Network-origin resolution for anonymous quota holders.

use async_trait::async_trait;

use crate::request::QuotaRequest;

/// Boxed error for pluggable collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Resolves the network origin of a request.
///
/// Pluggable because deployments differ in how the client address reaches
/// the service (load balancers, proxies). Resolution may consult async
/// sources; the engine awaits it before any quota decision.
#[async_trait]
pub trait OriginResolver: Send + Sync {
    async fn origin(&self, request: &dyn QuotaRequest) -> Result<String, BoxError>;
}

/// Default resolver: standard forwarding headers first, then the peer
/// address.
///
/// `X-Forwarded-For` may carry a comma-separated chain; the first non-empty
/// entry is the original client. Deployments whose balancer appends the
/// client last (Heroku, AWS ELB) should supply their own resolver.
#[derive(Debug, Clone, Default)]
pub struct ForwardedHeaderOrigin;

#[async_trait]
impl OriginResolver for ForwardedHeaderOrigin {
    async fn origin(&self, request: &dyn QuotaRequest) -> Result<String, BoxError> {
        if let Some(chain) = request.header("x-forwarded-for") {
            if let Some(client) = chain.split(',').map(str::trim).find(|part| !part.is_empty()) {
                return Ok(client.to_string());
            }
        }
        if let Some(real_ip) = request.header("x-real-ip") {
            let real_ip = real_ip.trim();
            if !real_ip.is_empty() {
                return Ok(real_ip.to_string());
            }
        }
        Ok(request.remote_addr().to_string())
    }
}
