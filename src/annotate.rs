//! Quota header annotation for outgoing responses.

use crate::request::QuotaRequest;
use crate::response::{PipelineResponse, LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER};
use crate::snapshot::QuotaSnapshot;

/// Writes quota state onto every response, success or error.
///
/// Runs after the handler (or the takeover rejection) produced a response.
/// Requests without an attached snapshot pass through untouched: admission
/// was skipped, or never ran at all (an unmatched route, for instance).
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAnnotator;

impl ResponseAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Annotate from the request's attached snapshot.
    pub fn annotate<B>(
        &self,
        request: &dyn QuotaRequest,
        response: PipelineResponse<B>,
    ) -> PipelineResponse<B> {
        match request.quota() {
            Some(snapshot) => self.annotate_with(snapshot, response),
            None => response,
        }
    }

    /// Annotate with a known snapshot. The success shape takes headers
    /// through its fluent setter; the error shape through its nested
    /// output-header map.
    pub fn annotate_with<B>(
        &self,
        snapshot: &QuotaSnapshot,
        response: PipelineResponse<B>,
    ) -> PipelineResponse<B> {
        let remaining = snapshot.reported_remaining();
        match response {
            PipelineResponse::Success(success) => PipelineResponse::Success(
                success
                    .header(LIMIT_HEADER, snapshot.total.to_string())
                    .header(REMAINING_HEADER, remaining.to_string())
                    .header(RESET_HEADER, snapshot.reset.to_string()),
            ),
            PipelineResponse::Error(mut error) => {
                let headers = &mut error.output.headers;
                headers.insert(LIMIT_HEADER.into(), snapshot.total.to_string());
                headers.insert(REMAINING_HEADER.into(), remaining.to_string());
                headers.insert(RESET_HEADER.into(), snapshot.reset.to_string());
                PipelineResponse::Error(error)
            }
        }
    }
}
