//! The two response shapes admission annotates.
//!
//! Framework adapters convert these into their transport's response type.
//! Success responses set headers through a fluent setter; structured errors
//! expose a nested output-header map, mirroring how error objects travel
//! through request pipelines. The annotator must handle both shapes, or
//! quota headers silently vanish from error responses.

use std::collections::BTreeMap;

/// Response header reporting the applicable limit.
pub const LIMIT_HEADER: &str = "X-Rate-Limit-Limit";
/// Response header reporting attempts left after this request.
pub const REMAINING_HEADER: &str = "X-Rate-Limit-Remaining";
/// Response header reporting the epoch second the window resets.
pub const RESET_HEADER: &str = "X-Rate-Limit-Reset";

/// Fixed message carried by structured quota-exceeded errors.
pub const EXCEEDED_MESSAGE: &str = "You have exceeded the request limit";

/// A normal success-path response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessResponse<B> {
    status: u16,
    headers: BTreeMap<String, String>,
    body: B,
}

impl<B> SuccessResponse<B> {
    pub fn new(body: B) -> Self {
        Self { status: 200, headers: BTreeMap::new(), body }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Fluent header setter.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &B {
        &self.body
    }
}

/// Header map nested inside a structured error response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorOutput {
    pub headers: BTreeMap<String, String>,
}

/// A structured error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    status: u16,
    message: String,
    /// Outbound metadata; headers set here reach the client.
    pub output: ErrorOutput,
}

impl ErrorResponse {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), output: ErrorOutput::default() }
    }

    /// The structured 429 rejection.
    pub fn too_many_requests() -> Self {
        Self::new(429, EXCEEDED_MESSAGE)
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.output.headers.get(name).map(String::as_str)
    }
}

/// Whatever the pipeline produced for a request: a handler success, a
/// takeover rejection (also success-shaped, with status 429), or a
/// structured error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResponse<B = String> {
    Success(SuccessResponse<B>),
    Error(ErrorResponse),
}

impl<B> PipelineResponse<B> {
    pub fn status(&self) -> u16 {
        match self {
            Self::Success(response) => response.status(),
            Self::Error(error) => error.status(),
        }
    }

    /// Read a header from whichever shape this is.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        match self {
            Self::Success(response) => response.header_value(name),
            Self::Error(error) => error.header_value(name),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl<B> From<SuccessResponse<B>> for PipelineResponse<B> {
    fn from(response: SuccessResponse<B>) -> Self {
        Self::Success(response)
    }
}

impl<B> From<ErrorResponse> for PipelineResponse<B> {
    fn from(error: ErrorResponse) -> Self {
        Self::Error(error)
    }
}
