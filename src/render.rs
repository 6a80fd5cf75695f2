//! Pluggable rendering for the "quota exceeded" takeover page.

use std::collections::HashMap;

use crate::error::RenderError;
use crate::snapshot::QuotaSnapshot;

/// Renders the configured rejection view into a response body.
///
/// `probe` lets the lifecycle verify the view at startup instead of
/// discovering a broken template at the first 429.
pub trait RejectionRenderer: Send + Sync {
    /// Verify that `view` can be rendered.
    fn probe(&self, view: &str) -> Result<(), RenderError>;

    /// Render `view` with the snapshot's `total`, `remaining`, and `reset`.
    fn render(&self, view: &str, snapshot: &QuotaSnapshot) -> Result<String, RenderError>;
}

/// Minimal renderer over in-memory templates with `{total}`, `{remaining}`
/// and `{reset}` placeholders. Production deployments plug in their own
/// template engine.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, String>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, view: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(view.into(), body.into());
        self
    }
}

impl RejectionRenderer for StaticTemplates {
    fn probe(&self, view: &str) -> Result<(), RenderError> {
        if self.templates.contains_key(view) {
            Ok(())
        } else {
            Err(RenderError::UnknownView(view.to_string()))
        }
    }

    fn render(&self, view: &str, snapshot: &QuotaSnapshot) -> Result<String, RenderError> {
        let template =
            self.templates.get(view).ok_or_else(|| RenderError::UnknownView(view.to_string()))?;
        Ok(template
            .replace("{total}", &snapshot.total.to_string())
            .replace("{remaining}", &snapshot.reported_remaining().to_string())
            .replace("{reset}", &snapshot.reset.to_string()))
    }
}
