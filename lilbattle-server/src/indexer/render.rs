//! Renderer seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::indexer::ScreenShotItem;

/// Render failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The theme is not installed.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    /// The renderer failed.
    #[error("render failed for {id} ({theme}): {reason}")]
    Failed {
        /// Record id.
        id: String,
        /// Theme being rendered.
        theme: String,
        /// Failure detail.
        reason: String,
    },
}

/// Produces screenshot artifacts for a snapshot.
#[async_trait]
pub trait ScreenshotRenderer: Send + Sync {
    /// Render `item` with `theme`.
    async fn render(&self, item: &ScreenShotItem, theme: &str) -> Result<(), RenderError>;
}

/// Renderer that accepts everything and produces nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

#[async_trait]
impl ScreenshotRenderer for NoopRenderer {
    async fn render(&self, _item: &ScreenShotItem, _theme: &str) -> Result<(), RenderError> {
        Ok(())
    }
}
