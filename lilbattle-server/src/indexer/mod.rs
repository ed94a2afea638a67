//! Screenshot Indexing
//!
//! Commits enqueue a snapshot of the world; a background worker renders it and a
//! completion handler writes the result back only if the game has not moved on.
//!
//! ## Module Structure
//!
//! - `render`: Renderer seam and render errors
//! - `worker`: Coalescing tokio worker behind the [`Indexer`] trait
//! - `completion`: Version-gated write-back of finished items

pub mod completion;
pub mod render;
pub mod worker;

use std::fmt;

use async_trait::async_trait;

use crate::model::WorldData;

// Re-export key types
pub use completion::VersionGatedCompletion;
pub use render::{NoopRenderer, RenderError, ScreenshotRenderer};
pub use worker::{IndexerConfig, ScreenshotIndexer};

/// What kind of record an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Game state snapshots.
    Games,
    /// World editor snapshots.
    Worlds,
}

impl IndexKind {
    /// Kind label used in paths and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Games => "games",
            IndexKind::Worlds => "worlds",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of indexing work.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenShotItem {
    /// Record kind.
    pub kind: IndexKind,
    /// Record id.
    pub id: String,
    /// State version the snapshot was taken at.
    pub version: i64,
    /// World snapshot to render.
    pub world_data: WorldData,
    /// Render failures, one entry per failed theme.
    pub theme_errors: Vec<String>,
}

impl ScreenShotItem {
    /// Fresh item with no errors.
    pub fn new(kind: IndexKind, id: impl Into<String>, version: i64, world_data: WorldData) -> Self {
        Self {
            kind,
            id: id.into(),
            version,
            world_data,
            theme_errors: Vec::new(),
        }
    }

    /// Whether any theme failed to render.
    pub fn has_errors(&self) -> bool {
        !self.theme_errors.is_empty()
    }
}

/// Enqueue side of the indexer. Never blocks the caller.
pub trait Indexer: Send + Sync {
    /// Queue a snapshot for rendering.
    fn send(&self, kind: IndexKind, id: &str, version: i64, world_data: WorldData);
}

/// Receives finished batches.
#[async_trait]
pub trait IndexCompletion: Send + Sync {
    /// Handle a rendered batch.
    async fn on_complete(&self, items: Vec<ScreenShotItem>);
}
