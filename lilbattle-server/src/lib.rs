//! # LilBattle Game Server
//!
//! State synchronization and consistency layer for LilBattle games.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LILBATTLE SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  service/        - Games facade                              │
//! │  ├── backend.rs  - Cache-aside reads, move commit protocol   │
//! │  ├── singleton.rs- Single-game in-process variant            │
//! │  ├── cache.rs    - Triad + runtime game cache                │
//! │  └── create.rs   - Creation checks, starting economy         │
//! │                                                              │
//! │  storage/        - Durable persistence                       │
//! │  ├── memory.rs   - In-process provider                       │
//! │  └── file.rs     - JSON records + binary move log            │
//! │                                                              │
//! │  indexer/        - Screenshot pipeline                       │
//! │  ├── worker.rs   - Coalescing background worker              │
//! │  ├── render.rs   - Renderer seam                             │
//! │  └── completion.rs - Version-gated write-back                │
//! │                                                              │
//! │  sync/           - Live viewers                              │
//! │  ├── service.rs  - Per-game broadcast channels               │
//! │  ├── protocol.rs - Update messages                           │
//! │  └── hook.rs     - Post-commit broadcast                     │
//! │                                                              │
//! │  model/          - Game, state, world, history records       │
//! │  rules/          - Income, world migration, unit top-up      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! - Storage is authoritative; the cache only mirrors it.
//! - Every gameplay state write stores `version = stored + 1`.
//! - Move groups are written before the state that references them, so a
//!   crash between the two leaves an orphan group that the next commit drops.
//! - Screenshot results are applied only while the state version still matches.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod indexer;
pub mod model;
pub mod rules;
pub mod service;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use model::{Game, GameMoveGroup, GameMoveHistory, GameState, WorldData};
pub use service::{BackendGamesService, GamesService, ServiceError, SingletonGamesService};
pub use storage::{FileStorage, GameStorageProvider, MemoryStorage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
