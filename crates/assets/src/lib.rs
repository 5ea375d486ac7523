//! Assets: a static manifest and the resource set loaded from it.
//!
//! Resources are identified by manifest name; loaded bytes are
//! content-addressed. The renderer consumes textures by name and degrades
//! gracefully while they are still pending.
//!
//! # Invariants
//! - Loading never blocks a frame for more than the per-poll budget.
//! - A failed asset is recorded, never retried, never fatal.

mod manifest;
mod resources;

pub use manifest::{AssetKind, AssetManifest, AssetSource};
pub use resources::{AssetId, Progress, Resource, ResourceSet, TextureData};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
}

pub fn crate_info() -> &'static str {
    "horizon-assets v0.1.0"
}
