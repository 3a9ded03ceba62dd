//! Storage layer: the model and vectorizer artifacts.
//!
//! Artifacts are bincode payloads sealed with a magic + CRC32 footer and
//! written as a pair (atomic temp-file + rename).

/// Artifact pair save/load with integrity and pairing checks.
pub mod persistence;

pub use persistence::{load_artifacts, save_artifacts, ArtifactPaths, FORMAT_VERSION};
