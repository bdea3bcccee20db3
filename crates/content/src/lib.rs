//! Authored content: bundles of scenes plus game configuration.
//!
//! Bundles are read from YAML or JSON, chosen by file extension. A bundle
//! is validated before a session starts from it; only unplayable content
//! is rejected, everything else is reported as a warning.
//!
//! # Layout
//! ```text
//! version: 1
//! name: ...
//! start_scene: hall      # optional, first scene otherwise
//! config: { ... }        # GameConfig
//! runtime: { ... }       # SessionOptions overrides
//! scenes: [ ... ]        # SceneData
//! ```

mod bundle;
mod validate;

pub use bundle::{BUNDLE_SCHEMA_VERSION, ContentBundle, Format};
pub use validate::{ContentWarning, ValidationReport};

use playspace_common::SceneId;
use playspace_kernel::SessionError;
use std::path::PathBuf;

/// Errors from loading or validating content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported content file '{}': expected .yaml, .yml or .json", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("bundle contains no scenes")]
    NoScenes,
    #[error("no scene has a spawn point")]
    NoSpawnPoints,
    #[error("start scene '{0}' does not exist")]
    UnknownStartScene(SceneId),
    #[error("start scene '{0}' has no spawn points")]
    StartSceneWithoutSpawns(SceneId),
    #[error("scene id '{0}' is used more than once")]
    DuplicateScene(SceneId),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn crate_info() -> &'static str {
    "playspace-content v0.1.0"
}
