use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use playspace_common::{GameConfig, SceneData, SceneId};
use playspace_gamestate::ItemCatalog;
use playspace_kernel::{RuntimeSession, SessionOptions};
use playspace_transition::StaticSceneLoader;

use crate::ContentError;
use crate::validate::{ValidationReport, validate};

/// Current bundle schema version.
pub const BUNDLE_SCHEMA_VERSION: u32 = 1;

fn schema_version() -> u32 {
    BUNDLE_SCHEMA_VERSION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ContentError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Everything needed to play: scenes, game rules and runtime tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    #[serde(default = "schema_version")]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_scene: Option<SceneId>,
    #[serde(default)]
    pub config: GameConfig,
    #[serde(default)]
    pub runtime: SessionOptions,
    #[serde(default)]
    pub scenes: Vec<SceneData>,
}

impl Default for ContentBundle {
    fn default() -> Self {
        Self {
            version: BUNDLE_SCHEMA_VERSION,
            name: String::new(),
            start_scene: None,
            config: GameConfig::default(),
            runtime: SessionOptions::default(),
            scenes: Vec::new(),
        }
    }
}

impl ContentBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_scene(mut self, scene: SceneData) -> Self {
        self.scenes.push(scene);
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Load a bundle, picking the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        let bundle = Self::parse(&text, format)?;
        tracing::debug!(
            path = %path.display(),
            scenes = bundle.scenes.len(),
            "content bundle loaded"
        );
        Ok(bundle)
    }

    pub fn parse(text: &str, format: Format) -> Result<Self, ContentError> {
        let bundle: Self = match format {
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        };
        if bundle.version != BUNDLE_SCHEMA_VERSION {
            return Err(ContentError::SchemaMismatch {
                file_version: bundle.version,
                expected_version: BUNDLE_SCHEMA_VERSION,
            });
        }
        Ok(bundle)
    }

    /// Save the bundle, picking the format from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        match Format::from_path(path)? {
            Format::Yaml => serde_yaml::to_writer(file, self)?,
            Format::Json => serde_json::to_writer_pretty(file, self)?,
        }
        Ok(())
    }

    pub fn scene(&self, id: &SceneId) -> Option<&SceneData> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    /// The explicit start scene, or the first scene.
    pub fn start(&self) -> Option<&SceneData> {
        match &self.start_scene {
            Some(id) => self.scene(id),
            None => self.scenes.first(),
        }
    }

    /// Check the bundle and normalise spawn defaults in place.
    pub fn validate(&mut self) -> Result<ValidationReport, ContentError> {
        validate(self)
    }

    /// A loader serving every scene of this bundle.
    pub fn loader(&self) -> StaticSceneLoader {
        StaticSceneLoader::new(self.scenes.iter().cloned())
    }

    /// Validate and start a session in the start scene. Items from every
    /// scene count towards `collect_all`.
    pub fn into_session(mut self) -> Result<(RuntimeSession, ValidationReport), ContentError> {
        let report = self.validate()?;
        let loader = Arc::new(self.loader());
        let start = self
            .start()
            .cloned()
            .ok_or(ContentError::NoScenes)?;
        let mut catalog = ItemCatalog::new();
        for scene in &self.scenes {
            catalog.extend_from(&scene.objects);
        }
        let session =
            RuntimeSession::start_with_catalog(start, self.config, catalog, loader, self.runtime)?;
        Ok((session, report))
    }
}
