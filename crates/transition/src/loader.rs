use std::collections::HashMap;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};

use playspace_common::{SceneData, SceneId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneLoadError {
    #[error("unknown scene '{scene}'")]
    UnknownScene { scene: SceneId },
    #[error("scene '{scene}' has no spawn points")]
    NoSpawnPoints { scene: SceneId },
    #[error("failed to load scene '{scene}': {message}")]
    Failed { scene: SceneId, message: String },
}

/// Produces scene content on demand. Loads may complete later; the
/// transition controller polls the returned future without blocking.
pub trait SceneLoader: Send + Sync {
    fn load(&self, scene: &SceneId) -> BoxFuture<'static, Result<SceneData, SceneLoadError>>;
}

impl<F> SceneLoader for F
where
    F: Fn(&SceneId) -> BoxFuture<'static, Result<SceneData, SceneLoadError>> + Send + Sync,
{
    fn load(&self, scene: &SceneId) -> BoxFuture<'static, Result<SceneData, SceneLoadError>> {
        self(scene)
    }
}

/// Serves scenes already in memory; every load resolves immediately.
#[derive(Debug, Clone, Default)]
pub struct StaticSceneLoader {
    scenes: HashMap<SceneId, SceneData>,
}

impl StaticSceneLoader {
    pub fn new(scenes: impl IntoIterator<Item = SceneData>) -> Self {
        Self {
            scenes: scenes.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn insert(&mut self, scene: SceneData) {
        self.scenes.insert(scene.id.clone(), scene);
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl SceneLoader for StaticSceneLoader {
    fn load(&self, scene: &SceneId) -> BoxFuture<'static, Result<SceneData, SceneLoadError>> {
        let result = self
            .scenes
            .get(scene)
            .cloned()
            .ok_or_else(|| SceneLoadError::UnknownScene {
                scene: scene.clone(),
            });
        future::ready(result).boxed()
    }
}
