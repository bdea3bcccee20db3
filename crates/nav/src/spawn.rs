use playspace_common::{SceneData, SceneId, SpawnPoint, SpawnRef};

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("scene '{scene}' has no spawn points")]
    NoSpawnPoints { scene: SceneId },
}

/// Where the player lands in `scene`. A named spawn that does not exist
/// falls back to the default spawn and logs a warning.
pub fn resolve_spawn<'a>(scene: &'a SceneData, spawn: &SpawnRef) -> Result<&'a SpawnPoint, NavError> {
    let resolution = scene
        .resolve_spawn(spawn)
        .ok_or_else(|| NavError::NoSpawnPoints {
            scene: scene.id.clone(),
        })?;
    if resolution.fell_back {
        tracing::warn!(
            scene = %scene.id,
            requested = ?spawn,
            used = %resolution.spawn.id,
            "spawn point missing, using default"
        );
    }
    Ok(resolution.spawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn named_spawn_falls_back() {
        let scene = SceneData::new("cave")
            .with_spawn(SpawnPoint::new("entrance", Vec3::ZERO).as_default())
            .with_spawn(SpawnPoint::new("lake", Vec3::X));
        assert_eq!(resolve_spawn(&scene, &"lake".into()).unwrap().id.as_str(), "lake");
        assert_eq!(
            resolve_spawn(&scene, &"nope".into()).unwrap().id.as_str(),
            "entrance"
        );
    }

    #[test]
    fn scene_without_spawns_errors() {
        let scene = SceneData::new("void");
        let err = resolve_spawn(&scene, &SpawnRef::Default).unwrap_err();
        assert!(err.to_string().contains("void"));
    }
}
