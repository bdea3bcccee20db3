use std::collections::HashSet;

use playspace_common::{
    Action, InteractionId, ObjectId, ObjectiveId, ObjectiveScope, PortalId, RewardGrant, RewardId,
    SceneData, SceneId, SpawnId, SpawnRef, Trigger, WinConditionKind,
};

use crate::ContentError;
use crate::bundle::ContentBundle;

/// A problem that leaves the bundle playable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContentWarning {
    #[error("scene '{scene}': portal '{portal}' leads to unknown scene '{destination}'")]
    UnknownDestination {
        scene: SceneId,
        portal: PortalId,
        destination: SceneId,
    },
    #[error(
        "scene '{scene}': portal '{portal}' targets missing spawn '{spawn}', the default spawn is used"
    )]
    UnknownDestinationSpawn {
        scene: SceneId,
        portal: PortalId,
        spawn: SpawnId,
    },
    #[error("scene '{scene}': portal '{portal}' is locked without a key and can never open")]
    KeylessLockedPortal { scene: SceneId, portal: PortalId },
    #[error("scene '{scene}': portal id '{portal}' is used more than once")]
    DuplicatePortal { scene: SceneId, portal: PortalId },
    #[error("scene '{scene}': object id '{object}' is used more than once")]
    DuplicateObject { scene: SceneId, object: ObjectId },
    #[error("scene '{scene}': object '{object}' repeats interaction id '{interaction}'")]
    DuplicateInteraction {
        scene: SceneId,
        object: ObjectId,
        interaction: InteractionId,
    },
    #[error("scene '{scene}': {object}/{interaction} has an invalid trigger: {reason}")]
    InvalidTrigger {
        scene: SceneId,
        object: ObjectId,
        interaction: InteractionId,
        reason: String,
    },
    #[error("scene '{scene}': {object}/{interaction} completes unknown objective '{objective}'")]
    UnknownObjective {
        scene: SceneId,
        object: ObjectId,
        interaction: InteractionId,
        objective: ObjectiveId,
    },
    #[error("win condition lists unknown objective '{0}'")]
    UnknownScopedObjective(ObjectiveId),
    #[error("reward '{reward}' waits for unknown objective '{objective}'")]
    UnknownRewardObjective {
        reward: RewardId,
        objective: ObjectiveId,
    },
    #[error("no required win condition; the session can never be won")]
    NoRequiredWinCondition,
    #[error("scene '{0}' has no spawn points and cannot be entered")]
    SceneWithoutSpawns(SceneId),
    #[error("scene '{scene}' has several default spawns; '{kept}' is kept")]
    MultipleDefaultSpawns { scene: SceneId, kept: SpawnId },
}

/// Non-fatal findings of [`ContentBundle::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub warnings: Vec<ContentWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, warning: ContentWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

pub(crate) fn validate(bundle: &mut ContentBundle) -> Result<ValidationReport, ContentError> {
    if bundle.scenes.is_empty() {
        return Err(ContentError::NoScenes);
    }

    let mut scene_ids = HashSet::new();
    for scene in &bundle.scenes {
        if !scene_ids.insert(scene.id.clone()) {
            return Err(ContentError::DuplicateScene(scene.id.clone()));
        }
    }

    if let Some(id) = &bundle.start_scene {
        if !scene_ids.contains(id) {
            return Err(ContentError::UnknownStartScene(id.clone()));
        }
    }
    if bundle.scenes.iter().all(|s| s.spawn_points.is_empty()) {
        return Err(ContentError::NoSpawnPoints);
    }
    if let Some(start) = bundle.start() {
        if start.spawn_points.is_empty() {
            return Err(ContentError::StartSceneWithoutSpawns(start.id.clone()));
        }
    }

    let mut report = ValidationReport::default();
    let objectives: HashSet<&ObjectiveId> = bundle.config.objectives.iter().map(|o| &o.id).collect();

    if !bundle.config.win_conditions.iter().any(|c| c.required) {
        report.warn(ContentWarning::NoRequiredWinCondition);
    }
    for condition in &bundle.config.win_conditions {
        if let WinConditionKind::CompleteObjectives {
            scope: ObjectiveScope::Listed(listed),
        } = &condition.kind
        {
            for id in listed.iter().filter(|id| !objectives.contains(id)) {
                report.warn(ContentWarning::UnknownScopedObjective(id.clone()));
            }
        }
    }
    for reward in &bundle.config.rewards {
        if let RewardGrant::Objective { objective_id } = &reward.grant {
            if !objectives.contains(objective_id) {
                report.warn(ContentWarning::UnknownRewardObjective {
                    reward: reward.id.clone(),
                    objective: objective_id.clone(),
                });
            }
        }
    }

    for scene in &bundle.scenes {
        check_objects(scene, &objectives, &mut report);
        check_portals(scene, &bundle.scenes, &mut report);
        if scene.spawn_points.is_empty() {
            report.warn(ContentWarning::SceneWithoutSpawns(scene.id.clone()));
        }
    }

    for scene in &mut bundle.scenes {
        normalize_default_spawn(scene, &mut report);
    }

    tracing::debug!(
        scenes = bundle.scenes.len(),
        warnings = report.warnings.len(),
        "content validated"
    );
    Ok(report)
}

fn check_objects(
    scene: &SceneData,
    objectives: &HashSet<&ObjectiveId>,
    report: &mut ValidationReport,
) {
    let mut object_ids = HashSet::new();
    for object in &scene.objects {
        if !object_ids.insert(&object.instance_id) {
            report.warn(ContentWarning::DuplicateObject {
                scene: scene.id.clone(),
                object: object.instance_id.clone(),
            });
        }

        let mut interaction_ids = HashSet::new();
        for interaction in &object.interactions {
            if !interaction_ids.insert(&interaction.id) {
                report.warn(ContentWarning::DuplicateInteraction {
                    scene: scene.id.clone(),
                    object: object.instance_id.clone(),
                    interaction: interaction.id.clone(),
                });
            }
            if let Some(reason) = trigger_problem(&interaction.trigger) {
                report.warn(ContentWarning::InvalidTrigger {
                    scene: scene.id.clone(),
                    object: object.instance_id.clone(),
                    interaction: interaction.id.clone(),
                    reason,
                });
            }
            for action in &interaction.actions {
                if let Action::CompleteObjective { objective_id } = action {
                    if !objectives.contains(objective_id) {
                        report.warn(ContentWarning::UnknownObjective {
                            scene: scene.id.clone(),
                            object: object.instance_id.clone(),
                            interaction: interaction.id.clone(),
                            objective: objective_id.clone(),
                        });
                    }
                }
            }
        }
    }
}

fn trigger_problem(trigger: &Trigger) -> Option<String> {
    match trigger {
        Trigger::Proximity { radius, .. } if *radius <= 0.0 => {
            Some(format!("proximity radius {radius} is not positive"))
        }
        Trigger::Proximity {
            on_enter: false,
            on_exit: false,
            ..
        } => Some("proximity fires on neither enter nor exit".to_owned()),
        Trigger::Zone { size, .. } if size.min_element() <= 0.0 => {
            Some(format!("zone size {size} has a non-positive extent"))
        }
        Trigger::Look { angle, .. } if !(*angle > 0.0 && *angle <= 180.0) => {
            Some(format!("look angle {angle} is outside (0, 180]"))
        }
        Trigger::Look { duration, .. } if *duration < 0.0 => {
            Some(format!("look duration {duration} is negative"))
        }
        Trigger::Timer { delay, .. } if *delay < 0.0 => {
            Some(format!("timer delay {delay} is negative"))
        }
        _ => None,
    }
}

fn check_portals(scene: &SceneData, scenes: &[SceneData], report: &mut ValidationReport) {
    let mut portal_ids = HashSet::new();
    for portal in &scene.portals {
        if !portal_ids.insert(&portal.id) {
            report.warn(ContentWarning::DuplicatePortal {
                scene: scene.id.clone(),
                portal: portal.id.clone(),
            });
        }
        if portal.locked && portal.required_key_id.is_none() {
            report.warn(ContentWarning::KeylessLockedPortal {
                scene: scene.id.clone(),
                portal: portal.id.clone(),
            });
        }

        let Some(destination) = scenes.iter().find(|s| s.id == portal.destination_scene_id)
        else {
            report.warn(ContentWarning::UnknownDestination {
                scene: scene.id.clone(),
                portal: portal.id.clone(),
                destination: portal.destination_scene_id.clone(),
            });
            continue;
        };
        if let SpawnRef::Named(spawn) = &portal.destination_spawn_id {
            if destination.spawn(spawn).is_none() && !destination.spawn_points.is_empty() {
                report.warn(ContentWarning::UnknownDestinationSpawn {
                    scene: scene.id.clone(),
                    portal: portal.id.clone(),
                    spawn: spawn.clone(),
                });
            }
        }
    }
}

/// Leave exactly one default spawn: the first flagged one, or the first
/// spawn when none is flagged.
fn normalize_default_spawn(scene: &mut SceneData, report: &mut ValidationReport) {
    let mut defaults = scene.spawn_points.iter().filter(|s| s.is_default);
    let Some(first) = defaults.next() else {
        if let Some(id) = scene.spawn_points.first().map(|s| s.id.clone()) {
            tracing::debug!(scene = %scene.id, spawn = %id, "first spawn made default");
            scene.set_default_spawn(&id);
        }
        return;
    };
    if defaults.next().is_none() {
        return;
    }
    let kept = first.id.clone();
    scene.set_default_spawn(&kept);
    report.warn(ContentWarning::MultipleDefaultSpawns {
        scene: scene.id.clone(),
        kept,
    });
}
