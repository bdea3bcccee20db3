use std::sync::Arc;
use std::time::{Duration, Instant};

use playspace_actions::{ActionDispatcher, DispatchOptions, Effect};
use playspace_common::{
    GameConfig, ObjectId, Portal, PortalId, SceneData, SceneId, SessionId, SpawnRef,
    TransitionEffect, Trigger, TriggerKind,
};
use playspace_gamestate::{
    ConditionStatus, GamePhase, GameStateMachine, ItemCatalog, Outcome, PlayerRuntimeState,
    RewardTracker,
};
use playspace_nav::{NavigationStateMachine, resolve_spawn};
use playspace_transition::{
    OverlayFrame, SceneLoader, TransitionController, TransitionError, TransitionOutcome,
    TransitionState,
};
use playspace_triggers::{
    FireLedger, FrameView, InteractionKey, TimerHandle, TimerScheduler, TriggerEvaluator,
    TriggerStates,
};

use crate::event::SessionEvent;
use crate::options::{FrameInput, SessionOptions};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("scene '{scene}' has no spawn points; there is nowhere to start")]
    NoSpawnPoints { scene: SceneId },
    #[error("session has ended")]
    Ended,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Per-tick instrumentation.
#[derive(Debug, Clone, Default)]
pub struct TickStats {
    pub tick: u64,
    /// Interactions dispatched this tick, from any source.
    pub fires: usize,
    /// Events appended to the log this tick.
    pub events: usize,
    pub frame_time: Duration,
}

/// One play-through of authored content.
///
/// The session owns every piece of runtime state; the host drives it with
/// [`tick`](Self::tick) and reads snapshots, events and effects back out.
pub struct RuntimeSession {
    id: SessionId,
    options: SessionOptions,
    scene: SceneData,
    machine: GameStateMachine,
    state: PlayerRuntimeState,
    evaluator: TriggerEvaluator,
    trigger_states: TriggerStates,
    ledger: FireLedger,
    timers: TimerScheduler,
    dispatcher: ActionDispatcher,
    rewards: RewardTracker,
    nav: NavigationStateMachine,
    transition: TransitionController,
    clicks: Vec<ObjectId>,
    /// Running time in ms; the clock cooldowns are measured against.
    clock_ms: f64,
    tick: u64,
    stats: TickStats,
    events: Vec<SessionEvent>,
    effects: Vec<Effect>,
    ended: bool,
}

impl RuntimeSession {
    /// Start in `scene` at its default spawn. Fails only when the scene
    /// has no spawn points at all.
    ///
    /// `collect_all` only knows the items of `scene` until others are
    /// entered; use [`start_with_catalog`](Self::start_with_catalog) when
    /// every reachable scene is known up front.
    pub fn start(
        scene: SceneData,
        config: GameConfig,
        loader: Arc<dyn SceneLoader>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        Self::start_with_catalog(scene, config, ItemCatalog::new(), loader, options)
    }

    /// Like [`start`](Self::start), with the items `collect_all` waits for
    /// given up front. Items of entered scenes are still added.
    pub fn start_with_catalog(
        scene: SceneData,
        config: GameConfig,
        mut catalog: ItemCatalog,
        loader: Arc<dyn SceneLoader>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let spawn = scene
            .default_spawn()
            .cloned()
            .ok_or_else(|| SessionError::NoSpawnPoints {
                scene: scene.id.clone(),
            })?;

        let id = SessionId::new();
        let state = PlayerRuntimeState::new(&config, Some(&spawn));
        let dispatcher = ActionDispatcher::new(DispatchOptions {
            score_popups: options.dispatch.score_popups && config.scoring.show_popups,
        });
        catalog.extend_from(&scene.objects);
        let machine = GameStateMachine::new(config, catalog);

        let mut timers = TimerScheduler::new(id);
        let armed = timers.arm_scene(&scene.objects);
        let mut nav = NavigationStateMachine::new(options.navigation.clone());
        nav.load_scene(&scene, spawn.position);
        let evaluator = TriggerEvaluator {
            collision_radius: options.collision_radius,
        };
        let transition = TransitionController::new(options.transition.clone(), loader);

        tracing::info!(
            session = %id,
            scene = %scene.id,
            spawn = %spawn.id,
            timers = armed,
            "session started"
        );
        let started = SessionEvent::SessionStarted {
            session: id,
            scene: scene.id.clone(),
            spawn: spawn.id.clone(),
        };

        Ok(Self {
            id,
            options,
            scene,
            machine,
            state,
            evaluator,
            trigger_states: TriggerStates::new(),
            ledger: FireLedger::new(),
            timers,
            dispatcher,
            rewards: RewardTracker::new(),
            nav,
            transition,
            clicks: Vec::new(),
            clock_ms: 0.0,
            tick: 0,
            stats: TickStats::default(),
            events: vec![started],
            effects: Vec::new(),
            ended: false,
        })
    }

    /// Advance one frame. A no-op once the session has ended.
    pub fn tick(&mut self, input: FrameInput) -> TickStats {
        if self.ended {
            return TickStats {
                tick: self.tick,
                ..TickStats::default()
            };
        }
        let frame_start = Instant::now();
        self.tick += 1;
        let _span = tracing::info_span!("session_tick", session = %self.id, tick = self.tick).entered();

        let events_before = self.events.len();
        let dt = input.delta_time.max(0.0);
        self.state.position = input.position;
        self.state.rotation = input.rotation;

        let mut fires = 0;
        if self.machine.phase() == GamePhase::Running {
            self.state.elapsed_time += dt;
            self.clock_ms += f64::from(dt) * 1000.0;

            fires += self.drain_queued(dt);
            if self.transition.is_idle() {
                fires += self.evaluate_triggers(&input, dt);
            }
            self.evaluate_outcome();
            if self.transition.is_idle() && self.machine.phase() == GamePhase::Running {
                self.update_navigation();
            }
        } else if !self.clicks.is_empty() {
            tracing::trace!(dropped = self.clicks.len(), "clicks ignored while not running");
            self.clicks.clear();
        }

        self.update_transition(dt);

        self.stats = TickStats {
            tick: self.tick,
            fires,
            events: self.events.len() - events_before,
            frame_time: frame_start.elapsed(),
        };
        tracing::trace!(fires, events = self.stats.events, "tick complete");
        self.stats.clone()
    }

    fn drain_queued(&mut self, dt: f32) -> usize {
        self.timers.advance(dt);
        let mut fires = 0;
        for key in self.timers.drain() {
            if !self.has_timer_trigger(&key) {
                tracing::trace!(%key, "stale timer fire dropped");
                continue;
            }
            if self.fire(&key, TriggerKind::Timer) {
                fires += 1;
            }
        }

        for object_id in std::mem::take(&mut self.clicks) {
            let Some(object) = self.scene.objects.iter().find(|o| o.instance_id == object_id)
            else {
                tracing::debug!(object = %object_id, "click on unknown object");
                continue;
            };
            let keys: Vec<_> = object
                .interactions
                .iter()
                .filter(|i| matches!(i.trigger, Trigger::Click))
                .map(|i| InteractionKey::new(&object.instance_id, &i.id))
                .collect();
            for key in keys {
                if self.fire(&key, TriggerKind::Click) {
                    fires += 1;
                }
            }
        }
        fires
    }

    /// Only timer interactions of the current scene accept queued timer fires.
    fn has_timer_trigger(&self, key: &InteractionKey) -> bool {
        self.scene
            .objects
            .iter()
            .find(|o| o.instance_id == key.object)
            .and_then(|o| o.interaction(&key.interaction))
            .is_some_and(|i| matches!(i.trigger, Trigger::Timer { .. }))
    }

    fn evaluate_triggers(&mut self, input: &FrameInput, dt: f32) -> usize {
        let frame = FrameView {
            position: input.position,
            look_direction: input.look_direction(),
            delta_time: dt,
            now_ms: self.clock_ms,
        };
        let evaluation =
            self.evaluator
                .evaluate(&frame, &self.scene.objects, &self.trigger_states, &self.ledger);
        self.trigger_states = evaluation.states;
        evaluation
            .fires
            .iter()
            .filter(|fire| self.fire(&fire.key, fire.source))
            .count()
    }

    /// Gate, record and dispatch one interaction. Returns whether it ran.
    fn fire(&mut self, key: &InteractionKey, source: TriggerKind) -> bool {
        let Some(object) = self
            .scene
            .objects
            .iter()
            .find(|o| o.instance_id == key.object)
        else {
            tracing::trace!(%key, "fire for object not in scene");
            return false;
        };
        let Some(interaction) = object.interaction(&key.interaction) else {
            tracing::trace!(%key, "fire for unknown interaction");
            return false;
        };
        if !interaction.enabled {
            return false;
        }
        let decision = self.ledger.check(key, interaction, self.clock_ms);
        if !decision.is_allowed() {
            tracing::trace!(%key, ?decision, "fire gated");
            return false;
        }

        let count = self.ledger.record(key, self.clock_ms);
        tracing::debug!(%key, ?source, count, "interaction fired");
        self.events.push(SessionEvent::InteractionFired {
            object: key.object.clone(),
            interaction: key.interaction.clone(),
            source,
            count,
        });

        let dispatch = self.dispatcher.dispatch(
            object,
            &interaction.actions,
            self.machine.config(),
            &mut self.state,
        );
        self.events
            .extend(dispatch.events.into_iter().map(SessionEvent::from));
        self.effects.extend(dispatch.effects);
        true
    }

    fn evaluate_outcome(&mut self) {
        match self.machine.evaluate(&mut self.state) {
            Some(Outcome::Won) => {
                self.timers.cancel_all();
                self.events.push(SessionEvent::Won {
                    score: self.state.score,
                    elapsed: self.state.elapsed_time,
                });
            }
            Some(Outcome::Failed(reason)) => {
                self.timers.cancel_all();
                self.events.push(SessionEvent::Failed {
                    reason,
                    elapsed: self.state.elapsed_time,
                });
            }
            None => {}
        }

        for reward in self.rewards.collect(&self.machine.config().rewards, &self.state) {
            self.events.push(SessionEvent::RewardGranted {
                reward: reward.id.clone(),
                name: reward.name.clone(),
            });
        }
    }

    fn update_navigation(&mut self) {
        let update = self.nav.update(self.state.position, &self.state.inventory);
        self.events
            .extend(update.events.into_iter().map(SessionEvent::from));
        if let Some(entry) = update.entry {
            if let Err(error) = self.transition.start(entry.scene, entry.spawn, entry.effect) {
                tracing::warn!(%error, portal = %entry.portal, "portal entry ignored");
            }
        }
    }

    fn update_transition(&mut self, dt: f32) {
        let outcome = self.transition.update(f64::from(dt) * 1000.0);
        self.drain_transition_events();
        match outcome {
            Some(TransitionOutcome::Loaded { scene, spawn }) => self.enter_scene(scene, &spawn),
            Some(TransitionOutcome::Failed { scene, error }) => {
                tracing::warn!(%scene, %error, "staying in {}", self.scene.id);
            }
            None => {}
        }
    }

    fn drain_transition_events(&mut self) {
        let events = self.transition.drain_events();
        self.events
            .extend(events.into_iter().map(SessionEvent::from));
    }

    /// Swap in a freshly loaded scene and place the player at its spawn.
    fn enter_scene(&mut self, scene: SceneData, spawn: &SpawnRef) {
        let spawn_point = match resolve_spawn(&scene, spawn) {
            Ok(point) => point.clone(),
            Err(error) => {
                tracing::warn!(%error, "cannot enter scene");
                return;
            }
        };
        let fell_back = matches!(spawn, SpawnRef::Named(id) if scene.spawn(id).is_none());

        self.state.place_at(&spawn_point);
        self.trigger_states.clear();
        self.ledger.clear();
        self.clicks.clear();
        self.timers.cancel_all();
        let armed = self.timers.arm_scene(&scene.objects);
        self.machine.catalog_mut().extend_from(&scene.objects);
        self.nav.load_scene(&scene, spawn_point.position);

        tracing::info!(scene = %scene.id, spawn = %spawn_point.id, timers = armed, "scene entered");
        self.effects.push(Effect::Teleport {
            position: spawn_point.position,
            rotation: Some(spawn_point.rotation),
        });
        self.events.push(SessionEvent::SceneEntered {
            scene: scene.id.clone(),
            spawn: spawn_point.id.clone(),
            fell_back,
        });
        self.scene = scene;
    }

    /// Queue a pointer click on `object` for the next tick.
    pub fn click(&mut self, object: impl Into<ObjectId>) -> bool {
        if self.ended {
            return false;
        }
        self.clicks.push(object.into());
        true
    }

    /// Ask to go through the nearby portal on the next tick.
    pub fn request_portal_entry(&mut self) -> bool {
        if self.ended {
            return false;
        }
        self.nav.request_entry();
        true
    }

    /// Start a transition that no portal asked for.
    pub fn travel_to(
        &mut self,
        scene: impl Into<SceneId>,
        spawn: SpawnRef,
        effect: TransitionEffect,
    ) -> Result<(), SessionError> {
        if self.ended {
            return Err(SessionError::Ended);
        }
        self.transition.start(scene.into(), spawn, effect)?;
        self.drain_transition_events();
        Ok(())
    }

    pub fn cancel_transition(&mut self) -> bool {
        let cancelled = self.transition.cancel();
        self.drain_transition_events();
        cancelled
    }

    pub fn pause(&mut self) -> bool {
        if self.ended || !self.machine.pause() {
            return false;
        }
        self.events.push(SessionEvent::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.ended || !self.machine.resume() {
            return false;
        }
        self.events.push(SessionEvent::Resumed);
        true
    }

    /// Start over in the current scene: fresh player state, no fire history,
    /// timers re-armed, back to Running from any phase.
    pub fn reset(&mut self) -> bool {
        if self.ended {
            return false;
        }
        self.cancel_transition();
        self.machine.reset();
        let spawn = self.scene.default_spawn().cloned();
        self.state = PlayerRuntimeState::new(self.machine.config(), spawn.as_ref());
        self.trigger_states.clear();
        self.ledger.clear();
        self.rewards.clear();
        self.clicks.clear();
        self.timers.cancel_all();
        self.timers.arm_scene(&self.scene.objects);
        self.clock_ms = 0.0;
        if let Some(spawn) = spawn {
            self.nav.reset(spawn.position);
            self.effects.push(Effect::Teleport {
                position: spawn.position,
                rotation: Some(spawn.rotation),
            });
        }
        tracing::info!(session = %self.id, "session reset");
        self.events.push(SessionEvent::Reset);
        true
    }

    /// Tear down: timers and any transition are cancelled, and every later
    /// tick, click or timer fire is ignored.
    pub fn end(&mut self) -> bool {
        if self.ended {
            return false;
        }
        self.timers.shutdown();
        self.cancel_transition();
        self.clicks.clear();
        self.ended = true;
        tracing::info!(session = %self.id, ticks = self.tick, "session ended");
        self.events.push(SessionEvent::SessionEnded);
        true
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Read-only snapshot for HUD rendering.
    pub fn state(&self) -> &PlayerRuntimeState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    pub fn scene(&self) -> &SceneData {
        &self.scene
    }

    pub fn config(&self) -> &GameConfig {
        self.machine.config()
    }

    pub fn report(&self) -> Vec<ConditionStatus> {
        self.machine.report(&self.state)
    }

    pub fn transition_state(&self) -> TransitionState {
        self.transition.state()
    }

    pub fn overlay(&self) -> OverlayFrame {
        self.transition.overlay()
    }

    pub fn nearby_portal(&self) -> Option<&Portal> {
        self.nav.nearby()
    }

    pub fn is_portal_locked(&self, portal: &PortalId) -> Option<bool> {
        self.nav.is_locked(portal)
    }

    pub fn ledger(&self) -> &FireLedger {
        &self.ledger
    }

    /// Handle for firing timers from other threads; fires are applied at
    /// the start of the next tick.
    pub fn timer_handle(&self) -> TimerHandle {
        self.timers.handle()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use futures_channel::oneshot;
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use glam::Vec3;
    use playspace_common::{
        Action, Interaction, PlacedObject, Portal, PortalTrigger, Reward, RewardGrant, SpawnPoint,
        WinCondition, WinConditionKind,
    };
    use playspace_gamestate::FailReason;
    use playspace_transition::{SceneLoadError, StaticSceneLoader, TransitionPhase};

    const DT: f32 = 0.1;

    fn at(x: f32) -> FrameInput {
        FrameInput::new(Vec3::new(x, 0.0, 0.0), DT)
    }

    fn hall() -> SceneData {
        SceneData::new("hall").with_spawn(SpawnPoint::new("start", Vec3::new(10.0, 0.0, 0.0)))
    }

    fn add_score(points: i64) -> Action {
        Action::AddScore { points }
    }

    fn clickable(id: &str, action: Action) -> PlacedObject {
        PlacedObject::new(id, Vec3::new(50.0, 0.0, 0.0))
            .with_interaction(Interaction::new("use", Trigger::Click).with_action(action))
    }

    fn start(scene: SceneData, config: GameConfig, scenes: Vec<SceneData>) -> RuntimeSession {
        let loader = Arc::new(StaticSceneLoader::new(scenes));
        match RuntimeSession::start(scene, config, loader, SessionOptions::default()) {
            Ok(session) => session,
            Err(error) => panic!("session failed to start: {error}"),
        }
    }

    fn count(events: &[SessionEvent], name: &str) -> usize {
        events.iter().filter(|e| e.name() == name).count()
    }

    #[test]
    fn proximity_crossing_fires_once() {
        let bell = PlacedObject::new("bell", Vec3::ZERO).with_interaction(
            Interaction::new(
                "ring",
                Trigger::Proximity {
                    radius: 2.0,
                    on_enter: true,
                    on_exit: false,
                },
            )
            .with_action(add_score(10)),
        );
        let mut session = start(hall().with_object(bell), GameConfig::default(), vec![]);
        let fires: Vec<_> = [5.0, 1.0, 0.5]
            .into_iter()
            .map(|x| session.tick(at(x)).fires)
            .collect();
        assert_eq!(fires, vec![0, 1, 0]);
        assert_eq!(session.state().score, 10);

        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::InteractionFired {
            object: "bell".into(),
            interaction: "ring".into(),
            source: TriggerKind::Proximity,
            count: 1,
        }));
        let effects = session.drain_effects();
        assert!(matches!(effects[0], Effect::ScorePopup { points: 10, .. }));
    }

    #[test]
    fn reaching_score_wins_once_and_grants_reward() {
        let config = GameConfig {
            win_conditions: vec![WinCondition::required(WinConditionKind::ReachScore {
                target: 100,
            })],
            rewards: vec![Reward {
                id: "trophy".into(),
                name: "Trophy".into(),
                grant: RewardGrant::Win,
            }],
            ..GameConfig::default()
        };
        let mut session = start(
            hall().with_object(clickable("button", add_score(50))),
            config,
            vec![],
        );

        session.click("button");
        session.tick(at(10.0));
        assert_eq!(session.phase(), GamePhase::Running);
        session.click("button");
        session.tick(at(10.0));
        assert_eq!(session.phase(), GamePhase::Won);
        assert!(session.state().has_won);
        session.tick(at(10.0));

        let events = session.drain_events();
        assert_eq!(count(&events, "won"), 1);
        assert_eq!(count(&events, "reward_granted"), 1);

        // Terminal: clicks no longer dispatch.
        session.click("button");
        session.tick(at(10.0));
        assert_eq!(session.state().score, 100);
    }

    #[test]
    fn timer_fires_from_another_thread_apply_at_tick() {
        let clock = PlacedObject::new("clock", Vec3::ZERO).with_interaction(
            Interaction::new(
                "chime",
                Trigger::Timer {
                    delay: 100.0,
                    repeat: false,
                    repeat_count: None,
                },
            )
            .with_action(add_score(1)),
        );
        let mut session = start(hall().with_object(clock), GameConfig::default(), vec![]);
        let key = InteractionKey::new(&"clock".into(), &"chime".into());

        let handle = session.timer_handle();
        let remote_key = key.clone();
        assert!(std::thread::spawn(move || handle.fire(remote_key)).join().unwrap());
        assert_eq!(session.state().score, 0);

        session.tick(at(10.0));
        assert_eq!(session.state().score, 1);
        assert!(session.drain_events().contains(&SessionEvent::InteractionFired {
            object: "clock".into(),
            interaction: "chime".into(),
            source: TriggerKind::Timer,
            count: 1,
        }));

        assert!(session.end());
        let late = session.timer_handle();
        assert!(!late.fire(key));
        assert_eq!(session.tick(at(10.0)).fires, 0);
        assert_eq!(session.state().score, 1);
        assert_eq!(session.drain_events(), vec![SessionEvent::SessionEnded]);
        assert!(!session.click("clock"));
    }

    #[test]
    fn scheduled_timer_fires_after_delay() {
        let clock = PlacedObject::new("clock", Vec3::ZERO).with_interaction(
            Interaction::new(
                "chime",
                Trigger::Timer {
                    delay: 0.5,
                    repeat: false,
                    repeat_count: None,
                },
            )
            .with_action(add_score(1)),
        );
        let mut session = start(hall().with_object(clock), GameConfig::default(), vec![]);
        let mut quarter = || session.tick(FrameInput::new(Vec3::ZERO, 0.25)).fires;
        assert_eq!(quarter(), 0);
        assert_eq!(quarter(), 1);
        assert_eq!(quarter(), 0);
    }

    #[test]
    fn timer_queue_only_fires_timer_interactions() {
        let mut session = start(
            hall().with_object(clickable("button", add_score(7))),
            GameConfig::default(),
            vec![],
        );
        let key = InteractionKey::new(&"button".into(), &"use".into());
        assert!(session.timer_handle().fire(key));

        assert_eq!(session.tick(at(10.0)).fires, 0);
        assert_eq!(session.state().score, 0);
        assert_eq!(count(&session.drain_events(), "interaction_fired"), 0);
    }

    #[test]
    fn collect_all_waits_for_items_in_unvisited_scenes() {
        let gem = |object: &str, item: &str| {
            clickable(
                object,
                Action::AddInventory {
                    item_id: item.into(),
                    item_name: None,
                    quantity: 1,
                    category: None,
                },
            )
        };
        let garden = SceneData::new("garden")
            .with_spawn(SpawnPoint::new("gate", Vec3::ZERO))
            .with_object(gem("emerald", "emerald"));
        let hall = hall().with_object(gem("ruby", "ruby"));
        let mut catalog = ItemCatalog::from_objects(&garden.objects);
        catalog.extend_from(&hall.objects);
        let config = GameConfig {
            win_conditions: vec![WinCondition::required(WinConditionKind::CollectAll {
                category: None,
            })],
            ..GameConfig::default()
        };
        let loader = Arc::new(StaticSceneLoader::new(vec![garden]));
        let mut session =
            RuntimeSession::start_with_catalog(hall, config, catalog, loader, SessionOptions::default())
                .unwrap();

        session.click("ruby");
        session.tick(at(10.0));
        assert_eq!(session.phase(), GamePhase::Running);
        let report = session.report();
        assert_eq!((report[0].current, report[0].target), (1.0, 2.0));
    }

    #[test]
    fn reset_discards_queued_fires_and_state() {
        let clock = PlacedObject::new("clock", Vec3::ZERO).with_interaction(
            Interaction::new(
                "chime",
                Trigger::Timer {
                    delay: 100.0,
                    repeat: false,
                    repeat_count: None,
                },
            )
            .with_action(add_score(1)),
        );
        let mut session = start(
            hall()
                .with_object(clock)
                .with_object(clickable("button", add_score(5))),
            GameConfig::default(),
            vec![],
        );
        session.click("button");
        session.tick(at(10.0));
        assert_eq!(session.state().score, 5);

        let handle = session.timer_handle();
        handle.fire(InteractionKey::new(&"clock".into(), &"chime".into()));
        assert!(session.reset());
        session.tick(at(10.0));
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().elapsed_time, DT);
        assert_eq!(session.phase(), GamePhase::Running);
        assert!(session.drain_events().contains(&SessionEvent::Reset));
    }

    #[test]
    fn pause_freezes_gameplay() {
        let bell = PlacedObject::new("bell", Vec3::ZERO).with_interaction(
            Interaction::new(
                "ring",
                Trigger::Proximity {
                    radius: 2.0,
                    on_enter: true,
                    on_exit: false,
                },
            )
            .with_action(add_score(10)),
        );
        let mut session = start(hall().with_object(bell), GameConfig::default(), vec![]);
        assert!(session.pause());
        assert!(!session.pause());
        session.tick(at(0.0));
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().elapsed_time, 0.0);

        assert!(session.resume());
        session.tick(at(0.0));
        assert_eq!(session.state().score, 10);
        let events = session.drain_events();
        assert_eq!(count(&events, "paused"), 1);
        assert_eq!(count(&events, "resumed"), 1);
    }

    #[test]
    fn global_time_limit_fails_session() {
        let config = GameConfig {
            win_conditions: vec![WinCondition::required(WinConditionKind::ReachScore {
                target: 1,
            })],
            time_limit: Some(1.0),
            ..GameConfig::default()
        };
        let mut session = start(hall(), config, vec![]);
        session.tick(FrameInput::new(Vec3::ZERO, 0.6));
        assert_eq!(session.phase(), GamePhase::Running);
        session.tick(FrameInput::new(Vec3::ZERO, 0.6));
        assert_eq!(session.phase(), GamePhase::Failed);
        let failed = session
            .drain_events()
            .into_iter()
            .find(|e| e.name() == "failed");
        assert!(matches!(
            failed,
            Some(SessionEvent::Failed {
                reason: FailReason::GlobalTimeLimit { .. },
                ..
            })
        ));
    }

    #[test]
    fn walking_through_a_portal_changes_scene() {
        let hall = hall().with_portal(
            Portal::new("arch", Vec3::ZERO, "garden").with_spawn("gate"),
        );
        let garden = SceneData::new("garden")
            .with_spawn(SpawnPoint::new("center", Vec3::ZERO).as_default())
            .with_spawn(SpawnPoint::new("gate", Vec3::new(5.0, 0.0, 0.0)))
            .with_object(clickable(
                "gem",
                Action::AddInventory {
                    item_id: "gem".into(),
                    item_name: None,
                    quantity: 1,
                    category: None,
                },
            ));
        let config = GameConfig {
            win_conditions: vec![WinCondition::required(WinConditionKind::CollectAll {
                category: None,
            })],
            ..GameConfig::default()
        };
        let mut session = start(hall, config, vec![garden]);

        session.tick(at(0.5));
        assert_eq!(session.transition_state().phase, TransitionPhase::FadeOut);

        let mut entered = None;
        for _ in 0..20 {
            session.tick(at(0.5));
            if let Some(event) = session
                .drain_events()
                .into_iter()
                .find(|e| e.name() == "scene_entered")
            {
                entered = Some(event);
                break;
            }
        }
        assert_eq!(
            entered,
            Some(SessionEvent::SceneEntered {
                scene: "garden".into(),
                spawn: "gate".into(),
                fell_back: false,
            })
        );
        assert_eq!(session.scene().id.as_str(), "garden");
        assert_eq!(session.state().position, Vec3::new(5.0, 0.0, 0.0));
        assert!(
            session
                .drain_effects()
                .iter()
                .any(|e| matches!(e, Effect::Teleport { .. }))
        );

        // Items of the new scene count towards collect_all.
        assert_eq!(session.report()[0].target, 1.0);
        session.click("gem");
        session.tick(FrameInput::new(Vec3::new(5.0, 0.0, 0.0), DT));
        assert_eq!(session.phase(), GamePhase::Won);
    }

    #[test]
    fn failed_load_keeps_player_in_source_scene() {
        let hall = hall().with_portal(Portal::new("arch", Vec3::ZERO, "nowhere"));
        let mut session = start(hall, GameConfig::default(), vec![]);
        for _ in 0..15 {
            session.tick(at(0.5));
        }
        let events = session.drain_events();
        assert_eq!(count(&events, "scene_load_failed"), 1);
        assert_eq!(count(&events, "transition_completed"), 1);
        assert_eq!(session.scene().id.as_str(), "hall");
        assert_eq!(session.transition_state().phase, TransitionPhase::Idle);
    }

    #[test]
    fn golden_key_opens_vault() {
        let hall = hall()
            .with_object(clickable(
                "chest",
                Action::AddInventory {
                    item_id: "golden_key".into(),
                    item_name: None,
                    quantity: 1,
                    category: None,
                },
            ))
            .with_portal(
                Portal::new("vault", Vec3::new(11.0, 0.0, 0.0), "vault-room")
                    .with_key("golden_key"),
            );
        let mut session = start(hall, GameConfig::default(), vec![]);
        let vault = PortalId::new("vault");

        session.tick(at(10.0));
        assert_eq!(session.nearby_portal().map(|p| p.id.clone()), Some(vault.clone()));
        session.request_portal_entry();
        session.tick(at(10.0));
        assert_eq!(session.is_portal_locked(&vault), Some(true));
        assert!(
            session
                .drain_events()
                .contains(&SessionEvent::PortalEntryDenied {
                    portal: vault.clone()
                })
        );

        session.click("chest");
        session.tick(at(10.0));
        assert_eq!(session.is_portal_locked(&vault), Some(false));

        session.request_portal_entry();
        session.tick(at(10.0));
        let events = session.drain_events();
        assert_eq!(count(&events, "portal_unlocked"), 1);
        assert_eq!(count(&events, "portal_entered"), 1);
        assert_eq!(count(&events, "transition_started"), 1);
        assert_eq!(
            session.nearby_portal().map(|p| p.trigger_type),
            Some(PortalTrigger::KeyRequired)
        );
    }

    #[test]
    fn cancelled_transition_never_lands() {
        let (tx, rx) = oneshot::channel::<Result<SceneData, SceneLoadError>>();
        let slot = Mutex::new(Some(rx));
        let loader = move |scene: &SceneId| -> BoxFuture<'static, Result<SceneData, SceneLoadError>> {
            let rx = slot.lock().unwrap().take();
            let scene = scene.clone();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(Err(SceneLoadError::UnknownScene { scene })),
                    None => Err(SceneLoadError::UnknownScene { scene }),
                }
            }
            .boxed()
        };
        let hall = hall();
        let Ok(mut session) =
            RuntimeSession::start(hall, GameConfig::default(), Arc::new(loader), SessionOptions::default())
        else {
            panic!("session failed to start");
        };

        session
            .travel_to("garden", SpawnRef::Default, TransitionEffect::Fade)
            .unwrap();
        for _ in 0..5 {
            session.tick(at(10.0));
        }
        assert_eq!(session.transition_state().phase, TransitionPhase::Loading);
        assert!(session.cancel_transition());
        assert!(tx
            .send(Ok(SceneData::new("garden").with_spawn(SpawnPoint::new("s", Vec3::ZERO))))
            .is_err());
        for _ in 0..10 {
            session.tick(at(10.0));
        }
        let events = session.drain_events();
        assert_eq!(count(&events, "transition_cancelled"), 1);
        assert_eq!(count(&events, "scene_entered"), 0);
        assert_eq!(session.scene().id.as_str(), "hall");
    }

    #[test]
    fn travel_after_end_is_refused() {
        let mut session = start(hall(), GameConfig::default(), vec![]);
        session.end();
        assert!(matches!(
            session.travel_to("hall", SpawnRef::Default, TransitionEffect::Instant),
            Err(SessionError::Ended)
        ));
        assert!(!session.end());
    }

    #[test]
    fn scene_without_spawns_cannot_start() {
        let loader = Arc::new(StaticSceneLoader::default());
        let result = RuntimeSession::start(
            SceneData::new("void"),
            GameConfig::default(),
            loader,
            SessionOptions::default(),
        );
        assert!(matches!(result, Err(SessionError::NoSpawnPoints { .. })));
    }
}
