use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use editor::{
    decode_share_link, encode_share_link, export_game, find_template, Animation, AppPaths,
    GameObject, MetricsAccumulator, ObjectId, ObjectKind, ObjectPatch, PersistError, PhysicsBody,
    PlaytestConfig, PlaytestLoop, PromptGenerator, SaveSlot, SceneStore, SettingsPatch,
    StartupError, StoreError, Vec3,
};
use thiserror::Error;
use tracing::{info, warn};

use super::bootstrap::SessionConfig;
use super::commands::{parse_line, Command};

/// How long the loop yields the thread between frames. Short enough to keep
/// the accumulator well under the per-frame tick cap.
const FRAME_SLEEP: Duration = Duration::from_millis(8);

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to read script '{path}': {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}

/// One headless editing session: load a template, replay a script against
/// the store, run the play-test loop for the configured duration, then save
/// the resulting scene to the durable slot.
pub(crate) fn run(config: SessionConfig) -> Result<(), SessionError> {
    let paths = editor::resolve_app_paths()?;
    info!(root = %paths.root.display(), "project_root_resolved");

    let mut session = Session::new(&paths, config.playtest.clone());

    if let Some(template_id) = &config.template_id {
        session.apply(Command::Load {
            template_id: template_id.clone(),
        })?;
    }

    if let Some(script_path) = &config.script_path {
        session.replay_script(script_path)?;
    }

    if !session.store.is_playing() {
        session.apply(Command::Play)?;
    }
    session.run_playtest(&config);
    if session.store.is_playing() {
        session.store.toggle_play_mode();
    }

    let result = session.save_slot.write(&session.store);
    session.teardown();
    result?;

    info!(
        object_count = session.store.objects().len(),
        "session_finished"
    );
    Ok(())
}

pub(crate) struct Session {
    store: SceneStore,
    playtest: PlaytestLoop,
    generator: PromptGenerator,
    save_slot: SaveSlot,
    export_dir: PathBuf,
}

impl Session {
    pub(crate) fn new(paths: &AppPaths, playtest: PlaytestConfig) -> Self {
        Self {
            store: SceneStore::new(),
            playtest: PlaytestLoop::new(playtest),
            generator: PromptGenerator::new(),
            save_slot: SaveSlot::in_dir(&paths.save_dir),
            export_dir: paths.export_dir.clone(),
        }
    }

    pub(crate) fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Applies one command to the session state. Missing update targets are
    /// logged and skipped so a script survives a deleted object; structural
    /// failures (duplicate id, unknown template, persistence) are errors.
    pub(crate) fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::Add { kind, id, position } => {
                self.store.add_object(blank_object(kind, &id, position))?;
            }
            Command::Select { id } => self.store.select_object(&ObjectId::new(id)),
            Command::Deselect => self.store.clear_selection(),
            Command::Delete { id } => {
                if !self.store.delete_object(&ObjectId::new(&id)) {
                    warn!(id = id.as_str(), "delete_target_missing");
                }
            }
            Command::Move { id, position } => self.patch(
                &id,
                ObjectPatch {
                    position: Some(position),
                    ..ObjectPatch::default()
                },
            ),
            Command::Rotate { id, rotation } => self.patch(
                &id,
                ObjectPatch {
                    rotation: Some(rotation),
                    ..ObjectPatch::default()
                },
            ),
            Command::Scale { id, scale } => self.patch(
                &id,
                ObjectPatch {
                    scale: Some(scale),
                    ..ObjectPatch::default()
                },
            ),
            Command::Mass { id, mass } => {
                // Physics patches replace the whole body, so start from the
                // object's current one.
                let object_id = ObjectId::new(&id);
                match self.store.find_object(&object_id) {
                    Some(object) => {
                        let physics = PhysicsBody {
                            mass,
                            ..object.physics
                        };
                        self.patch(
                            &id,
                            ObjectPatch {
                                physics: Some(physics),
                                ..ObjectPatch::default()
                            },
                        );
                    }
                    None => warn!(id = id.as_str(), "update_target_missing"),
                }
            }
            Command::Opacity { id, opacity } => self.patch(
                &id,
                ObjectPatch {
                    opacity: Some(opacity),
                    ..ObjectPatch::default()
                },
            ),
            Command::Rename { id, name } => self.patch(
                &id,
                ObjectPatch {
                    name: Some(name),
                    ..ObjectPatch::default()
                },
            ),
            Command::Recolor { id, color } => self.patch(
                &id,
                ObjectPatch {
                    color: Some(color),
                    ..ObjectPatch::default()
                },
            ),
            Command::Load { template_id } => {
                let template = find_template(&template_id)
                    .ok_or_else(|| SessionError::UnknownTemplate(template_id.clone()))?;
                self.store.load_template(template);
            }
            Command::Play => {
                self.store.toggle_play_mode();
            }
            Command::View { mode } => self.store.set_view_mode(mode),
            Command::Gravity { gravity } => self.store.update_settings(&SettingsPatch {
                gravity: Some(gravity),
                ..SettingsPatch::default()
            }),
            Command::Background { color } => self.store.update_settings(&SettingsPatch {
                background_color: Some(color),
                ..SettingsPatch::default()
            }),
            Command::Generate { prompt } => {
                if !self.generator.begin(&prompt, Instant::now()) {
                    warn!(prompt = prompt.as_str(), "generation_not_started");
                }
            }
            Command::Save => self.save_slot.write(&self.store)?,
            Command::Export => {
                export_game(&self.store, &self.export_dir)?;
            }
            Command::Share { base_url } => {
                let link = encode_share_link(&self.store, &base_url)?;
                // Round-trip through the decoder so a corrupt link never
                // leaves the session silently.
                decode_share_link(&link)?;
                info!(link = link.as_str(), "share_link_built");
            }
            // Quit only means something to the script replayer.
            Command::Quit => {}
        }
        Ok(())
    }

    /// Replays a script file line by line. Lines that fail to parse or apply
    /// are logged and skipped; only an unreadable file aborts the session.
    pub(crate) fn replay_script(&mut self, path: &std::path::Path) -> Result<(), SessionError> {
        let text = fs::read_to_string(path).map_err(|source| SessionError::Script {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "script_replay_started");

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            match parse_line(line) {
                Ok(Some(Command::Quit)) => {
                    info!(line = line_number, "script_quit");
                    break;
                }
                Ok(Some(command)) => {
                    if let Err(err) = self.apply(command) {
                        warn!(line = line_number, error = %err, "script_line_failed");
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(line = line_number, error = %err, "script_line_invalid"),
            }
        }
        Ok(())
    }

    /// Drives the play-test loop in real time until `playtest_duration` has
    /// elapsed, logging rate metrics and folding in generated objects as
    /// they complete.
    fn run_playtest(&mut self, config: &SessionConfig) {
        let mut metrics = MetricsAccumulator::new(config.metrics_log_interval);
        let start = Instant::now();
        let mut last_frame = start;

        loop {
            let now = Instant::now();
            if now.saturating_duration_since(start) >= config.playtest_duration {
                break;
            }

            let report = self.playtest.advance(&mut self.store, now);
            metrics.record_frame(now.saturating_duration_since(last_frame));
            metrics.record_ticks(report.ticks_run);
            last_frame = now;

            if let Some(snapshot) = metrics.maybe_snapshot(now) {
                info!(
                    fps = snapshot.fps,
                    tps = snapshot.tps,
                    frame_time_ms = snapshot.frame_time_ms,
                    "loop_metrics"
                );
            }

            self.fold_in_generated(now);
            thread::sleep(FRAME_SLEEP);
        }
    }

    fn patch(&mut self, id: &str, patch: ObjectPatch) {
        if !self.store.update_object(&ObjectId::new(id), &patch) {
            warn!(id = id, "update_target_missing");
        }
    }

    fn fold_in_generated(&mut self, now: Instant) {
        if let Some(object) = self.generator.poll(now) {
            let id = object.id.clone();
            if let Err(err) = self.store.add_object(object) {
                warn!(id = %id, error = %err, "generated_object_rejected");
            }
        }
    }

    /// Runs on every exit path so neither the loop nor the generator keeps
    /// scheduled work alive past the session.
    pub(crate) fn teardown(&mut self) {
        self.playtest.stop();
        self.generator.cancel();
    }
}

fn blank_object(kind: ObjectKind, id: &str, position: Vec3) -> GameObject {
    let mut behaviors = BTreeSet::new();
    if kind == ObjectKind::Player {
        behaviors.insert("jump".to_string());
        behaviors.insert("move".to_string());
    }
    GameObject {
        id: ObjectId::new(id),
        name: id.to_string(),
        kind,
        position,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
        color: default_color(kind),
        physics: PhysicsBody {
            gravity: matches!(kind, ObjectKind::Player | ObjectKind::Enemy),
            ..PhysicsBody::default()
        },
        behaviors,
        animation: Animation::default(),
        material: "default".to_string(),
        opacity: 100,
    }
}

fn default_color(kind: ObjectKind) -> String {
    let color = match kind {
        ObjectKind::Player => "#4a90d9",
        ObjectKind::Enemy => "#d0021b",
        ObjectKind::Collectible => "#f8e71c",
        ObjectKind::Platform => "#8b572a",
        ObjectKind::Background => "#4a4a4a",
    };
    color.to_string()
}
