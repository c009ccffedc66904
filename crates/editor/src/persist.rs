use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::scene::{GameObject, SceneStore, Settings, Vec3};
use crate::templates::Template;

/// Stem of the durable slot file; was the local-storage key in the browser
/// incarnation of this editor.
pub const SAVE_SLOT_NAME: &str = "epicenders_game";

const SHARE_QUERY_KEY: &str = "game=";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode game json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to parse game json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
    #[error("share url has no '{SHARE_QUERY_KEY}' query parameter")]
    MissingSharePayload,
    #[error("failed to decode share payload: {0}")]
    DecodePayload(#[from] base64::DecodeError),
    #[error("share payload is not valid utf-8: {0}")]
    PayloadNotUtf8(#[from] std::string::FromUtf8Error),
}

/// Durable slot layout: `{objects, settings, template, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub objects: Vec<GameObject>,
    pub settings: Settings,
    pub template: Option<Template>,
    pub timestamp: String,
}

impl SavedGame {
    pub fn restore_into(self, store: &mut SceneStore) {
        let template_id = self.template.map(|template| template.id);
        store.restore(self.objects, self.settings, template_id);
    }
}

/// Export layout: same shape as the slot but stamped with `exportedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedGame {
    pub objects: Vec<GameObject>,
    pub settings: Settings,
    pub template: Option<Template>,
    #[serde(rename = "exportedAt")]
    pub exported_at: String,
}

/// Share-link payload: the scene without any timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    pub objects: Vec<GameObject>,
    pub settings: Settings,
    pub template: Option<Template>,
}

/// The single durable save slot, keyed by the fixed application name.
#[derive(Debug, Clone)]
pub struct SaveSlot {
    path: PathBuf,
}

impl SaveSlot {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{SAVE_SLOT_NAME}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, store: &SceneStore) -> Result<(), PersistError> {
        let saved = SavedGame {
            objects: store.objects().to_vec(),
            settings: store.settings().clone(),
            template: resolve_template(store),
            timestamp: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&saved).map_err(PersistError::Encode)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| PersistError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "save_written");
        Ok(())
    }

    pub fn read(&self) -> Result<SavedGame, PersistError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| PersistError::Read {
            path: self.path.clone(),
            source,
        })?;
        let saved: SavedGame = parse_json(&raw)?;
        validate_scene(&saved.objects, &saved.settings)?;
        Ok(saved)
    }
}

/// Writes `{objects, settings, template, exportedAt}` pretty-printed to
/// `epicenders_game_<epoch-ms>.json` under `export_dir` and returns the path.
pub fn export_game(store: &SceneStore, export_dir: &Path) -> Result<PathBuf, PersistError> {
    let now = Utc::now();
    let exported = ExportedGame {
        objects: store.objects().to_vec(),
        settings: store.settings().clone(),
        template: resolve_template(store),
        exported_at: now.to_rfc3339(),
    };
    let json = serde_json::to_string_pretty(&exported).map_err(PersistError::Encode)?;

    fs::create_dir_all(export_dir).map_err(|source| PersistError::CreateDir {
        path: export_dir.to_path_buf(),
        source,
    })?;
    let path = export_dir.join(format!("{SAVE_SLOT_NAME}_{}.json", now.timestamp_millis()));
    fs::write(&path, json).map_err(|source| PersistError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "export_written");
    Ok(path)
}

/// Builds the shareable link: base64 of the compact scene json appended to
/// `base_url` as the `game` query parameter.
pub fn encode_share_link(store: &SceneStore, base_url: &str) -> Result<String, PersistError> {
    let payload = SharePayload {
        objects: store.objects().to_vec(),
        settings: store.settings().clone(),
        template: resolve_template(store),
    };
    let json = serde_json::to_string(&payload).map_err(PersistError::Encode)?;
    Ok(format!("{base_url}?{SHARE_QUERY_KEY}{}", BASE64.encode(json)))
}

/// Inverse of `encode_share_link`; the browser original never consumed its
/// own links, this implementation closes that loop. Only a whole `game`
/// query parameter counts; `endgame=` and friends do not match.
pub fn decode_share_link(url: &str) -> Result<SharePayload, PersistError> {
    let (_, query) = url
        .split_once('?')
        .ok_or(PersistError::MissingSharePayload)?;
    let encoded = query
        .split('&')
        .find_map(|pair| pair.strip_prefix(SHARE_QUERY_KEY))
        .ok_or(PersistError::MissingSharePayload)?;
    let bytes = BASE64.decode(encoded)?;
    let json = String::from_utf8(bytes)?;
    let payload: SharePayload = parse_json(&json)?;
    validate_scene(&payload.objects, &payload.settings)?;
    Ok(payload)
}

fn resolve_template(store: &SceneStore) -> Option<Template> {
    store
        .current_template()
        .and_then(|id| crate::templates::find_template(id.as_str()))
        .cloned()
}

fn parse_json<'de, T: Deserialize<'de>>(raw: &'de str) -> Result<T, PersistError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        PersistError::Parse {
            path: if path.is_empty() { ".".to_string() } else { path },
            source: error.into_inner(),
        }
    })
}

fn validation_err(path: impl Into<String>, message: impl Into<String>) -> PersistError {
    PersistError::Validation {
        path: path.into(),
        message: message.into(),
    }
}

fn require_finite_vec3(path: &str, value: Vec3) -> Result<(), PersistError> {
    for (axis, component) in [("x", value.x), ("y", value.y), ("z", value.z)] {
        if !component.is_finite() {
            return Err(validation_err(
                format!("{path}.{axis}"),
                format!("expected finite number, got {component}"),
            ));
        }
    }
    Ok(())
}

fn validate_scene(objects: &[GameObject], settings: &Settings) -> Result<(), PersistError> {
    if !settings.gravity.is_finite() {
        return Err(validation_err(
            "settings.gravity",
            format!("expected finite number, got {}", settings.gravity),
        ));
    }
    require_finite_vec3("settings.cameraPosition", settings.camera_position)?;

    let mut known_ids = std::collections::HashMap::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        if let Some(first_index) = known_ids.insert(&object.id, index) {
            return Err(validation_err(
                format!("objects[{index}].id"),
                format!(
                    "duplicate id '{}' (first seen at objects[{first_index}].id)",
                    object.id
                ),
            ));
        }

        require_finite_vec3(&format!("objects[{index}].position"), object.position)?;
        require_finite_vec3(&format!("objects[{index}].rotation"), object.rotation)?;
        require_finite_vec3(&format!("objects[{index}].scale"), object.scale)?;

        if object.opacity > 100 {
            return Err(validation_err(
                format!("objects[{index}].opacity"),
                format!("expected percentage in [0,100], got {}", object.opacity),
            ));
        }
        if !object.animation.speed.is_finite() || object.animation.speed <= 0.0 {
            return Err(validation_err(
                format!("objects[{index}].animation.speed"),
                format!("expected positive number, got {}", object.animation.speed),
            ));
        }
        if !object.physics.mass.is_finite() {
            return Err(validation_err(
                format!("objects[{index}].physics.mass"),
                format!("expected finite number, got {}", object.physics.mass),
            ));
        }
    }

    Ok(())
}
