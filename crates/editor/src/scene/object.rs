use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Player,
    Enemy,
    Collectible,
    Platform,
    Background,
}

impl ObjectKind {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Collectible => "collectible",
            Self::Platform => "platform",
            Self::Background => "background",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "player" => Some(Self::Player),
            "enemy" => Some(Self::Enemy),
            "collectible" => Some(Self::Collectible),
            "platform" => Some(Self::Platform),
            "background" => Some(Self::Background),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Self = Self {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub enabled: bool,
    pub mass: f32,
    pub gravity: bool,
    pub kinematic: bool,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            enabled: true,
            mass: 1.0,
            gravity: false,
            kinematic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub current: String,
    pub speed: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            current: "idle".to_string(),
            speed: 1.0,
        }
    }
}

/// A placed entity. `id` is immutable once created; `kind` is fixed at
/// creation and never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub color: String,
    pub physics: PhysicsBody,
    pub behaviors: BTreeSet<String>,
    pub animation: Animation,
    pub material: String,
    pub opacity: u8,
}

impl GameObject {
    pub fn is_gravity_bound(&self) -> bool {
        self.kind == ObjectKind::Player && self.physics.enabled && self.physics.gravity
    }
}

/// Partial update applied by `SceneStore::update_object`. Each populated
/// field replaces the matching top-level field wholesale; nested values are
/// never merged component-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    pub name: Option<String>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub color: Option<String>,
    pub physics: Option<PhysicsBody>,
    pub behaviors: Option<BTreeSet<String>>,
    pub animation: Option<Animation>,
    pub material: Option<String>,
    pub opacity: Option<u8>,
}

impl ObjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply_to(&self, object: &mut GameObject) {
        if let Some(name) = &self.name {
            object.name = name.clone();
        }
        if let Some(position) = self.position {
            object.position = position;
        }
        if let Some(rotation) = self.rotation {
            object.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            object.scale = scale;
        }
        if let Some(color) = &self.color {
            object.color = color.clone();
        }
        if let Some(physics) = self.physics {
            object.physics = physics;
        }
        if let Some(behaviors) = &self.behaviors {
            object.behaviors = behaviors.clone();
        }
        if let Some(animation) = &self.animation {
            object.animation = animation.clone();
        }
        if let Some(material) = &self.material {
            object.material = material.clone();
        }
        if let Some(opacity) = self.opacity {
            object.opacity = opacity.min(100);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

impl ViewMode {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "2D" | "2d" => Some(Self::TwoD),
            "3D" | "3d" => Some(Self::ThreeD),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub gravity: f32,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
    #[serde(rename = "cameraPosition")]
    pub camera_position: Vec3,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            background_color: "#000000".to_string(),
            camera_position: Vec3::new(0.0, 5.0, 10.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub gravity: Option<f32>,
    pub background_color: Option<String>,
    pub camera_position: Option<Vec3>,
}

impl SettingsPatch {
    pub(crate) fn apply_to(&self, settings: &mut Settings) {
        if let Some(gravity) = self.gravity {
            settings.gravity = gravity;
        }
        if let Some(background_color) = &self.background_color {
            settings.background_color = background_color.clone();
        }
        if let Some(camera_position) = self.camera_position {
            settings.camera_position = camera_position;
        }
    }
}
