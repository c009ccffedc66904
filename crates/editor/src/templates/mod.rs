mod catalog;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scene::{GameObject, Settings};

pub use catalog::{catalog, find_template};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
    #[serde(rename = "2D/3D")]
    TwoDThreeD,
}

/// An immutable scene preset. `load_template` always copies out of the
/// catalog; nothing mutates a `Template` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(rename = "type")]
    pub dimension: Dimension,
    pub description: String,
    pub objects: Vec<GameObject>,
    pub settings: Settings,
}
