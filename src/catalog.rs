//! The fixed set of decorative weather models and where they are placed.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

const MODEL_BASE: &str = "https://dogmandcl.github.io/modelingResources";

const MODEL_FILES: &[(&str, &str)] = &[
    ("clouds", "CLOUDS.glb"),
    ("darkclouds", "DARK_CLOUDS.glb"),
    ("rain", "rain.glb"),
    ("snow", "snow.glb"),
    ("sun", "SUN.glb"),
];

/// Built-in catalog entries.
pub fn default_models() -> Vec<ModelEntry> {
    MODEL_FILES
        .iter()
        .map(|(id, file)| ModelEntry::new(*id, format!("{}/{}", MODEL_BASE, file)))
        .collect()
}

/// Identifier of the one model with its own placement rule.
pub const SUN_ID: &str = "sun";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: String,
    pub url: String,
}

impl ModelEntry {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Identifier to URL table for the weather models. Read-only after startup.
#[derive(Resource, Clone, Debug, Default)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|m| m.id.as_str())
    }
}

/// Where a freshly loaded model sits in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPlacement {
    pub translation: Vec3,
    pub scale: f32,
}

impl ModelPlacement {
    /// The sun sits low and to the right at a larger scale; every other
    /// model shares one placement just below the origin.
    pub fn for_id(id: &str) -> Self {
        if id == SUN_ID {
            Self {
                translation: Vec3::new(1.5, -2.0, 0.0),
                scale: 0.3,
            }
        } else {
            Self {
                translation: Vec3::new(0.0, -0.5, 0.0),
                scale: 0.1,
            }
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation).with_scale(Vec3::splat(self.scale))
    }
}
