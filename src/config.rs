use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{default_models, ModelCatalog, ModelEntry};
use crate::paths;
use crate::weather::{TemperatureUnit, UnitPreference};

const CONFIG_FILE: &str = "weather_diorama.toml";

#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub services: ServicesConfig,
    pub assets: AssetsConfig,
    pub display: DisplayConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    pub geocode_url: String,
    pub forecast_url: String,
    /// Nominatim rejects requests without an identifying User-Agent.
    pub user_agent: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            geocode_url: "https://nominatim.openstreetmap.org/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            user_agent: concat!("weather_diorama/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    pub font_url: String,
    pub models: Vec<ModelEntry>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            font_url: "https://raw.githubusercontent.com/bevyengine/bevy/main/assets/fonts/FiraSans-Bold.ttf"
                .to_string(),
            models: default_models(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Start with temperatures shown in Fahrenheit.
    pub fahrenheit: bool,
    pub label_font_size: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fahrenheit: false,
            label_font_size: 28.0,
        }
    }
}

impl AppConfig {
    pub fn initial_unit(&self) -> TemperatureUnit {
        if self.display.fahrenheit {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        }
    }
}

fn config_path() -> PathBuf {
    paths::config_dir().join(CONFIG_FILE)
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Read the config at `path`, falling back to defaults. A missing file is
/// created with the defaults so users have something to edit.
pub fn load_config_from(path: &Path) -> AppConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    warn!("Failed to parse config: {}, using defaults", e);
                    return AppConfig::default();
                }
            },
            Err(e) => {
                warn!("Failed to read config: {}, using defaults", e);
                return AppConfig::default();
            }
        }
    }

    let config = AppConfig::default();
    save_config_to(&config, path);
    config
}

pub fn save_config_to(config: &AppConfig, path: &Path) {
    match toml::to_string_pretty(config) {
        Ok(contents) => {
            if let Err(e) = fs::write(path, contents) {
                error!("Failed to write config: {}", e);
            } else {
                info!("Saved config to {:?}", path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Loads [`AppConfig`] and derives the read-only resources built from it.
pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        let config = load_config();
        let catalog = ModelCatalog::new(config.assets.models.clone());
        info!("Model catalog: {}", catalog.ids().collect::<Vec<_>>().join(", "));
        app.insert_resource(catalog)
            .insert_resource(UnitPreference(config.initial_unit()))
            .insert_resource(config);
    }
}
