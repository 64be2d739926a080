//! Swaps the displayed weather model and label.
//!
//! [`SceneSlots`] holds the only references to the live model and label.
//! A swap despawns the old occupant, fetches the new asset off-thread, and
//! installs the arrival on a later frame.

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;

use crate::catalog::{ModelCatalog, ModelEntry, ModelPlacement};
use crate::config::AppConfig;
use crate::fetch::{AssetFetcherHandle, FetchError, HttpAssetFetcher, FONTS_DIR, MODELS_DIR};
use crate::jobs::JobRunner;
use crate::paths;

const LABEL_COLOR: Color = Color::srgb(1.0, 0.843, 0.0); // #ffd700
const LABEL_LEFT_PX: f32 = 40.0;
const LABEL_TOP_PX: f32 = 140.0;

/// Replace the displayed model with the catalog entry `id`.
#[derive(Message, Debug, Clone)]
pub struct ShowModel {
    pub id: String,
}

/// Replace the label text.
#[derive(Message, Debug, Clone)]
pub struct ShowLabel {
    pub text: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SwapError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// The current model and label. Each slot holds at most one live entity.
#[derive(Resource, Debug, Default)]
pub struct SceneSlots {
    pub model: Option<Entity>,
    pub label: Option<Entity>,
}

#[derive(Component, Debug, Clone)]
pub struct DisplayedModel {
    pub id: String,
    /// Bevy asset path of the cached glTF file.
    pub asset_path: String,
}

#[derive(Component)]
pub struct WeatherLabel;

/// Asset path of the cached font a label should use.
#[derive(Component, Debug, Clone)]
pub struct LabelFont(pub String);

#[derive(Resource, Debug, Clone)]
pub struct LabelStyle {
    pub font_url: String,
    pub font_size: f32,
}

impl LabelStyle {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            font_url: config.assets.font_url.clone(),
            font_size: config.display.label_font_size,
        }
    }
}

#[derive(Debug)]
pub enum AssetArrival {
    Model {
        id: String,
        result: Result<PathBuf, FetchError>,
    },
    Font {
        text: String,
        result: Result<PathBuf, FetchError>,
    },
}

/// Channel carrying finished downloads back to the frame loop.
#[derive(Resource)]
pub struct AssetArrivals {
    tx: Sender<AssetArrival>,
    rx: Receiver<AssetArrival>,
}

impl Default for AssetArrivals {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }
}

/// Check the catalog and clear the model slot. Unknown ids leave the scene
/// untouched.
pub fn begin_model_swap(
    commands: &mut Commands,
    slots: &mut SceneSlots,
    catalog: &ModelCatalog,
    id: &str,
) -> Result<ModelEntry, SwapError> {
    let entry = catalog
        .get(id)
        .cloned()
        .ok_or_else(|| SwapError::ModelNotFound(id.to_string()))?;

    if let Some(previous) = slots.model.take() {
        commands.entity(previous).despawn();
    }
    Ok(entry)
}

pub fn setup_asset_fetcher(mut commands: Commands, config: Res<AppConfig>) {
    commands.insert_resource(LabelStyle::from_config(&config));

    match HttpAssetFetcher::new(paths::cache_dir(), &config.services.user_agent) {
        Ok(fetcher) => {
            commands.insert_resource(AssetFetcherHandle(std::sync::Arc::new(fetcher)));
            info!("Asset cache at {:?}", paths::cache_dir());
        }
        Err(e) => error!("Failed to create asset fetcher: {}", e),
    }
}

pub fn request_models(
    mut commands: Commands,
    mut requests: MessageReader<ShowModel>,
    mut slots: ResMut<SceneSlots>,
    catalog: Res<ModelCatalog>,
    fetcher: Option<Res<AssetFetcherHandle>>,
    arrivals: Res<AssetArrivals>,
    runner: Res<JobRunner>,
) {
    for request in requests.read() {
        let entry = match begin_model_swap(&mut commands, &mut slots, &catalog, &request.id) {
            Ok(entry) => entry,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };

        let Some(fetcher) = fetcher.as_ref() else {
            error!("No asset fetcher, cannot load model {}", entry.id);
            continue;
        };

        info!("Loading model {} from {}", entry.id, entry.url);
        let fetcher = fetcher.0.clone();
        let tx = arrivals.tx.clone();
        runner.run("model-fetch", move || {
            let result = fetcher.fetch(&entry.url, MODELS_DIR);
            let _ = tx.send(AssetArrival::Model { id: entry.id, result });
        });
    }
}

pub fn request_labels(
    mut commands: Commands,
    mut requests: MessageReader<ShowLabel>,
    mut slots: ResMut<SceneSlots>,
    style: Res<LabelStyle>,
    fetcher: Option<Res<AssetFetcherHandle>>,
    arrivals: Res<AssetArrivals>,
    runner: Res<JobRunner>,
) {
    for request in requests.read() {
        if let Some(previous) = slots.label.take() {
            commands.entity(previous).despawn();
        }

        let text = request.text.clone();
        let tx = arrivals.tx.clone();
        let dispatched = match fetcher.as_ref() {
            Some(fetcher) => {
                let fetcher = fetcher.0.clone();
                let font_url = style.font_url.clone();
                let text = text.clone();
                let tx = tx.clone();
                runner.run("font-fetch", move || {
                    let result = fetcher.fetch(&font_url, FONTS_DIR);
                    let _ = tx.send(AssetArrival::Font { text, result });
                })
            }
            None => false,
        };
        // The label is still shown, with the default font
        if !dispatched {
            let _ = tx.send(AssetArrival::Font {
                text,
                result: Err(FetchError::NotStarted("font download".to_string())),
            });
        }
    }
}

/// Drain finished downloads and put them into their slots. An arrival that
/// finds its slot occupied (an overlapping lookup landed first) replaces the
/// occupant.
pub fn install_arrivals(
    mut commands: Commands,
    arrivals: Res<AssetArrivals>,
    mut slots: ResMut<SceneSlots>,
    style: Res<LabelStyle>,
) {
    while let Ok(arrival) = arrivals.rx.try_recv() {
        match arrival {
            AssetArrival::Model { id, result: Ok(relative) } => {
                let placement = ModelPlacement::for_id(&id);
                let entity = commands
                    .spawn((
                        Name::new(format!("Weather model: {}", id)),
                        DisplayedModel {
                            id: id.clone(),
                            asset_path: paths::cache_asset_path(&relative),
                        },
                        placement.transform(),
                        Visibility::default(),
                    ))
                    .id();
                if let Some(previous) = slots.model.replace(entity) {
                    commands.entity(previous).despawn();
                }
                info!("Displaying model {}", id);
            }
            AssetArrival::Model { id, result: Err(e) } => {
                error!("An error happened while loading the model {}: {}", id, e);
            }
            AssetArrival::Font { text, result } => {
                let font = match result {
                    Ok(relative) => Some(paths::cache_asset_path(&relative)),
                    Err(e) => {
                        error!("Failed to load label font, using default: {}", e);
                        None
                    }
                };

                let mut label = commands.spawn((
                    Name::new("Weather label"),
                    WeatherLabel,
                    Text::new(text),
                    TextFont {
                        font_size: style.font_size,
                        ..default()
                    },
                    TextColor(LABEL_COLOR),
                    Node {
                        position_type: PositionType::Absolute,
                        left: Val::Px(LABEL_LEFT_PX),
                        top: Val::Px(LABEL_TOP_PX),
                        ..default()
                    },
                ));
                if let Some(font) = font {
                    label.insert(LabelFont(font));
                }
                let entity = label.id();
                if let Some(previous) = slots.label.replace(entity) {
                    commands.entity(previous).despawn();
                }
            }
        }
    }
}

pub fn attach_model_scenes(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    added: Query<(Entity, &DisplayedModel), Added<DisplayedModel>>,
) {
    for (entity, model) in added.iter() {
        let scene = asset_server.load(GltfAssetLabel::Scene(0).from_asset(model.asset_path.clone()));
        commands.entity(entity).insert(SceneRoot(scene));
    }
}

pub fn attach_label_fonts(
    asset_server: Res<AssetServer>,
    mut added: Query<(&LabelFont, &mut TextFont), Added<LabelFont>>,
) {
    for (font, mut text_font) in added.iter_mut() {
        text_font.font = asset_server.load(font.0.clone());
    }
}

/// Messages, slots, and the request/install systems with their ordering.
/// Asset-server attachment and the startup fetcher are added by
/// [`SwapperPlugin`].
pub fn add_swap_systems(app: &mut App) -> &mut App {
    app.add_message::<ShowModel>()
        .add_message::<ShowLabel>()
        .init_resource::<SceneSlots>()
        .init_resource::<AssetArrivals>()
        .init_resource::<JobRunner>()
        .add_systems(
            Update,
            (
                request_models,
                request_labels,
                install_arrivals.after(request_models).after(request_labels),
            ),
        )
}

pub struct SwapperPlugin;

impl Plugin for SwapperPlugin {
    fn build(&self, app: &mut App) {
        add_swap_systems(app)
            .add_systems(Startup, setup_asset_fetcher)
            .add_systems(
                Update,
                (
                    attach_model_scenes.after(install_arrivals),
                    attach_label_fonts.after(install_arrivals),
                ),
            );
    }
}
