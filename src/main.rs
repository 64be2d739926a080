use bevy::asset::io::AssetSourceBuilder;
use bevy::asset::AssetApp;
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;

mod catalog;
mod config;
mod fetch;
mod jobs;
mod paths;
mod scene;
mod swapper;
mod ui;
mod weather;

use config::ConfigPlugin;
use scene::ScenePlugin;
use swapper::SwapperPlugin;
use ui::UiPlugin;
use weather::WeatherPlugin;

fn main() {
    // Remote models and fonts are downloaded here and read back through
    // `cache://`; the source has to exist before AssetPlugin is built.
    let cache_root = paths::cache_dir();
    paths::ensure_dir(&cache_root);

    App::new()
        .register_asset_source(
            paths::CACHE_SOURCE,
            AssetSourceBuilder::platform_default(&cache_root.to_string_lossy(), None),
        )
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Weather Diorama".to_string(),
                    resolution: (1280, 720).into(),
                    ..default()
                }),
                ..default()
            }),
            EguiPlugin::default(),
            ConfigPlugin,
        ))
        // Redraw every frame, whether or not anything is pending
        .insert_resource(WinitSettings::game())
        .add_plugins((ScenePlugin, SwapperPlugin, WeatherPlugin, UiPlugin))
        .run();
}
