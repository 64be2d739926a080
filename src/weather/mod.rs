pub mod codes;
pub mod lookup;

pub use codes::*;
pub use lookup::*;

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::jobs::JobRunner;
use crate::swapper::{ShowLabel, ShowModel};

/// Start a lookup for a place name.
#[derive(Message, Debug, Clone)]
pub struct WeatherLookupRequested {
    pub location: String,
}

#[derive(Resource, Clone)]
pub struct WeatherClient(pub Arc<dyn WeatherService>);

#[derive(Debug)]
pub struct LookupOutcome {
    pub location: String,
    pub result: Result<LookupReport, LookupError>,
}

/// Channel carrying finished lookups back to the frame loop.
#[derive(Resource)]
pub struct LookupResults {
    tx: Sender<LookupOutcome>,
    rx: Receiver<LookupOutcome>,
}

impl Default for LookupResults {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }
}

/// What the control panel shows about lookups.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct LookupStatus {
    pub in_flight: usize,
    /// Blocking notification text, cleared when the user dismisses it.
    pub alert: Option<String>,
}

pub fn setup_weather_client(mut commands: Commands, config: Res<AppConfig>) {
    match OpenMeteoService::new(&config.services) {
        Ok(service) => {
            commands.insert_resource(WeatherClient(Arc::new(service)));
        }
        Err(e) => error!("Failed to create weather client: {}", e),
    }
}

pub fn start_weather_lookups(
    mut requests: MessageReader<WeatherLookupRequested>,
    client: Option<Res<WeatherClient>>,
    results: Res<LookupResults>,
    runner: Res<JobRunner>,
    mut status: ResMut<LookupStatus>,
) {
    for request in requests.read() {
        let Some(client) = client.as_ref() else {
            error!("No weather client, ignoring lookup for {}", request.location);
            continue;
        };

        info!("Looking up weather for {}", request.location);

        let service = client.0.clone();
        let tx = results.tx.clone();
        let location = request.location.clone();
        let dispatched = runner.run("weather-lookup", move || {
            let result = run_lookup(service.as_ref(), &location);
            let _ = tx.send(LookupOutcome { location, result });
        });
        // Only count lookups that will report back
        if dispatched {
            status.in_flight += 1;
        }
    }
}

/// Turn finished lookups into scene updates. The unit preference is read
/// here, when the label text is formatted.
pub fn apply_weather_results(
    results: Res<LookupResults>,
    unit: Res<UnitPreference>,
    mut status: ResMut<LookupStatus>,
    mut show_model: MessageWriter<ShowModel>,
    mut show_label: MessageWriter<ShowLabel>,
) {
    while let Ok(outcome) = results.rx.try_recv() {
        status.in_flight = status.in_flight.saturating_sub(1);

        let report = match outcome.result {
            Ok(report) => report,
            Err(LookupError::LocationNotFound(name)) => {
                warn!("Location not found: {}", name);
                status.alert = Some("Location not found!".to_string());
                continue;
            }
            Err(e) => {
                error!("Weather lookup for {} failed: {}", outcome.location, e);
                continue;
            }
        };

        let observation = report.observation;
        let display = code_to_display(observation.weather_code);
        match display {
            Some(display) => {
                show_model.write(ShowModel {
                    id: display.model_id.to_string(),
                });
            }
            None => debug!(
                "Weather code {} has no model, keeping current scene",
                observation.weather_code
            ),
        }

        let temperature = format_temperature(observation.temperature, unit.0);
        show_label.write(ShowLabel {
            text: compose_label(&report.location, &temperature, display.map(|d| d.suffix)),
        });
    }
}

/// Lookup messages, resources, and the dispatch/apply systems. Results are
/// applied before the swapper requests assets in the same frame.
pub fn add_lookup_systems(app: &mut App) -> &mut App {
    app.add_message::<WeatherLookupRequested>()
        .init_resource::<LookupResults>()
        .init_resource::<LookupStatus>()
        .init_resource::<UnitPreference>()
        .init_resource::<JobRunner>()
        .add_systems(
            Update,
            (
                start_weather_lookups,
                apply_weather_results
                    .after(start_weather_lookups)
                    .before(crate::swapper::request_models)
                    .before(crate::swapper::request_labels),
            ),
        )
}

pub struct WeatherPlugin;

impl Plugin for WeatherPlugin {
    fn build(&self, app: &mut App) {
        add_lookup_systems(app).add_systems(Startup, setup_weather_client);
    }
}
