/// Control panel: location input, lookup button, unit toggle and the
/// "location not found" alert.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::weather::{LookupStatus, TemperatureUnit, UnitPreference, WeatherLookupRequested};

const PANEL_MARGIN: f32 = 12.0;
const INPUT_WIDTH: f32 = 180.0;

#[derive(Resource, Debug, Default)]
pub struct LookupPanelState {
    pub location_input: String,
}

/// Draw the panel. Returns the trimmed location when the user asks for a
/// lookup; blank input is ignored.
pub fn render_lookup_panel_ui(
    ctx: &egui::Context,
    location_input: &mut String,
    status: &mut LookupStatus,
    unit: &mut TemperatureUnit,
) -> Option<String> {
    let mut submitted = None;

    egui::Window::new("Weather")
        .anchor(egui::Align2::LEFT_TOP, [PANEL_MARGIN, PANEL_MARGIN])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            let response = ui.add(
                egui::TextEdit::singleline(location_input)
                    .hint_text("Enter a location")
                    .desired_width(INPUT_WIDTH),
            );
            let pressed_enter =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.horizontal(|ui| {
                let clicked = ui.button("Get Weather").clicked();
                if (clicked || pressed_enter) && !location_input.trim().is_empty() {
                    submitted = Some(location_input.trim().to_string());
                }

                if ui
                    .button(unit.symbol())
                    .on_hover_text("Switch between Celsius and Fahrenheit")
                    .clicked()
                {
                    *unit = unit.toggled();
                }
            });

            if status.in_flight > 0 {
                ui.label("Looking up\u{2026}");
            }
        });

    if let Some(message) = status.alert.clone() {
        let mut dismissed = false;
        let modal = egui::Modal::new(egui::Id::new("lookup_alert")).show(ctx, |ui| {
            ui.label(message);
            dismissed = ui.button("OK").clicked();
        });
        if dismissed || modal.should_close() {
            status.alert = None;
        }
    }

    submitted
}

pub fn render_lookup_panel(
    mut contexts: EguiContexts,
    mut panel: ResMut<LookupPanelState>,
    mut status: ResMut<LookupStatus>,
    mut unit: ResMut<UnitPreference>,
    mut requests: MessageWriter<WeatherLookupRequested>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let before = unit.0;
    let mut current = unit.0;
    let submitted = render_lookup_panel_ui(ctx, &mut panel.location_input, &mut status, &mut current);
    if current != before {
        unit.0 = current;
        info!("Temperature unit: {}", current.symbol());
    }

    if let Some(location) = submitted {
        requests.write(WeatherLookupRequested { location });
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LookupPanelState>()
            .add_systems(EguiPrimaryContextPass, render_lookup_panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui_kittest::Harness;
    use egui_kittest::kittest::Queryable;

    #[derive(Default)]
    struct Panel {
        input: String,
        status: LookupStatus,
        unit: TemperatureUnit,
        submitted: Vec<String>,
    }

    fn harness(panel: Panel) -> Harness<'static, Panel> {
        Harness::new_state(
            |ctx, state: &mut Panel| {
                if let Some(location) =
                    render_lookup_panel_ui(ctx, &mut state.input, &mut state.status, &mut state.unit)
                {
                    state.submitted.push(location);
                }
            },
            panel,
        )
    }

    #[test]
    fn test_panel_renders_controls() {
        let harness = harness(Panel::default());
        harness.get_by_label("Get Weather");
        harness.get_by_label("\u{00b0}C");
    }

    #[test]
    fn test_get_weather_submits_trimmed_location() {
        let mut harness = harness(Panel {
            input: "  Paris ".to_string(),
            ..Default::default()
        });

        harness.get_by_label("Get Weather").click();
        harness.run();

        assert_eq!(harness.state().submitted, vec!["Paris".to_string()]);
    }

    #[test]
    fn test_blank_location_is_not_submitted() {
        let mut harness = harness(Panel {
            input: "   ".to_string(),
            ..Default::default()
        });

        harness.get_by_label("Get Weather").click();
        harness.run();

        assert!(harness.state().submitted.is_empty());
    }

    #[test]
    fn test_unit_button_toggles() {
        let mut harness = harness(Panel::default());

        harness.get_by_label("\u{00b0}C").click();
        harness.run();

        assert_eq!(harness.state().unit, TemperatureUnit::Fahrenheit);
        harness.get_by_label("\u{00b0}F");
    }

    #[test]
    fn test_pending_indicator() {
        let harness = harness(Panel {
            status: LookupStatus {
                in_flight: 1,
                alert: None,
            },
            ..Default::default()
        });
        harness.get_by_label("Looking up\u{2026}");
    }

    #[test]
    fn test_alert_is_shown_until_dismissed() {
        let mut harness = harness(Panel {
            status: LookupStatus {
                in_flight: 0,
                alert: Some("Location not found!".to_string()),
            },
            ..Default::default()
        });

        harness.get_by_label("Location not found!");
        harness.get_by_label("OK").click();
        harness.run();

        assert_eq!(harness.state().status.alert, None);
    }
}
