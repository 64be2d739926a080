//! Weather code table and label text.

use bevy::prelude::*;

/// Unit used when formatting temperatures for the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "\u{00b0}C",
            TemperatureUnit::Fahrenheit => "\u{00b0}F",
        }
    }
}

/// Process-wide unit toggle, flipped from the control panel.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct UnitPreference(pub TemperatureUnit);

/// What a weather code contributes to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherDisplay {
    pub suffix: &'static str,
    pub model_id: &'static str,
}

/// Map a WMO weather code to its label suffix and model. `None` means the
/// code is not one we have art for and the scene keeps its current model.
pub fn code_to_display(code: u16) -> Option<WeatherDisplay> {
    let (suffix, model_id) = match code {
        0 => ("Sunny", "sun"),
        1 | 2 => ("Partly Cloudy", "clouds"),
        3 => ("Overcast", "darkclouds"),
        61 | 80 | 81 => ("Rainy", "rain"),
        _ => return None,
    };
    Some(WeatherDisplay { suffix, model_id })
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Fahrenheit is rounded to two decimals; Celsius is shown exactly as the
/// service reported it. The branches intentionally differ. A reported
/// `-0.0` reads as `0`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Fahrenheit => format!("{:.2}", celsius_to_fahrenheit(celsius)),
        TemperatureUnit::Celsius => {
            let celsius = if celsius == 0.0 { 0.0 } else { celsius };
            celsius.to_string()
        }
    }
}

pub fn compose_label(location: &str, temperature: &str, suffix: Option<&str>) -> String {
    let base = format!("Weather in {} is {} degrees and", location, temperature);
    match suffix {
        Some(suffix) => format!("{} {}", base, suffix),
        None => base,
    }
}
