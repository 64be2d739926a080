//! Place name to coordinates (Nominatim), coordinates to current conditions
//! (Open-Meteo).

use bevy::prelude::*;
use serde::Deserialize;

use crate::config::ServicesConfig;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid coordinates in geocode response: {0}")]
    InvalidCoordinates(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions as reported by Open-Meteo's `current_weather` block.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeatherObservation {
    /// Degrees Celsius
    pub temperature: f64,
    #[serde(rename = "weathercode")]
    pub weather_code: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupReport {
    pub location: String,
    pub coordinates: Coordinates,
    pub observation: WeatherObservation,
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
pub struct GeocodeHit {
    pub lat: String,
    pub lon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: WeatherObservation,
}

/// Coordinates of the first hit, or `None` for an empty result set.
pub fn first_hit_coordinates(hits: &[GeocodeHit]) -> Result<Option<Coordinates>, LookupError> {
    let Some(hit) = hits.first() else {
        return Ok(None);
    };
    let latitude = hit
        .lat
        .trim()
        .parse()
        .map_err(|_| LookupError::InvalidCoordinates(format!("lat={}", hit.lat)))?;
    let longitude = hit
        .lon
        .trim()
        .parse()
        .map_err(|_| LookupError::InvalidCoordinates(format!("lon={}", hit.lon)))?;
    Ok(Some(Coordinates { latitude, longitude }))
}

pub trait WeatherService: Send + Sync + 'static {
    fn resolve_location(&self, name: &str) -> Result<Option<Coordinates>, LookupError>;
    fn fetch_current_weather(&self, coordinates: Coordinates) -> Result<WeatherObservation, LookupError>;
}

/// Resolve `location` and fetch its current weather. An empty geocode result
/// stops the pipeline before any weather request is made.
pub fn run_lookup(service: &dyn WeatherService, location: &str) -> Result<LookupReport, LookupError> {
    let coordinates = service
        .resolve_location(location)?
        .ok_or_else(|| LookupError::LocationNotFound(location.to_string()))?;
    info!(
        "Resolved {} to ({:.4}, {:.4})",
        location, coordinates.latitude, coordinates.longitude
    );

    let observation = service.fetch_current_weather(coordinates)?;
    info!(
        "Current weather for {}: {} C, code {}",
        location, observation.temperature, observation.weather_code
    );

    Ok(LookupReport {
        location: location.to_string(),
        coordinates,
        observation,
    })
}

/// Nominatim search plus Open-Meteo forecast over a blocking reqwest client.
pub struct OpenMeteoService {
    client: reqwest::blocking::Client,
    geocode_url: String,
    forecast_url: String,
}

impl OpenMeteoService {
    pub fn new(services: &ServicesConfig) -> Result<Self, LookupError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(services.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            geocode_url: services.geocode_url.clone(),
            forecast_url: services.forecast_url.clone(),
        })
    }
}

impl WeatherService for OpenMeteoService {
    fn resolve_location(&self, name: &str) -> Result<Option<Coordinates>, LookupError> {
        let hits: Vec<GeocodeHit> = self
            .client
            .get(&self.geocode_url)
            .query(&[("format", "json"), ("q", name)])
            .send()?
            .error_for_status()?
            .json()?;
        debug!("Geocode for {} returned {} results", name, hits.len());
        first_hit_coordinates(&hits)
    }

    fn fetch_current_weather(&self, coordinates: Coordinates) -> Result<WeatherObservation, LookupError> {
        let latitude = coordinates.latitude.to_string();
        let longitude = coordinates.longitude.to_string();
        let response: ForecastResponse = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current_weather", "true"),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.current_weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        hit: Option<Coordinates>,
        observation: WeatherObservation,
        weather_calls: AtomicUsize,
    }

    impl CountingService {
        fn new(hit: Option<Coordinates>) -> Self {
            Self {
                hit,
                observation: WeatherObservation {
                    temperature: 12.5,
                    weather_code: 3,
                },
                weather_calls: AtomicUsize::new(0),
            }
        }
    }

    impl WeatherService for CountingService {
        fn resolve_location(&self, _name: &str) -> Result<Option<Coordinates>, LookupError> {
            Ok(self.hit)
        }

        fn fetch_current_weather(&self, _coordinates: Coordinates) -> Result<WeatherObservation, LookupError> {
            self.weather_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.observation)
        }
    }

    #[test]
    fn empty_geocode_never_fetches_weather() {
        let service = CountingService::new(None);
        let result = run_lookup(&service, "Atlantis");
        assert!(matches!(result, Err(LookupError::LocationNotFound(ref name)) if name == "Atlantis"));
        assert_eq!(service.weather_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resolved_location_fetches_weather_once() {
        let paris = Coordinates {
            latitude: 48.8535,
            longitude: 2.3484,
        };
        let service = CountingService::new(Some(paris));
        let report = run_lookup(&service, "Paris").unwrap();
        assert_eq!(report.location, "Paris");
        assert_eq!(report.coordinates, paris);
        assert_eq!(report.observation.weather_code, 3);
        assert_eq!(service.weather_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn geocode_payload_uses_first_hit() {
        let hits: Vec<GeocodeHit> = serde_json::from_str(
            r#"[
                {"place_id": 1, "lat": "48.8534951", "lon": "2.3483915", "display_name": "Paris, France"},
                {"place_id": 2, "lat": "33.6617962", "lon": "-95.555513", "display_name": "Paris, Texas"}
            ]"#,
        )
        .unwrap();
        let coords = first_hit_coordinates(&hits).unwrap().unwrap();
        assert_eq!(coords.latitude, 48.8534951);
        assert_eq!(coords.longitude, 2.3483915);
    }

    #[test]
    fn empty_geocode_payload_is_none() {
        let hits: Vec<GeocodeHit> = serde_json::from_str("[]").unwrap();
        assert_eq!(first_hit_coordinates(&hits).unwrap(), None);
    }

    #[test]
    fn non_numeric_coordinates_are_rejected() {
        let hits = vec![GeocodeHit {
            lat: "north".to_string(),
            lon: "2.0".to_string(),
        }];
        assert!(matches!(
            first_hit_coordinates(&hits),
            Err(LookupError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn forecast_payload_extracts_current_weather() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{
                "latitude": 48.86,
                "longitude": 2.34,
                "current_weather": {
                    "time": "2024-05-01T12:00",
                    "temperature": 21.3,
                    "windspeed": 9.4,
                    "winddirection": 240,
                    "is_day": 1,
                    "weathercode": 0
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            response.current_weather,
            WeatherObservation {
                temperature: 21.3,
                weather_code: 0
            }
        );
    }
}
