//! NOAA weather.gov client
//!
//! A `points` lookup yields the forecast URLs for a coordinate; forecasts are
//! lists of periods (12-hour for the regular forecast, 1-hour for hourly).

use serde::Deserialize;

use super::ApiClient;
use crate::Result;

const NOAA_BASE_URL: &str = "https://api.weather.gov";

/// How many nearby observation stations to report
pub const NEAREST_STATIONS: usize = 4;

/// Forecast endpoints for one grid point
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLinks {
    #[serde(default)]
    pub forecast: String,
    #[serde(default)]
    pub forecast_hourly: String,
}

/// One forecast period
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastPeriod {
    pub number: u32,
    pub name: String,
    pub start_time: String,
    pub temperature: i64,
    pub temperature_unit: String,
    pub short_forecast: String,
    pub detailed_forecast: String,
}

impl ForecastPeriod {
    /// Temperature with unit, e.g. "68F"
    pub fn reading(&self) -> String {
        format!("{}{}", self.temperature, self.temperature_unit)
    }
}

/// Observation station near a point
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub identifier: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A single measured quantity; `value` is null when the sensor had no reading
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Measurement {
    pub value: Option<f64>,
}

/// Latest observation reported by a station (metric units)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Observation {
    pub timestamp: String,
    pub text_description: String,
    pub temperature: Measurement,
    pub dewpoint: Measurement,
    pub wind_speed: Measurement,
    pub wind_direction: Measurement,
    pub relative_humidity: Measurement,
    pub barometric_pressure: Measurement,
}

/// Forecasts and observations for a coordinate
pub trait WeatherService {
    fn forecast_links(&self, latitude: f64, longitude: f64) -> Result<ForecastLinks>;

    /// Periods behind a forecast URL from [`ForecastLinks`]
    fn periods(&self, url: &str) -> Result<Vec<ForecastPeriod>>;

    /// Nearest stations first, at most [`NEAREST_STATIONS`]
    fn nearest_stations(&self, latitude: f64, longitude: f64) -> Result<Vec<Station>>;

    fn latest_observation(&self, station_id: &str) -> Result<Observation>;
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: ForecastLinks,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    geometry: Geometry,
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationProperties {
    name: String,
    station_identifier: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: Observation,
}

/// weather.gov API client
pub struct NoaaClient {
    client: ApiClient,
    base_url: String,
}

impl NoaaClient {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: NOAA_BASE_URL.to_string(),
        }
    }

    /// weather.gov redirects anything finer than four decimals
    fn point(&self, latitude: f64, longitude: f64) -> String {
        format!("{}/points/{:.4},{:.4}", self.base_url, latitude, longitude)
    }
}

impl WeatherService for NoaaClient {
    fn forecast_links(&self, latitude: f64, longitude: f64) -> Result<ForecastLinks> {
        let response: PointsResponse = self.client.get_json(&self.point(latitude, longitude))?;
        Ok(response.properties)
    }

    fn periods(&self, url: &str) -> Result<Vec<ForecastPeriod>> {
        let response: ForecastResponse = self.client.get_json(url)?;
        Ok(response.properties.periods)
    }

    fn nearest_stations(&self, latitude: f64, longitude: f64) -> Result<Vec<Station>> {
        let url = format!("{}/stations", self.point(latitude, longitude));
        let response: StationsResponse = self.client.get_json(&url)?;
        Ok(stations_from(response))
    }

    fn latest_observation(&self, station_id: &str) -> Result<Observation> {
        let url = format!("{}/stations/{}/observations/latest", self.base_url, station_id);
        let response: ObservationResponse = self.client.get_json(&url)?;
        Ok(response.properties)
    }
}

/// GeoJSON coordinates are `[longitude, latitude]`
fn stations_from(response: StationsResponse) -> Vec<Station> {
    response
        .features
        .into_iter()
        .filter(|f| f.geometry.coordinates.len() >= 2)
        .take(NEAREST_STATIONS)
        .map(|f| Station {
            identifier: f.properties.station_identifier,
            name: f.properties.name,
            latitude: f.geometry.coordinates[1],
            longitude: f.geometry.coordinates[0],
        })
        .collect()
}

/// Reading to cache for an address: the first hourly period
pub fn current_reading(hourly: &[ForecastPeriod]) -> Option<String> {
    hourly.first().map(ForecastPeriod::reading)
}

/// Periods shown for the regular forecast: the next four and the last two.
pub fn forecast_highlights(periods: &[ForecastPeriod]) -> Vec<&ForecastPeriod> {
    if periods.len() <= 6 {
        return periods.iter().collect();
    }
    periods[..4].iter().chain(periods[periods.len() - 2..].iter()).collect()
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(number: u32, temperature: i64) -> ForecastPeriod {
        ForecastPeriod {
            number,
            name: format!("Period {}", number),
            temperature,
            temperature_unit: "F".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_points() {
        let body = r#"{
            "properties": {
                "forecast": "https://api.weather.gov/gridpoints/LOX/155,45/forecast",
                "forecastHourly": "https://api.weather.gov/gridpoints/LOX/155,45/forecast/hourly",
                "county": "https://api.weather.gov/zones/county/CAC037"
            }
        }"#;
        let response: PointsResponse = serde_json::from_str(body).unwrap();
        assert!(response.properties.forecast_hourly.ends_with("/forecast/hourly"));
    }

    #[test]
    fn test_parse_periods() {
        let body = r#"{
            "properties": {
                "periods": [{
                    "number": 1,
                    "name": "Tonight",
                    "startTime": "2024-08-26T18:00:00-07:00",
                    "endTime": "2024-08-27T06:00:00-07:00",
                    "isDaytime": false,
                    "temperature": 68,
                    "temperatureUnit": "F",
                    "shortForecast": "Mostly Clear",
                    "detailedForecast": "Mostly clear, with a low around 68."
                }]
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        let periods = response.properties.periods;
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].name, "Tonight");
        assert_eq!(current_reading(&periods).as_deref(), Some("68F"));
    }

    #[test]
    fn test_current_reading_empty() {
        assert!(current_reading(&[]).is_none());
    }

    #[test]
    fn test_stations_swap_coordinates() {
        let body = r#"{
            "features": [
                {"geometry": {"type": "Point", "coordinates": [-118.41, 33.94]},
                 "properties": {"name": "Los Angeles Intl", "stationIdentifier": "KLAX"}},
                {"geometry": {"type": "Point", "coordinates": []},
                 "properties": {"name": "Broken", "stationIdentifier": "XXXX"}},
                {"geometry": {"type": "Point", "coordinates": [-118.35, 33.92]},
                 "properties": {"name": "Hawthorne", "stationIdentifier": "KHHR"}},
                {"geometry": {"type": "Point", "coordinates": [-118.15, 33.81]},
                 "properties": {"name": "Long Beach", "stationIdentifier": "KLGB"}},
                {"geometry": {"type": "Point", "coordinates": [-118.45, 34.02]},
                 "properties": {"name": "Santa Monica", "stationIdentifier": "KSMO"}},
                {"geometry": {"type": "Point", "coordinates": [-118.0, 34.0]},
                 "properties": {"name": "Fifth", "stationIdentifier": "KFFF"}}
            ]
        }"#;
        let response: StationsResponse = serde_json::from_str(body).unwrap();
        let stations = stations_from(response);
        assert_eq!(stations.len(), NEAREST_STATIONS);
        assert_eq!(stations[0].identifier, "KLAX");
        assert_eq!(stations[0].latitude, 33.94);
        assert_eq!(stations[0].longitude, -118.41);
        assert_eq!(stations[1].identifier, "KHHR");
    }

    #[test]
    fn test_observation_nulls() {
        let body = r#"{
            "properties": {
                "timestamp": "2024-08-26T14:25:00+00:00",
                "textDescription": "Clear",
                "temperature": {"unitCode": "wmoUnit:degC", "value": 20.0},
                "dewpoint": {"unitCode": "wmoUnit:degC", "value": null}
            }
        }"#;
        let response: ObservationResponse = serde_json::from_str(body).unwrap();
        let obs = response.properties;
        assert_eq!(obs.temperature.value, Some(20.0));
        assert!(obs.dewpoint.value.is_none());
        assert!(obs.wind_speed.value.is_none());
    }

    #[test]
    fn test_forecast_highlights() {
        let periods: Vec<_> = (1..=14).map(|n| period(n, 60 + n as i64)).collect();
        let picked: Vec<u32> = forecast_highlights(&periods).iter().map(|p| p.number).collect();
        assert_eq!(picked, vec![1, 2, 3, 4, 13, 14]);

        let short: Vec<_> = (1..=3).map(|n| period(n, 70)).collect();
        assert_eq!(forecast_highlights(&short).len(), 3);
    }

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
    }
}
