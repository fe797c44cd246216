//! HTTP collaborators
//!
//! Each upstream service sits behind a trait so the menu can be driven by
//! fakes; the concrete clients share one blocking [`ApiClient`].

pub mod geocode;
pub mod stock;
pub mod weather;

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, Result};

pub use geocode::{CensusGeocoder, GeocodeMatch, Geocoder};
pub use stock::{AlphaVantageClient, Overview, Quote, QuoteService};
pub use weather::{ForecastLinks, ForecastPeriod, NoaaClient, Observation, Station, WeatherService};

/// Shared blocking HTTP client
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    /// Build a client that sends `user_agent` on every request.
    ///
    /// weather.gov rejects requests without a User-Agent.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::Config(format!("invalid user agent {:?}: {}", user_agent, e)))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, application/geo+json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http })
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Non-2xx responses become [`Error::Upstream`] carrying the status and body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", redact(url));
        let resp = self.http.get(url).send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Upstream(format!("{} - {}", status, body.trim())));
        }

        let body = resp.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Strip the API key from a URL before it reaches the logs
fn redact(url: &str) -> String {
    match url.find("apikey=") {
        Some(idx) => {
            let start = idx + "apikey=".len();
            let end = url[start..].find('&').map(|i| start + i).unwrap_or(url.len());
            format!("{}***{}", &url[..start], &url[end..])
        }
        None => url.to_string(),
    }
}

/// Google Maps search link for a coordinate pair
pub fn maps_url(latitude: f64, longitude: f64) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={:.6},{:.6}",
        latitude, longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_url() {
        assert_eq!(
            maps_url(34.0, -118.25),
            "https://www.google.com/maps/search/?api=1&query=34.000000,-118.250000"
        );
    }

    #[test]
    fn test_redact_api_key() {
        assert_eq!(
            redact("https://x.test/query?function=OVERVIEW&symbol=IBM&apikey=SECRET"),
            "https://x.test/query?function=OVERVIEW&symbol=IBM&apikey=***"
        );
        assert_eq!(
            redact("https://x.test/query?apikey=SECRET&symbol=IBM"),
            "https://x.test/query?apikey=***&symbol=IBM"
        );
        assert_eq!(redact("https://api.weather.gov/points/1,2"), "https://api.weather.gov/points/1,2");
    }

    #[test]
    fn test_client_rejects_bad_user_agent() {
        assert!(matches!(ApiClient::new("bad\nagent", None), Err(Error::Config(_))));
    }
}
