//! US Census one-line address geocoder

use serde::Deserialize;
use tracing::debug;

use super::ApiClient;
use crate::Result;

const CENSUS_BASE_URL: &str = "https://geocoding.geo.census.gov/geocoder/locations/onelineaddress";

/// Best match for a free-form address
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub matched_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolves free-form address text to a single best match
pub trait Geocoder {
    /// `Ok(None)` when the service found no match.
    fn geocode(&self, address: &str) -> Result<Option<GeocodeMatch>>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    result: GeocodeResult,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(rename = "addressMatches", default)]
    address_matches: Vec<AddressMatch>,
}

#[derive(Debug, Deserialize)]
struct AddressMatch {
    #[serde(rename = "matchedAddress")]
    matched_address: String,
    coordinates: Coordinates,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    x: f64,
    y: f64,
}

/// Census geocoding API client
pub struct CensusGeocoder {
    client: ApiClient,
    base_url: String,
}

impl CensusGeocoder {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: CENSUS_BASE_URL.to_string(),
        }
    }

    fn url_for(&self, address: &str) -> String {
        format!(
            "{}?address={}&benchmark=4&format=json",
            self.base_url,
            urlencoding::encode(address.trim())
        )
    }
}

impl Geocoder for CensusGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<GeocodeMatch>> {
        let response: GeocodeResponse = self.client.get_json(&self.url_for(address))?;
        let best = first_match(response);
        debug!("Geocoded {:?} -> {:?}", address, best);
        Ok(best)
    }
}

/// x is longitude and y is latitude in the Census payload
fn first_match(response: GeocodeResponse) -> Option<GeocodeMatch> {
    response
        .result
        .address_matches
        .into_iter()
        .next()
        .map(|m| GeocodeMatch {
            matched_address: m.matched_address,
            latitude: m.coordinates.y,
            longitude: m.coordinates.x,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match() {
        let body = r#"{
            "result": {
                "input": {"address": {"address": "432 Park Ave, 10022"}},
                "addressMatches": [
                    {
                        "matchedAddress": "432 PARK AVE, NEW YORK, NY, 10022",
                        "coordinates": {"x": -73.97186, "y": 40.76147}
                    },
                    {
                        "matchedAddress": "432 PARK AVE S, NEW YORK, NY, 10016",
                        "coordinates": {"x": -73.98, "y": 40.74}
                    }
                ]
            }
        }"#;
        let response: GeocodeResponse = serde_json::from_str(body).unwrap();
        let best = first_match(response).unwrap();
        assert_eq!(best.matched_address, "432 PARK AVE, NEW YORK, NY, 10022");
        assert_eq!(best.latitude, 40.76147);
        assert_eq!(best.longitude, -73.97186);
    }

    #[test]
    fn test_no_matches() {
        let response: GeocodeResponse =
            serde_json::from_str(r#"{"result": {"addressMatches": []}}"#).unwrap();
        assert!(first_match(response).is_none());
    }

    #[test]
    fn test_url_encodes_address() {
        let client = ApiClient::new("polyapi-test", None).unwrap();
        let geocoder = CensusGeocoder::new(client);
        assert_eq!(
            geocoder.url_for(" 432 Park Ave, 10022 "),
            "https://geocoding.geo.census.gov/geocoder/locations/onelineaddress?address=432%20Park%20Ave%2C%2010022&benchmark=4&format=json"
        );
    }
}
