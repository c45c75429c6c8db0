use async_trait::async_trait;
use serde::Deserialize;

use super::{clean_address, GeocodedLocation, Place, PlacesError, PlacesGateway};

const MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const MAX_PHOTOS_PER_PLACE: usize = 3;
const DETAIL_FIELDS: &str =
    "name,formatted_address,formatted_phone_number,website,opening_hours,rating,reviews";

/// Client for the Google Maps web-service JSON endpoints (geocoding, nearby
/// search, place details).
pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Deserialize)]
struct GeocodeEnvelope {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
    #[serde(default)]
    location_type: Option<String>,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct NearbyEnvelope {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct NearbyResult {
    name: String,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    types: Vec<String>,
    place_id: String,
    #[serde(default)]
    photos: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct DetailsEnvelope {
    status: String,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error_message: Option<String>,
}

impl GoogleMapsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, MAPS_BASE_URL)
    }

    /// Point the client at a different API root. Used by tests to target a
    /// local stub server.
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }

    fn key(&self) -> Result<&str, PlacesError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(PlacesError::MissingCredentials)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PlacesError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| PlacesError::Transport(err.to_string()))?;
        response
            .json::<T>()
            .await
            .map_err(|err| PlacesError::Transport(err.to_string()))
    }
}

fn check_status(status: &str, error_message: Option<String>) -> Result<(), PlacesError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(PlacesError::AddressNotFound),
        other => Err(PlacesError::Upstream {
            status: other.to_string(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl PlacesGateway for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, PlacesError> {
        let key = self.key()?;
        let cleaned = clean_address(address);
        let envelope: GeocodeEnvelope = self
            .get_json(
                "geocode/json",
                &[("address", cleaned.clone()), ("key", key.to_string())],
            )
            .await?;
        check_status(&envelope.status, envelope.error_message)?;

        let first = envelope
            .results
            .into_iter()
            .next()
            .ok_or(PlacesError::AddressNotFound)?;

        Ok(GeocodedLocation {
            lat: first.geometry.location.lat,
            lng: first.geometry.location.lng,
            formatted_address: first.formatted_address,
            original_address: address.to_string(),
            cleaned_address: cleaned,
            confidence: first
                .geometry
                .location_type
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius: u32,
        place_type: &str,
    ) -> Result<Vec<Place>, PlacesError> {
        let key = self.key()?;
        let envelope: NearbyEnvelope = self
            .get_json(
                "place/nearbysearch/json",
                &[
                    ("location", format!("{lat},{lng}")),
                    ("radius", radius.to_string()),
                    ("type", place_type.to_string()),
                    ("key", key.to_string()),
                ],
            )
            .await?;

        // A type with no matches is an empty list, not an error.
        if envelope.status == "ZERO_RESULTS" {
            return Ok(Vec::new());
        }
        check_status(&envelope.status, envelope.error_message)?;

        Ok(envelope
            .results
            .into_iter()
            .map(|result| Place {
                name: result.name,
                address: result.vicinity,
                rating: result.rating,
                types: result.types,
                place_id: result.place_id,
                photos: result
                    .photos
                    .into_iter()
                    .take(MAX_PHOTOS_PER_PLACE)
                    .collect(),
            })
            .collect())
    }

    async fn place_details(&self, place_id: &str) -> Result<serde_json::Value, PlacesError> {
        let key = self.key()?;
        let envelope: DetailsEnvelope = self
            .get_json(
                "place/details/json",
                &[
                    ("place_id", place_id.to_string()),
                    ("fields", DETAIL_FIELDS.to_string()),
                    ("key", key.to_string()),
                ],
            )
            .await?;
        check_status(&envelope.status, envelope.error_message)?;
        Ok(envelope.result)
    }
}
