//! Geocoding and nearby-place aggregation.

mod google;

pub use google::GoogleMapsClient;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default search radius in meters.
pub const DEFAULT_RADIUS_METERS: u32 = 1000;

/// Upper bound on places kept per category.
pub const MAX_PLACES_PER_CATEGORY: usize = 5;

/// The fixed category set used when the caller supplies none.
const DEFAULT_CATEGORIES: [(&str, &str); 8] = [
    ("hospital", "Hospitals & Medical Centers"),
    ("restaurant", "Restaurants & Cafes"),
    ("transit_station", "Transportation Hubs"),
    ("school", "Schools & Universities"),
    ("shopping_mall", "Shopping Centers"),
    ("park", "Parks & Recreation"),
    ("bank", "Banks & ATMs"),
    ("pharmacy", "Pharmacies"),
];

/// A resolved address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedLocation {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    pub original_address: String,
    pub cleaned_address: String,
    pub confidence: String,
}

/// One place record as returned by the upstream places service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub types: Vec<String>,
    pub place_id: String,
    #[serde(default)]
    pub photos: Vec<serde_json::Value>,
}

/// A place annotated with the category it was found under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedPlace {
    #[serde(flatten)]
    pub place: Place,
    pub category: String,
    #[serde(rename = "type")]
    pub place_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("no maps API key configured")]
    MissingCredentials,
    #[error("address not found")]
    AddressNotFound,
    #[error("maps request failed: {0}")]
    Transport(String),
    #[error("maps API returned status {status}: {message}")]
    Upstream { status: String, message: String },
}

/// Seam for the upstream geocoding/places service.
#[async_trait]
pub trait PlacesGateway: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, PlacesError>;

    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius: u32,
        place_type: &str,
    ) -> Result<Vec<Place>, PlacesError>;

    async fn place_details(&self, place_id: &str) -> Result<serde_json::Value, PlacesError>;
}

/// Normalize a free-text address before geocoding: collapse whitespace and
/// comma runs, drop empty segments, strip leading/trailing commas.
pub fn clean_address(address: &str) -> String {
    address
        .split(',')
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Turn an upstream place type into a human-readable label
/// (`transit_station` -> `Transit Station`).
pub fn format_type_label(place_type: &str) -> String {
    place_type
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fans out one nearby lookup per category and merges the results.
///
/// A failed category lookup is logged and omitted; the aggregation as a whole
/// still succeeds. Lookups are issued sequentially.
pub struct NearbyAggregator {
    gateway: Arc<dyn PlacesGateway>,
}

impl NearbyAggregator {
    pub fn new(gateway: Arc<dyn PlacesGateway>) -> Self {
        Self { gateway }
    }

    /// Look up nearby places for every requested category. With no `types`,
    /// the fixed default set of 8 categories is used; otherwise exactly the
    /// caller-supplied types, each labeled from its type name. Each category
    /// keeps at most [`MAX_PLACES_PER_CATEGORY`] places in upstream order;
    /// categories with no surviving places are left out of the map.
    pub async fn search_multiple_types(
        &self,
        lat: f64,
        lng: f64,
        radius: u32,
        types: Option<&[String]>,
    ) -> BTreeMap<String, Vec<CategorizedPlace>> {
        let categories: Vec<(String, String)> = match types {
            Some(selected) if !selected.is_empty() => selected
                .iter()
                .map(|place_type| (place_type.clone(), format_type_label(place_type)))
                .collect(),
            _ => DEFAULT_CATEGORIES
                .iter()
                .map(|(place_type, label)| (place_type.to_string(), label.to_string()))
                .collect(),
        };

        let mut results = BTreeMap::new();
        for (place_type, label) in categories {
            match self.gateway.nearby(lat, lng, radius, &place_type).await {
                Ok(places) if !places.is_empty() => {
                    let categorized: Vec<CategorizedPlace> = places
                        .into_iter()
                        .take(MAX_PLACES_PER_CATEGORY)
                        .map(|place| CategorizedPlace {
                            place,
                            category: label.clone(),
                            place_type: place_type.clone(),
                        })
                        .collect();
                    results.insert(label, categorized);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(category = %label, %err, "nearby lookup failed; omitting category");
                }
            }
        }
        results
    }
}
