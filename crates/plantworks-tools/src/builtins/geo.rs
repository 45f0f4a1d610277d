//! Location resolution
//!
//! The live resolver geocodes through Nominatim. The mock answers from a small
//! gazetteer and, for unknown places, derives stable pseudo-coordinates from
//! the place name so downstream tools stay deterministic.

use super::{coords_arg, fnv1a, required_str, round1};
use crate::contract::{CapabilityKind, ParamKind, ParamRule, ParamSpec, ToolContract};
use crate::error::{Error, Result};
use crate::registry::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// A resolved place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Display name
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Country, when known
    pub country: Option<String>,
    /// Whether the coordinates are derived rather than looked up
    pub approximate: bool,
}

// name, latitude, longitude, country
const GAZETTEER: &[(&str, f64, f64, &str)] = &[
    ("kenton", 51.5878, -0.3086, "United Kingdom"),
    ("stanmore", 51.6194, -0.3028, "United Kingdom"),
    ("pinner", 51.5934, -0.3809, "United Kingdom"),
    ("wembley", 51.5560, -0.2796, "United Kingdom"),
    ("harrow", 51.5806, -0.3420, "United Kingdom"),
    ("london", 51.5074, -0.1278, "United Kingdom"),
    ("manchester", 53.4808, -2.2426, "United Kingdom"),
    ("edinburgh", 55.9533, -3.1883, "United Kingdom"),
    ("dublin", 53.3498, -6.2603, "Ireland"),
    ("paris", 48.8566, 2.3522, "France"),
    ("seattle", 47.6062, -122.3321, "United States"),
    ("portland", 45.5152, -122.6784, "United States"),
    ("minneapolis", 44.9778, -93.2650, "United States"),
    ("chicago", 41.8781, -87.6298, "United States"),
    ("new york", 40.7128, -74.0060, "United States"),
    ("denver", 39.7392, -104.9903, "United States"),
    ("san francisco", 37.7749, -122.4194, "United States"),
    ("california", 36.7783, -119.4179, "United States"),
    ("atlanta", 33.7490, -84.3880, "United States"),
    ("los angeles", 34.0522, -118.2437, "United States"),
    ("phoenix", 33.4484, -112.0740, "United States"),
    ("texas", 31.9686, -99.9018, "United States"),
    ("austin", 30.2672, -97.7431, "United States"),
    ("florida", 27.6648, -81.5158, "United States"),
    ("miami", 25.7617, -80.1918, "United States"),
    ("honolulu", 21.3069, -157.8583, "United States"),
    ("toronto", 43.6532, -79.3832, "Canada"),
    ("sydney", -33.8688, 151.2093, "Australia"),
    ("singapore", 1.3521, 103.8198, "Singapore"),
];

fn title_case(word: &str) -> String {
    word.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look a place up in the gazetteer
///
/// Comma-separated queries are tried most-specific first, so
/// `"Kenton, Harrow"` resolves to Kenton.
#[must_use]
pub fn gazetteer_lookup(query: &str) -> Option<Place> {
    let lowered = query.to_lowercase();
    lowered
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .find_map(|segment| {
            GAZETTEER
                .iter()
                .find(|(name, ..)| segment == *name || segment.contains(name))
        })
        .map(|(name, lat, lon, country)| Place {
            name: title_case(name),
            latitude: *lat,
            longitude: *lon,
            country: Some((*country).to_string()),
            approximate: false,
        })
}

/// Gazetteer hit, or stable pseudo-coordinates derived from the name
#[must_use]
pub fn approximate_place(query: &str) -> Place {
    if let Some(place) = gazetteer_lookup(query) {
        return place;
    }
    let seed = fnv1a(&query.trim().to_lowercase());
    // Spread over populated latitudes
    let latitude = round1(-40.0 + (seed % 1000) as f64 / 1000.0 * 100.0);
    let longitude = round1(-180.0 + ((seed / 1000) % 3600) as f64 / 10.0);
    Place {
        name: query.trim().to_string(),
        latitude,
        longitude,
        country: None,
        approximate: true,
    }
}

/// Bound coordinates if present, otherwise an approximate lookup
pub(super) fn place_for(location: &str, args: &Value) -> Place {
    match coords_arg(args) {
        Some((latitude, longitude)) => Place {
            name: location.to_string(),
            latitude,
            longitude,
            country: args
                .get("country")
                .and_then(Value::as_str)
                .map(str::to_string),
            approximate: false,
        },
        None => approximate_place(location),
    }
}

fn contract(kind: CapabilityKind) -> ToolContract {
    ToolContract::new(
        "location_resolver",
        "Resolve a place name to coordinates. Accepts neighbourhoods qualified by \
         their town, e.g. 'Kenton, Harrow'.",
        kind,
    )
    .with_param(
        ParamSpec::required("query", ParamKind::String, "Place name to resolve")
            .with_rule(ParamRule::NonEmpty),
    )
    .with_output_keys(&["query", "resolved_name", "latitude", "longitude"])
}

fn place_payload(query: &str, place: &Place, source: &str) -> Value {
    json!({
        "query": query,
        "resolved_name": place.name,
        "latitude": place.latitude,
        "longitude": place.longitude,
        "country": place.country,
        "approximate": place.approximate,
        "source": source,
    })
}

/// Nominatim-backed resolver
pub struct LocationResolverTool {
    contract: ToolContract,
    client: reqwest::Client,
}

impl LocationResolverTool {
    /// Create a new resolver
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            contract: contract(CapabilityKind::Live),
            client,
        }
    }
}

#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

#[async_trait::async_trait]
impl Tool for LocationResolverTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        debug!(query, "Geocoding via Nominatim");

        let response = self
            .client
            .get(NOMINATIM_URL)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!("nominatim returned {}", response.status())));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| Error::Execution(format!("unexpected nominatim payload: {}", e)))?;
        let hit = places
            .into_iter()
            .next()
            .ok_or_else(|| Error::Execution(format!("no geocoding match for '{}'", query)))?;

        let parse = |s: &str| {
            s.parse::<f64>()
                .map_err(|e| Error::Execution(format!("bad coordinate '{}': {}", s, e)))
        };
        let place = Place {
            name: hit.display_name,
            latitude: parse(&hit.lat)?,
            longitude: parse(&hit.lon)?,
            country: None,
            approximate: false,
        };
        Ok(place_payload(query, &place, "nominatim"))
    }
}

/// Gazetteer-backed resolver
pub struct MockLocationResolverTool {
    contract: ToolContract,
}

impl MockLocationResolverTool {
    /// Create a new mock resolver
    #[must_use]
    pub fn new() -> Self {
        Self {
            contract: contract(CapabilityKind::Mock),
        }
    }
}

impl Default for MockLocationResolverTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for MockLocationResolverTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let mut place = approximate_place(query);
        // Keep the caller's qualification ("Kenton, Harrow") in the name
        if query.contains(',') && !place.approximate {
            place.name = query.to_string();
        }
        Ok(place_payload(query, &place, "gazetteer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gazetteer_prefers_most_specific_segment() {
        let place = gazetteer_lookup("Kenton, Harrow").unwrap();
        assert_eq!(place.name, "Kenton");
        assert!((place.latitude - 51.5878).abs() < 1e-9);

        let place = gazetteer_lookup("harrow").unwrap();
        assert_eq!(place.name, "Harrow");
        assert_eq!(place.country.as_deref(), Some("United Kingdom"));

        assert_eq!(gazetteer_lookup("New York").unwrap().name, "New York");
        assert!(gazetteer_lookup("Atlantis").is_none());
    }

    #[test]
    fn test_approximate_place_is_stable() {
        let a = approximate_place("Atlantis");
        let b = approximate_place(" atlantis ");
        assert!(a.approximate);
        assert_eq!(a.latitude, b.latitude);
        assert_eq!(a.longitude, b.longitude);
        assert!((-40.0..=60.0).contains(&a.latitude));
        assert!((-180.0..=180.0).contains(&a.longitude));
    }

    #[test]
    fn test_place_for_uses_bound_coordinates() {
        let args = json!({"latitude": 10.0, "longitude": 20.0});
        let place = place_for("Somewhere", &args);
        assert_eq!((place.latitude, place.longitude), (10.0, 20.0));
        assert!(!place.approximate);
    }

    #[tokio::test]
    async fn test_mock_resolver_keeps_qualified_name() {
        let tool = MockLocationResolverTool::new();
        let payload = tool.call(json!({"query": "Kenton, Harrow"})).await.unwrap();
        assert_eq!(payload["resolved_name"], "Kenton, Harrow");
        assert_eq!(payload["source"], "gazetteer");
        assert!(tool.contract().missing_output_keys(&payload).is_empty());
    }
}
