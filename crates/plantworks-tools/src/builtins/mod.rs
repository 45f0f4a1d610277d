//! Built-in plant tools
//!
//! Three tools reach live sources and carry a mock fallback
//! (`plant_database_search`, `location_resolver`, `weather_lookup`); the rest
//! compute their payloads from built-in reference tables.

mod care;
mod geo;
mod locale;
mod market;
mod plant_search;
mod weather;

pub use care::{DiseaseIdentifierTool, PlantCareSchedulerTool};
pub use geo::{LocationResolverTool, MockLocationResolverTool, Place};
pub use locale::{HardinessZoneTool, NativePlantFinderTool, SoilAnalyzerTool};
pub use market::{MarketplaceSearchTool, PriceComparatorTool, SellerVerifierTool};
pub use plant_search::{
    clean_plant_query, mentioned_plant, retrieve_plants, MockPlantSearchTool, PlantPassage, PlantSearchTool,
};
pub use weather::{MockWeatherTool, WeatherLookupTool};

use crate::error::{Error, Result};
use crate::registry::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Identifies the service to Nominatim and other public APIs
const USER_AGENT: &str = concat!("plantworks/", env!("CARGO_PKG_VERSION"));

/// Credentials for the live sources, read once at start
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ToolCredentials {
    /// Google API key (Custom Search)
    #[serde(default)]
    pub google_api_key: Option<String>,
    /// Google Custom Search engine id
    #[serde(default)]
    pub google_cse_id: Option<String>,
    /// OpenWeather API key
    #[serde(default)]
    pub openweather_api_key: Option<String>,
}

impl fmt::Debug for ToolCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };
        f.debug_struct("ToolCredentials")
            .field("google_api_key", &set(&self.google_api_key))
            .field("google_cse_id", &set(&self.google_cse_id))
            .field("openweather_api_key", &set(&self.openweather_api_key))
            .finish()
    }
}

/// Register every plant tool
///
/// Live tools share one HTTP client whose timeout matches the registry's
/// per-invocation timeout.
pub fn register_plant_tools(registry: &mut ToolRegistry, credentials: &ToolCredentials) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_millis(registry.config().timeout_ms))
        .build()?;

    registry.register_with_fallback(
        Arc::new(PlantSearchTool::new(client.clone(), credentials)),
        Arc::new(MockPlantSearchTool::new()),
    )?;
    registry.register_with_fallback(
        Arc::new(LocationResolverTool::new(client.clone())),
        Arc::new(MockLocationResolverTool::new()),
    )?;
    registry.register_with_fallback(
        Arc::new(WeatherLookupTool::new(client, credentials)),
        Arc::new(MockWeatherTool::new()),
    )?;

    registry.register(Arc::new(PlantCareSchedulerTool::new()))?;
    registry.register(Arc::new(DiseaseIdentifierTool::new()))?;
    registry.register(Arc::new(HardinessZoneTool::new()))?;
    registry.register(Arc::new(SoilAnalyzerTool::new()))?;
    registry.register(Arc::new(NativePlantFinderTool::new()))?;
    registry.register(Arc::new(MarketplaceSearchTool::new()))?;
    registry.register(Arc::new(PriceComparatorTool::new()))?;
    registry.register(Arc::new(SellerVerifierTool::new()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Shared argument helpers
// ---------------------------------------------------------------------------

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    str_arg(args, key).ok_or_else(|| Error::InvalidArgs(format!("missing '{}'", key)))
}

/// Explicit coordinates if the caller bound them
fn coords_arg(args: &Value) -> Option<(f64, f64)> {
    let lat = args.get("latitude").and_then(Value::as_f64)?;
    let lon = args.get("longitude").and_then(Value::as_f64)?;
    Some((lat, lon))
}

/// FNV-1a, used to seed location-dependent mock data
fn fnv1a(input: &str) -> u64 {
    input.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
