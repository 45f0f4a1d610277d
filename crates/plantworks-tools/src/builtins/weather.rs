//! Weather lookup
//!
//! Live path: OpenWeather current conditions. Mock path: latitude-derived
//! conditions so the same location always yields the same payload.

use super::geo::place_for;
use super::{required_str, round1, ToolCredentials};
use crate::contract::{CapabilityKind, ParamKind, ParamRule, ParamSpec, ToolContract};
use crate::error::{Error, Result};
use crate::registry::Tool;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const DEFAULT_DAYS: u64 = 3;

fn contract(kind: CapabilityKind) -> ToolContract {
    ToolContract::new(
        "weather_lookup",
        "Current weather and growing conditions for a location.",
        kind,
    )
    .with_param(
        ParamSpec::required("location", ParamKind::String, "City or place name")
            .with_rule(ParamRule::NonEmpty),
    )
    .with_param(
        ParamSpec::optional("days", ParamKind::Integer, "Forecast days (1-16)")
            .with_rule(ParamRule::Range { min: 1.0, max: 16.0 }),
    )
    .with_param(ParamSpec::optional("latitude", ParamKind::Number, "Resolved latitude"))
    .with_param(ParamSpec::optional("longitude", ParamKind::Number, "Resolved longitude"))
    .with_output_keys(&["location", "current", "growing_conditions"])
}

/// Gardening advice derived from temperature (°C) and relative humidity
fn growing_conditions(temperature: f64, humidity: f64) -> Value {
    json!({
        "outdoor_suitable": temperature > 10.0 && temperature < 35.0,
        "frost_warning": temperature < 5.0,
        "heat_stress_warning": temperature > 30.0,
        "watering_recommendation": if humidity > 50.0 { "normal" } else { "increase" },
        "humidity_level": if (40.0..=70.0).contains(&humidity) { "good" } else { "monitor" },
    })
}

/// OpenWeather-backed lookup
pub struct WeatherLookupTool {
    contract: ToolContract,
    client: reqwest::Client,
    api_key: Option<String>,
}

impl WeatherLookupTool {
    /// Create a new weather tool
    #[must_use]
    pub fn new(client: reqwest::Client, credentials: &ToolCredentials) -> Self {
        Self {
            contract: contract(CapabilityKind::Live),
            client,
            api_key: credentials.openweather_api_key.clone(),
        }
    }
}

#[derive(Deserialize)]
struct OwResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

#[derive(Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Deserialize)]
struct OwWind {
    speed: f64,
}

#[async_trait::async_trait]
impl Tool for WeatherLookupTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let Some(api_key) = &self.api_key else {
            return Err(Error::MissingCredential("OPENWEATHER_API_KEY".to_string()));
        };
        let location = required_str(&args, "location")?;
        let place = place_for(location, &args);
        debug!(location, lat = place.latitude, lon = place.longitude, "Fetching OpenWeather conditions");

        let response = self
            .client
            .get(OPENWEATHER_URL)
            .query(&[
                ("lat", place.latitude.to_string()),
                ("lon", place.longitude.to_string()),
                ("appid", api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!("openweather returned {}", response.status())));
        }
        let body: OwResponse = response
            .json()
            .await
            .map_err(|e| Error::Execution(format!("unexpected openweather payload: {}", e)))?;

        let description = body
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default();

        Ok(json!({
            "location": location,
            "coordinates": {"lat": place.latitude, "lon": place.longitude},
            "current": {
                "temperature": body.main.temp,
                "humidity": body.main.humidity,
                "description": description,
                "wind_speed": body.wind.map(|w| w.speed),
            },
            "growing_conditions": growing_conditions(body.main.temp, body.main.humidity),
        }))
    }
}

/// Deterministic weather derived from latitude
pub struct MockWeatherTool {
    contract: ToolContract,
}

impl MockWeatherTool {
    /// Create a new mock weather tool
    #[must_use]
    pub fn new() -> Self {
        Self {
            contract: contract(CapabilityKind::Mock),
        }
    }
}

impl Default for MockWeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for MockWeatherTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let location = required_str(&args, "location")?;
        let place = place_for(location, &args);
        let days = args.get("days").and_then(Value::as_u64).unwrap_or(DEFAULT_DAYS);

        let temperature = round1(25.0 - place.latitude.abs() * 0.3);
        let humidity = 65.0;
        let forecast: Vec<Value> = (0..days)
            .map(|i| {
                json!({
                    "day": i + 1,
                    "high": round1(temperature + 2.0 - i as f64 * 0.5),
                    "low": round1(temperature - 6.0 - i as f64 * 0.5),
                    "description": "partly cloudy",
                })
            })
            .collect();

        Ok(json!({
            "location": location,
            "coordinates": {"lat": place.latitude, "lon": place.longitude},
            "current": {
                "temperature": temperature,
                "humidity": humidity,
                "description": "partly cloudy",
                "wind_speed": 3.5,
            },
            "forecast": forecast,
            "growing_conditions": growing_conditions(temperature, humidity),
        }))
    }
}
