//! Structured result schemas
//!
//! Each specialist produces exactly one of four payloads. The field tables
//! here drive validation (required vs defaulted fields, value kinds) and the
//! instructions given to the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier of a result schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaId {
    /// [`PlantIdentification`]
    Identification,
    /// [`CareRecommendation`]
    Cultivation,
    /// [`LocalRecommendation`]
    Locale,
    /// [`MarketplaceListings`]
    Marketplace,
}

impl SchemaId {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identification => "identification",
            Self::Cultivation => "cultivation",
            Self::Locale => "locale",
            Self::Marketplace => "marketplace",
        }
    }

    /// Field table for this schema
    #[must_use]
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Identification => IDENTIFICATION_FIELDS,
            Self::Cultivation => CULTIVATION_FIELDS,
            Self::Locale => LOCALE_FIELDS,
            Self::Marketplace => MARKETPLACE_FIELDS,
        }
    }

    /// Human-readable field list, used in prompts
    #[must_use]
    pub fn field_guide(&self) -> String {
        self.fields()
            .iter()
            .map(|f| {
                format!(
                    "- \"{}\" ({}, {})",
                    f.name,
                    f.kind.describe(),
                    if f.required { "required" } else { "optional" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Non-empty string
    Text,
    /// Number within an inclusive range
    Number {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// List of strings
    TextList,
    /// String to string map
    TextMap,
    /// String to any JSON value map
    AnyMap,
    /// List of retail listings
    Listings,
    /// String or null
    OptionalText,
}

impl FieldKind {
    fn describe(&self) -> String {
        match self {
            Self::Text => "string".to_string(),
            Self::Number { min, max } => format!("number between {} and {}", min, max),
            Self::TextList => "list of strings".to_string(),
            Self::TextMap => "object of string values".to_string(),
            Self::AnyMap => "object".to_string(),
            Self::Listings => {
                "list of {\"retailer\": string, \"price\": number, \"affiliate_link\": string, \
                 \"seller_rating\": number 0-5}"
                    .to_string()
            }
            Self::OptionalText => "string or null".to_string(),
        }
    }

    /// Default for a missing optional field
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Text => Value::String(String::new()),
            Self::Number { min, .. } => serde_json::json!(min),
            Self::TextList | Self::Listings => Value::Array(Vec::new()),
            Self::TextMap | Self::AnyMap => Value::Object(serde_json::Map::new()),
            Self::OptionalText => Value::Null,
        }
    }
}

/// One field of a schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// JSON key
    pub name: &'static str,
    /// Value kind
    pub kind: FieldKind,
    /// Required fields trigger repair when absent or invalid
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec { name, kind, required }
}

const CONFIDENCE: FieldKind = FieldKind::Number { min: 0.0, max: 1.0 };

const IDENTIFICATION_FIELDS: &[FieldSpec] = &[
    field("plant_name", FieldKind::Text, true),
    field("common_names", FieldKind::TextList, false),
    field("confidence", CONFIDENCE, true),
    field("characteristics", FieldKind::AnyMap, false),
];

const CULTIVATION_FIELDS: &[FieldSpec] = &[
    field("plant_name", FieldKind::Text, true),
    field("watering_schedule", FieldKind::Text, true),
    field("light_requirements", FieldKind::Text, true),
    field("soil_type", FieldKind::Text, false),
    field("fertilizer_schedule", FieldKind::Text, false),
    field("seasonal_care", FieldKind::TextMap, false),
];

const LOCALE_FIELDS: &[FieldSpec] = &[
    field("recommended_plants", FieldKind::TextList, true),
    field("hardiness_zone", FieldKind::Text, true),
    field("soil_notes", FieldKind::Text, false),
    field("location", FieldKind::Text, true),
    field("native_species", FieldKind::TextList, false),
];

const MARKETPLACE_FIELDS: &[FieldSpec] = &[
    field("listings", FieldKind::Listings, true),
    field("query_terms", FieldKind::TextList, false),
    field("recommended_seller", FieldKind::OptionalText, false),
];

/// Plant identification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantIdentification {
    /// Accepted (scientific or common) name
    pub plant_name: String,
    /// Other common names
    #[serde(default)]
    pub common_names: Vec<String>,
    /// Identification confidence in `[0, 1]`
    pub confidence: f64,
    /// Free-form botanical characteristics
    #[serde(default)]
    pub characteristics: BTreeMap<String, Value>,
}

/// Care recommendation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareRecommendation {
    /// Plant the advice is for
    pub plant_name: String,
    /// Watering guidance
    pub watering_schedule: String,
    /// Light guidance
    pub light_requirements: String,
    /// Soil guidance
    #[serde(default)]
    pub soil_type: String,
    /// Feeding guidance
    #[serde(default)]
    pub fertilizer_schedule: String,
    /// Season to notes
    #[serde(default)]
    pub seasonal_care: BTreeMap<String, String>,
}

/// Local growing-conditions result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRecommendation {
    /// Plants suited to the location
    pub recommended_plants: Vec<String>,
    /// Hardiness zone label
    pub hardiness_zone: String,
    /// Soil observations
    #[serde(default)]
    pub soil_notes: String,
    /// Location the advice applies to
    pub location: String,
    /// Native species for the region
    #[serde(default)]
    pub native_species: Vec<String>,
}

/// One retail listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Retailer name
    pub retailer: String,
    /// Price in USD
    pub price: f64,
    /// Link passed through as data
    pub affiliate_link: String,
    /// Rating in `[0, 5]`
    pub seller_rating: f64,
}

/// Marketplace result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceListings {
    /// Listings found
    pub listings: Vec<Listing>,
    /// Terms searched
    #[serde(default)]
    pub query_terms: Vec<String>,
    /// Best-value seller, when one stands out
    #[serde(default)]
    pub recommended_seller: Option<String>,
}

/// A validated payload, tagged by schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", content = "data", rename_all = "snake_case")]
pub enum StructuredPayload {
    /// Identification result
    Identification(PlantIdentification),
    /// Cultivation result
    Cultivation(CareRecommendation),
    /// Locale result
    Locale(LocalRecommendation),
    /// Marketplace result
    Marketplace(MarketplaceListings),
}

impl StructuredPayload {
    /// Schema of this payload
    #[must_use]
    pub fn schema(&self) -> SchemaId {
        match self {
            Self::Identification(_) => SchemaId::Identification,
            Self::Cultivation(_) => SchemaId::Cultivation,
            Self::Locale(_) => SchemaId::Locale,
            Self::Marketplace(_) => SchemaId::Marketplace,
        }
    }

    /// Build a payload from a normalized JSON object
    pub fn from_data(schema: SchemaId, data: Value) -> serde_json::Result<Self> {
        Ok(match schema {
            SchemaId::Identification => Self::Identification(serde_json::from_value(data)?),
            SchemaId::Cultivation => Self::Cultivation(serde_json::from_value(data)?),
            SchemaId::Locale => Self::Locale(serde_json::from_value(data)?),
            SchemaId::Marketplace => Self::Marketplace(serde_json::from_value(data)?),
        })
    }

    /// Empty payload for a schema, used when nothing could be salvaged
    #[must_use]
    pub fn placeholder(schema: SchemaId) -> Self {
        match schema {
            SchemaId::Identification => Self::Identification(PlantIdentification {
                plant_name: String::new(),
                common_names: Vec::new(),
                confidence: 0.0,
                characteristics: BTreeMap::new(),
            }),
            SchemaId::Cultivation => Self::Cultivation(CareRecommendation {
                plant_name: String::new(),
                watering_schedule: String::new(),
                light_requirements: String::new(),
                soil_type: String::new(),
                fertilizer_schedule: String::new(),
                seasonal_care: BTreeMap::new(),
            }),
            SchemaId::Locale => Self::Locale(LocalRecommendation {
                recommended_plants: Vec::new(),
                hardiness_zone: String::new(),
                soil_notes: String::new(),
                location: String::new(),
                native_species: Vec::new(),
            }),
            SchemaId::Marketplace => Self::Marketplace(MarketplaceListings {
                listings: Vec::new(),
                query_terms: Vec::new(),
                recommended_seller: None,
            }),
        }
    }

    /// The payload's fields as a JSON object (without the schema tag)
    #[must_use]
    pub fn to_data(&self) -> Value {
        let value = match self {
            Self::Identification(p) => serde_json::to_value(p),
            Self::Cultivation(p) => serde_json::to_value(p),
            Self::Locale(p) => serde_json::to_value(p),
            Self::Marketplace(p) => serde_json::to_value(p),
        };
        value.unwrap_or(Value::Null)
    }

    /// Plant name, for schemas that carry one
    #[must_use]
    pub fn plant_name(&self) -> Option<&str> {
        let name = match self {
            Self::Identification(p) => p.plant_name.as_str(),
            Self::Cultivation(p) => p.plant_name.as_str(),
            _ => return None,
        };
        Some(name).filter(|n| !n.is_empty())
    }

    /// Location, for the locale schema
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Locale(p) if !p.location.is_empty() => Some(p.location.as_str()),
            _ => None,
        }
    }

    /// Hardiness zone, for the locale schema
    #[must_use]
    pub fn hardiness_zone(&self) -> Option<&str> {
        match self {
            Self::Locale(p) if !p.hardiness_zone.is_empty() => Some(p.hardiness_zone.as_str()),
            _ => None,
        }
    }

    /// One-line summary for the assistant turn
    #[must_use]
    pub fn headline(&self) -> String {
        match self {
            Self::Identification(p) if !p.plant_name.is_empty() => {
                format!("identified {} ({:.0}% confident)", p.plant_name, p.confidence * 100.0)
            }
            Self::Cultivation(p) if !p.plant_name.is_empty() => {
                format!("care for {}: water {}", p.plant_name, p.watering_schedule)
            }
            Self::Locale(p) if !p.location.is_empty() => {
                format!("{} is in zone {}", p.location, p.hardiness_zone)
            }
            Self::Marketplace(p) if !p.listings.is_empty() => {
                let cheapest = p
                    .listings
                    .iter()
                    .map(|l| l.price)
                    .fold(f64::INFINITY, f64::min);
                format!("{} listings from ${:.2}", p.listings.len(), cheapest)
            }
            _ => format!("no {} result", self.schema()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_tagging() {
        let payload = StructuredPayload::Locale(LocalRecommendation {
            recommended_plants: vec!["Lavender".into()],
            hardiness_zone: "8b".into(),
            soil_notes: String::new(),
            location: "Kenton, Harrow".into(),
            native_species: vec![],
        });

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["schema"], "locale");
        assert_eq!(json["data"]["location"], "Kenton, Harrow");

        let back: StructuredPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.location(), Some("Kenton, Harrow"));
        assert_eq!(back.hardiness_zone(), Some("8b"));
        assert_eq!(back.plant_name(), None);
    }

    #[test]
    fn test_optional_fields_default() {
        let payload = StructuredPayload::from_data(
            SchemaId::Marketplace,
            json!({"listings": [{"retailer": "The Sill", "price": 35.0, "affiliate_link": "x", "seller_rating": 4.8}]}),
        )
        .unwrap();

        let StructuredPayload::Marketplace(listings) = &payload else {
            panic!("wrong schema");
        };
        assert!(listings.query_terms.is_empty());
        assert_eq!(listings.recommended_seller, None);
        assert_eq!(payload.headline(), "1 listings from $35.00");
    }

    #[test]
    fn test_placeholder_matches_schema() {
        for schema in [
            SchemaId::Identification,
            SchemaId::Cultivation,
            SchemaId::Locale,
            SchemaId::Marketplace,
        ] {
            let placeholder = StructuredPayload::placeholder(schema);
            assert_eq!(placeholder.schema(), schema);
            assert!(placeholder.headline().starts_with("no "));
        }
    }

    #[test]
    fn test_field_guide() {
        let guide = SchemaId::Identification.field_guide();
        assert!(guide.contains("\"plant_name\" (string, required)"));
        assert!(guide.contains("\"confidence\" (number between 0 and 1, required)"));
        assert!(guide.contains("\"common_names\" (list of strings, optional)"));
    }
}
