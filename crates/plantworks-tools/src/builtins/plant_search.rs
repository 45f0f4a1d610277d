//! Plant database search
//!
//! Live path: Google Custom Search. Mock path: a built-in catalogue of common
//! garden and house plants, also used by the care scheduler.

use super::{required_str, ToolCredentials};
use crate::contract::{CapabilityKind, ParamKind, ParamRule, ParamSpec, ToolContract};
use crate::error::{Error, Result};
use crate::registry::Tool;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::sync::LazyLock;
use tracing::debug;

const CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const DEFAULT_LIMIT: u64 = 5;

static QUESTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(what\s+is|what\s+are|tell\s+me\s+about|search\s+for|find|information\s+on)\s+")
        .expect("QUESTION_PREFIX is a compile-time constant")
});

/// Strip question framing from a search query
///
/// Falls back to the trimmed input when nothing would remain.
#[must_use]
pub fn clean_plant_query(query: &str) -> String {
    let trimmed = query.trim();
    let cleaned = QUESTION_PREFIX.replace(trimmed, "");
    let cleaned = cleaned.trim().trim_end_matches('?').trim();
    if cleaned.is_empty() {
        trimmed.to_string()
    } else {
        cleaned.to_string()
    }
}

pub(crate) struct PlantRecord {
    pub scientific_name: &'static str,
    pub common_names: &'static [&'static str],
    pub family: &'static str,
    pub plant_type: &'static str,
    pub light: &'static str,
    pub watering: &'static str,
    pub soil: &'static str,
    pub care_level: &'static str,
    pub traits: &'static [(&'static str, &'static str)],
}

impl PlantRecord {
    fn matches(&self, query: &str) -> bool {
        let scientific = self.scientific_name.to_lowercase();
        if scientific.contains(query) || query.contains(&scientific) {
            return true;
        }
        // Genus alone ("monstera") is a match too
        if let Some(genus) = scientific.split_whitespace().next() {
            if query.split_whitespace().any(|w| w == genus) {
                return true;
            }
        }
        self.common_names
            .iter()
            .any(|name| name.contains(query) || query.contains(name))
    }

    fn searchable_text(&self) -> String {
        let traits = self.traits.iter().map(|(k, v)| format!("{} {}", k, v));
        [self.scientific_name, self.family, self.plant_type, self.light, self.watering, self.soil]
            .into_iter()
            .map(str::to_string)
            .chain(self.common_names.iter().map(|n| (*n).to_string()))
            .chain(traits)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    fn summary(&self) -> String {
        let mut info = format!(
            "{} ({}), {} in the {} family. Light: {}. Watering: {}. Soil: {}. Care level: {}.",
            self.scientific_name,
            self.common_names.join(", "),
            self.plant_type,
            self.family,
            self.light,
            self.watering,
            self.soil,
            self.care_level,
        );
        for (name, detail) in self.traits {
            let _ = write!(info, " {}: {}.", name, detail);
        }
        info
    }

    pub(crate) fn to_json(&self) -> Value {
        let traits: Map<String, Value> = self
            .traits
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect();
        json!({
            "scientific_name": self.scientific_name,
            "common_names": self.common_names,
            "family": self.family,
            "type": self.plant_type,
            "light": self.light,
            "watering": self.watering,
            "soil": self.soil,
            "care_level": self.care_level,
            "characteristics": traits,
        })
    }
}

pub(crate) const CATALOGUE: &[PlantRecord] = &[
    PlantRecord {
        scientific_name: "Monstera deliciosa",
        common_names: &["swiss cheese plant", "split-leaf philodendron", "monstera"],
        family: "Araceae",
        plant_type: "climbing evergreen",
        light: "Bright, indirect light",
        watering: "Every 1-2 weeks, letting the top 5 cm of soil dry out",
        soil: "Chunky, well-draining aroid mix",
        care_level: "easy",
        traits: &[
            ("leaves", "Large, glossy, heart-shaped with fenestrations"),
            ("growth_habit", "Climber with aerial roots"),
            ("native_range", "Southern Mexico to Panama"),
        ],
    },
    PlantRecord {
        scientific_name: "Rosa",
        common_names: &["rose", "red rose", "garden rose", "hybrid tea rose"],
        family: "Rosaceae",
        plant_type: "shrub",
        light: "Full sun, at least 6 hours daily",
        watering: "Deeply twice a week in summer, at the base",
        soil: "Rich, moist loam with pH 6.0-6.5",
        care_level: "intermediate",
        traits: &[
            ("stems", "Woody, usually thorny"),
            ("flowers", "Five-petalled wild forms, many-petalled cultivars"),
            ("fruit", "Hips, rich in vitamin C"),
        ],
    },
    PlantRecord {
        scientific_name: "Dracaena trifasciata",
        common_names: &["snake plant", "mother-in-law's tongue", "sansevieria"],
        family: "Asparagaceae",
        plant_type: "succulent perennial",
        light: "Low to bright indirect light",
        watering: "Every 2-3 weeks, less in winter",
        soil: "Free-draining cactus mix",
        care_level: "easy",
        traits: &[
            ("leaves", "Stiff, upright, sword-shaped with banding"),
            ("tolerance", "Drought and low-light tolerant"),
        ],
    },
    PlantRecord {
        scientific_name: "Ficus lyrata",
        common_names: &["fiddle leaf fig", "fiddle-leaf fig"],
        family: "Moraceae",
        plant_type: "tree",
        light: "Bright, filtered light",
        watering: "Weekly, when the top 2-3 cm of soil is dry",
        soil: "Well-draining, peat-based potting mix",
        care_level: "intermediate",
        traits: &[
            ("leaves", "Large, violin-shaped, leathery"),
            ("sensitivity", "Drops leaves after draughts or relocation"),
        ],
    },
    PlantRecord {
        scientific_name: "Epipremnum aureum",
        common_names: &["pothos", "golden pothos", "devil's ivy"],
        family: "Araceae",
        plant_type: "trailing vine",
        light: "Low to bright indirect light",
        watering: "Every 1-2 weeks when the soil is half dry",
        soil: "General-purpose potting mix",
        care_level: "easy",
        traits: &[("leaves", "Heart-shaped, variegated gold and green")],
    },
    PlantRecord {
        scientific_name: "Lavandula angustifolia",
        common_names: &["lavender", "english lavender"],
        family: "Lamiaceae",
        plant_type: "shrub",
        light: "Full sun",
        watering: "Sparingly once established",
        soil: "Poor, gritty, alkaline and free-draining",
        care_level: "easy",
        traits: &[
            ("flowers", "Fragrant purple spikes"),
            ("wildlife", "Strong pollinator plant"),
        ],
    },
    PlantRecord {
        scientific_name: "Solanum lycopersicum",
        common_names: &["tomato", "tomatoes"],
        family: "Solanaceae",
        plant_type: "annual vegetable",
        light: "Full sun",
        watering: "Consistently, keeping soil evenly moist",
        soil: "Rich, well-drained soil with added compost",
        care_level: "intermediate",
        traits: &[("fruit", "Red, yellow or purple berries")],
    },
    PlantRecord {
        scientific_name: "Ocimum basilicum",
        common_names: &["basil", "sweet basil"],
        family: "Lamiaceae",
        plant_type: "annual herb",
        light: "Full sun to bright light",
        watering: "Keep soil lightly moist",
        soil: "Moist, fertile, well-drained",
        care_level: "easy",
        traits: &[("leaves", "Aromatic, glossy green")],
    },
    PlantRecord {
        scientific_name: "Echinacea purpurea",
        common_names: &["purple coneflower", "coneflower", "echinacea"],
        family: "Asteraceae",
        plant_type: "perennial",
        light: "Full sun",
        watering: "Drought tolerant once established",
        soil: "Well-drained, tolerates poor soil",
        care_level: "easy",
        traits: &[("flowers", "Purple daisy-like with a spiky orange cone")],
    },
    PlantRecord {
        scientific_name: "Helianthus annuus",
        common_names: &["sunflower", "common sunflower"],
        family: "Asteraceae",
        plant_type: "annual",
        light: "Full sun",
        watering: "Deeply once a week",
        soil: "Loose, well-drained",
        care_level: "easy",
        traits: &[("flowers", "Large yellow heads that track the sun when young")],
    },
    PlantRecord {
        scientific_name: "Opuntia ficus-indica",
        common_names: &["prickly pear", "cactus", "cacti", "prickly pear cactus"],
        family: "Cactaceae",
        plant_type: "succulent",
        light: "Full sun",
        watering: "Every 3-4 weeks, none in winter",
        soil: "Sandy, gritty cactus mix",
        care_level: "easy",
        traits: &[("stems", "Flat pads covered in glochids")],
    },
    PlantRecord {
        scientific_name: "Acer rubrum",
        common_names: &["red maple", "maple"],
        family: "Sapindaceae",
        plant_type: "tree",
        light: "Full sun to partial shade",
        watering: "Regularly while young",
        soil: "Adaptable, prefers slightly acidic",
        care_level: "easy",
        traits: &[("foliage", "Brilliant red autumn colour")],
    },
];

/// Catalogue entries matching `query`, best first
pub(crate) fn search_catalogue(query: &str, limit: usize) -> Vec<&'static PlantRecord> {
    let needle = clean_plant_query(query).to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    CATALOGUE
        .iter()
        .filter(|record| record.matches(&needle))
        .take(limit)
        .collect()
}

/// First catalogue entry for `name`
pub(crate) fn find_plant(name: &str) -> Option<&'static PlantRecord> {
    search_catalogue(name, 1).into_iter().next()
}

/// A catalogue entry retrieved for a free-text question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantPassage {
    /// Scientific name
    pub plant: String,
    /// Prose summary of the entry
    pub info: String,
    /// Relevance; higher is better
    pub score: u32,
}

const STOP_WORDS: &[&str] = &[
    "about", "and", "are", "can", "does", "for", "has", "have", "how", "its", "need", "needs",
    "plant", "plants", "that", "the", "what", "which", "with",
];

/// Catalogue entries relevant to `question`, best first
///
/// A named plant outranks any number of descriptive word hits. Ties keep
/// catalogue order.
#[must_use]
pub fn retrieve_plants(question: &str, top_k: usize) -> Vec<PlantPassage> {
    let words: Vec<String> = question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| w.len() >= 3 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect();
    let named = search_catalogue(question, CATALOGUE.len());

    let mut scored: Vec<(u32, &PlantRecord)> = CATALOGUE
        .iter()
        .map(|record| {
            let text = record.searchable_text();
            let hits = words.iter().filter(|w| contains_word(&text, w)).count() as u32;
            let bonus = if named.iter().any(|n| std::ptr::eq(*n, record)) { 10 } else { 0 };
            (hits + bonus, record)
        })
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(top_k)
        .map(|(score, record)| PlantPassage {
            plant: record.scientific_name.to_string(),
            info: record.summary(),
            score,
        })
        .collect()
}

/// Longest catalogue plant named in free text
///
/// Matches whole words only. A bare genus ("monstera") resolves to the full
/// scientific name; common names are returned as written in the catalogue.
#[must_use]
pub fn mentioned_plant(text: &str) -> Option<&'static str> {
    let haystack = text.to_lowercase();
    let mut best: Option<(usize, &'static str)> = None;

    for record in CATALOGUE {
        let genus = record
            .scientific_name
            .split_whitespace()
            .next()
            .filter(|_| record.scientific_name.contains(' '));
        let candidates = std::iter::once((record.scientific_name, record.scientific_name))
            .chain(genus.map(|g| (g, record.scientific_name)))
            .chain(record.common_names.iter().map(|n| (*n, *n)));

        for (needle, resolved) in candidates {
            let needle = needle.to_lowercase();
            if contains_word(&haystack, &needle) && best.map_or(true, |(len, _)| needle.len() > len) {
                best = Some((needle.len(), resolved));
            }
        }
    }
    best.map(|(_, name)| name)
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        let boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
        // Allow a plural "s"
        let plural = after == Some('s')
            && boundary(haystack[start + needle.len() + 1..].chars().next());
        boundary(before) && (boundary(after) || plural)
    })
}

fn contract(kind: CapabilityKind) -> ToolContract {
    ToolContract::new(
        "plant_database_search",
        "Search plant databases for identification and botanical details.",
        kind,
    )
    .with_param(
        ParamSpec::required("query", ParamKind::String, "Plant name or characteristics")
            .with_rule(ParamRule::NonEmpty),
    )
    .with_param(
        ParamSpec::optional("limit", ParamKind::Integer, "Maximum results (1-10)")
            .with_rule(ParamRule::Range { min: 1.0, max: 10.0 }),
    )
    .with_output_keys(&["query", "results", "sources"])
}

fn limit_arg(args: &Value) -> u64 {
    args.get("limit").and_then(Value::as_u64).unwrap_or(DEFAULT_LIMIT)
}

/// Google Custom Search backed plant search
pub struct PlantSearchTool {
    contract: ToolContract,
    client: reqwest::Client,
    api_key: Option<String>,
    cse_id: Option<String>,
}

impl PlantSearchTool {
    /// Create a new search tool
    #[must_use]
    pub fn new(client: reqwest::Client, credentials: &ToolCredentials) -> Self {
        Self {
            contract: contract(CapabilityKind::Live),
            client,
            api_key: credentials.google_api_key.clone(),
            cse_id: credentials.google_cse_id.clone(),
        }
    }
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
struct CseItem {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

#[async_trait::async_trait]
impl Tool for PlantSearchTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let (Some(api_key), Some(cse_id)) = (&self.api_key, &self.cse_id) else {
            return Err(Error::MissingCredential("GOOGLE_API_KEY / GOOGLE_CSE_ID".to_string()));
        };
        let query = clean_plant_query(required_str(&args, "query")?);
        let limit = limit_arg(&args).to_string();
        debug!(query = %query, "Searching Google Custom Search");

        let response = self
            .client
            .get(CSE_URL)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", cse_id.as_str()),
                ("q", query.as_str()),
                ("num", limit.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!("custom search returned {}", response.status())));
        }
        let body: CseResponse = response
            .json()
            .await
            .map_err(|e| Error::Execution(format!("unexpected custom search payload: {}", e)))?;

        let results: Vec<Value> = body
            .items
            .into_iter()
            .map(|item| json!({"title": item.title, "snippet": item.snippet, "link": item.link}))
            .collect();

        Ok(json!({
            "query": query,
            "total_found": results.len(),
            "results": results,
            "sources": ["Google Custom Search"],
        }))
    }
}

/// Catalogue-backed plant search
pub struct MockPlantSearchTool {
    contract: ToolContract,
}

impl MockPlantSearchTool {
    /// Create a new mock search tool
    #[must_use]
    pub fn new() -> Self {
        Self {
            contract: contract(CapabilityKind::Mock),
        }
    }
}

impl Default for MockPlantSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for MockPlantSearchTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let query = clean_plant_query(required_str(&args, "query")?);
        let results: Vec<Value> = search_catalogue(&query, limit_arg(&args) as usize)
            .into_iter()
            .map(PlantRecord::to_json)
            .collect();

        Ok(json!({
            "query": query,
            "total_found": results.len(),
            "results": results,
            "sources": ["Plantworks catalogue"],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plant_query() {
        assert_eq!(clean_plant_query("What is Monstera deliciosa?"), "Monstera deliciosa");
        assert_eq!(clean_plant_query("tell me about  cacti"), "cacti");
        assert_eq!(clean_plant_query("  snake plant "), "snake plant");
        assert_eq!(clean_plant_query("find"), "find");
    }

    #[test]
    fn test_catalogue_matching() {
        assert_eq!(find_plant("Monstera deliciosa").unwrap().family, "Araceae");
        assert_eq!(find_plant("monstera").unwrap().scientific_name, "Monstera deliciosa");
        assert_eq!(find_plant("red rose").unwrap().scientific_name, "Rosa");
        assert_eq!(find_plant("Sansevieria").unwrap().common_names[0], "snake plant");
        assert!(find_plant("triffid").is_none());
    }

    #[test]
    fn test_retrieve_plants_ranks_by_relevance() {
        let passages = retrieve_plants("which plant is drought tolerant with sword-shaped leaves?", 3);
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].plant, "Dracaena trifasciata");
        assert!(passages[0].score > passages[1].score);
        assert!(passages[0].info.contains("snake plant"));

        // A named plant wins over descriptive matches
        let passages = retrieve_plants("how much light does a monstera need", 2);
        assert_eq!(passages[0].plant, "Monstera deliciosa");
        assert!(passages[0].info.contains("Light: Bright, indirect light."));

        assert!(retrieve_plants("triffid", 3).is_empty());
        assert!(retrieve_plants("lavender", 0).is_empty());
    }

    #[test]
    fn test_mentioned_plant() {
        assert_eq!(mentioned_plant("how can I grow a red rose in Harrow"), Some("red rose"));
        assert_eq!(mentioned_plant("where can I buy monsteras"), Some("Monstera deliciosa"));
        assert_eq!(mentioned_plant("What is Monstera deliciosa?"), Some("Monstera deliciosa"));
        assert_eq!(mentioned_plant("my prose is purple"), None);
        assert_eq!(mentioned_plant("identify this and where to buy it"), None);
    }

    #[tokio::test]
    async fn test_mock_search_is_deterministic() {
        let tool = MockPlantSearchTool::new();
        let args = json!({"query": "What is a fiddle leaf fig?", "limit": 3});
        let first = tool.call(args.clone()).await.unwrap();
        let second = tool.call(args).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first["results"][0]["scientific_name"], "Ficus lyrata");
        assert!(tool.contract().missing_output_keys(&first).is_empty());
    }

    #[tokio::test]
    async fn test_live_search_requires_credentials() {
        let tool = PlantSearchTool::new(reqwest::Client::new(), &ToolCredentials::default());
        let err = tool.call(json!({"query": "rose"})).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }
}
