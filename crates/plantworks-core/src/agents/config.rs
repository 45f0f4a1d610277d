//! Agent Configuration
//!
//! The four fixed specialists and their static tool wiring.

use crate::schema::SchemaId;
use serde::{Deserialize, Serialize};

/// Which specialist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Plant identification and botanical knowledge
    Identification,
    /// Care and growing advice
    Cultivation,
    /// Local conditions and native plants
    Locale,
    /// Buying plants
    Marketplace,
}

impl AgentKind {
    /// Every specialist, in canonical order
    pub const ALL: [AgentKind; 4] = [
        Self::Identification,
        Self::Cultivation,
        Self::Locale,
        Self::Marketplace,
    ];

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

    /// Persona name shown to users
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Identification => "The Botanist",
            Self::Cultivation => "The Gardener",
            Self::Locale => "The Ecologist",
            Self::Marketplace => "The Merchant",
        }
    }

    /// Output schema
    #[must_use]
    pub fn schema(&self) -> SchemaId {
        match self {
            Self::Identification => SchemaId::Identification,
            Self::Cultivation => SchemaId::Cultivation,
            Self::Locale => SchemaId::Locale,
            Self::Marketplace => SchemaId::Marketplace,
        }
    }

    /// Parse a label produced by [`AgentKind::as_str`]
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `to` consumes the payload of `from`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolEdge {
    /// Producer
    pub from: &'static str,
    /// Consumer
    pub to: &'static str,
}

const fn edge(from: &'static str, to: &'static str) -> ToolEdge {
    ToolEdge { from, to }
}

const CULTIVATION_EDGES: &[ToolEdge] = &[edge("plant_database_search", "plant_care_scheduler")];

const LOCALE_EDGES: &[ToolEdge] = &[
    edge("location_resolver", "hardiness_zone_lookup"),
    edge("location_resolver", "soil_analyzer"),
    edge("location_resolver", "native_plant_finder"),
    edge("location_resolver", "weather_lookup"),
];

const MARKETPLACE_EDGES: &[ToolEdge] = &[
    edge("marketplace_search", "price_comparator"),
    edge("marketplace_search", "seller_verifier"),
];

/// Static definition of a specialist
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    /// Which specialist
    pub kind: AgentKind,
    /// System persona
    pub persona: &'static str,
    /// Tools the specialist may call, in planning order
    pub tools: &'static [&'static str],
    /// Tool dependency edges
    pub dependencies: &'static [ToolEdge],
}

const BOTANIST: &str = "You are \"The Botanist\", an expert in botany, plant identification and \
    horticultural science. Give scientific names alongside common names, explain the \
    characteristics that identify a plant, and stay accurate but accessible to beginners.";

const GARDENER: &str = "You are \"The Gardener\", a master horticulturist with decades of \
    hands-on growing experience. Give specific, actionable care instructions with timing, \
    consider the user's location and climate, and prefer sustainable practices.";

const ECOLOGIST: &str = "You are \"The Ecologist\", an environmental scientist specialising in \
    local ecosystems, native plants and regional growing conditions. Prioritise native and \
    adapted plants and explain hardiness zones, soil and local challenges.";

const MERCHANT: &str = "You are \"The Merchant\", a plant commerce specialist who connects users \
    with quality plants at fair prices from reputable sellers. Prioritise plant quality over the \
    lowest price, offer several options and mention seller reputation.";

impl AgentSpec {
    /// Definition for a specialist
    #[must_use]
    pub fn for_kind(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Identification => Self {
                kind,
                persona: BOTANIST,
                tools: &["plant_database_search"],
                dependencies: &[],
            },
            AgentKind::Cultivation => Self {
                kind,
                persona: GARDENER,
                tools: &[
                    "plant_database_search",
                    "plant_care_scheduler",
                    "disease_identifier",
                    "weather_lookup",
                ],
                dependencies: CULTIVATION_EDGES,
            },
            AgentKind::Locale => Self {
                kind,
                persona: ECOLOGIST,
                tools: &[
                    "location_resolver",
                    "hardiness_zone_lookup",
                    "soil_analyzer",
                    "native_plant_finder",
                    "weather_lookup",
                ],
                dependencies: LOCALE_EDGES,
            },
            AgentKind::Marketplace => Self {
                kind,
                persona: MERCHANT,
                tools: &["marketplace_search", "price_comparator", "seller_verifier"],
                dependencies: MARKETPLACE_EDGES,
            },
        }
    }

    /// Output schema
    #[must_use]
    pub fn schema(&self) -> SchemaId {
        self.kind.schema()
    }

    /// Producers of `tool` within this specialist
    pub fn predecessors<'a>(&'a self, tool: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.dependencies
            .iter()
            .filter(move |e| e.to == tool)
            .map(|e| e.from)
    }

    /// Split `planned` tools into dependency waves
    ///
    /// A tool joins the first wave after all of its planned producers. Edges
    /// to tools that were not planned are ignored; a cycle (never produced by
    /// the static tables) collapses into one final wave.
    #[must_use]
    pub fn waves(&self, planned: &[&str]) -> Vec<Vec<String>> {
        let mut remaining: Vec<&str> = planned.to_vec();
        let mut placed: Vec<&str> = Vec::new();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&str>, Vec<&str>) = remaining.iter().partition(|tool| {
                self.predecessors(tool)
                    .all(|p| !planned.contains(&p) || placed.contains(&p))
            });
            if ready.is_empty() {
                waves.push(blocked.iter().map(|t| (*t).to_string()).collect());
                break;
            }
            placed.extend(ready.iter().copied());
            waves.push(ready.iter().map(|t| (*t).to_string()).collect());
            remaining = blocked;
        }
        waves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for kind in AgentKind::ALL {
            assert_eq!(AgentKind::from_label(kind.as_str()), Some(kind));
        }
        assert_eq!(AgentKind::from_label("botanist"), None);
        assert_eq!(AgentKind::Marketplace.display_name(), "The Merchant");
    }

    #[test]
    fn test_edges_only_reference_own_tools() {
        for kind in AgentKind::ALL {
            let spec = AgentSpec::for_kind(kind);
            for e in spec.dependencies {
                assert!(spec.tools.contains(&e.from), "{kind}: {}", e.from);
                assert!(spec.tools.contains(&e.to), "{kind}: {}", e.to);
            }
        }
    }

    #[test]
    fn test_locale_waves() {
        let spec = AgentSpec::for_kind(AgentKind::Locale);
        let waves = spec.waves(spec.tools);
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0], vec!["location_resolver"]);
        assert_eq!(waves[1].len(), 4);
    }

    #[test]
    fn test_waves_ignore_unplanned_producers() {
        let spec = AgentSpec::for_kind(AgentKind::Cultivation);
        let waves = spec.waves(&["plant_care_scheduler", "disease_identifier"]);
        assert_eq!(waves, vec![vec!["plant_care_scheduler", "disease_identifier"]]);

        let waves = spec.waves(&["plant_database_search", "plant_care_scheduler", "weather_lookup"]);
        assert_eq!(
            waves,
            vec![
                vec!["plant_database_search".to_string(), "weather_lookup".to_string()],
                vec!["plant_care_scheduler".to_string()],
            ]
        );
    }
}
