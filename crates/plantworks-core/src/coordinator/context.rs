//! Cross-turn context resolution
//!
//! Pulls a location and a plant out of the query and falls back to what the
//! previous turn left in scratch state.

use crate::memory::{SessionView, SCRATCH_LAST_LOCATION, SCRATCH_LAST_PLANT};
use plantworks_tools::builtins::mentioned_plant;
use regex::Regex;
use std::sync::LazyLock;

const PLACE: &str = r"[A-Z][\w'-]*(?:\s+[A-Z][\w'-]*)*";

/// "the Kenton area", "the Kenton area of Harrow"
static AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:[Tt]he\s+)?({PLACE})\s+area(?:\s+of\s+({PLACE}))?"))
        .expect("AREA is a compile-time constant")
});

/// "in Harrow", "near Leeds, West Yorkshire"
static PREPOSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:[Ii]n|[Nn]ear|[Aa]round|[Aa]t|[Ff]rom)\s+(?:the\s+)?({PLACE}(?:,\s*{PLACE})*)"
    ))
    .expect("PREPOSITION is a compile-time constant")
});

static FOLLOW_UP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(specifically|what about|how about|and\b|also\b|there\b|it\b|that\b|same\b)|\b(it|there|that one|this one|them)\b",
    )
    .expect("FOLLOW_UP is a compile-time constant")
});

/// Capitalised words that follow prepositions without naming a place
const NOT_PLACES: &[&str] = &[
    "I", "My", "A", "An", "Spring", "Summer", "Autumn", "Fall", "Winter", "January", "February",
    "March", "April", "May", "June", "July", "August", "September", "October", "November",
    "December",
];

/// A place named in the query
#[derive(Debug, Clone, PartialEq)]
pub(super) struct LocationMention {
    /// Place as written
    pub place: String,
    /// Enclosing place, when the query gives one ("X area of Y")
    pub parent: Option<String>,
    /// Named as an area, so it may need qualifying
    pub sub_area: bool,
}

fn is_place(candidate: &str) -> bool {
    candidate
        .split_whitespace()
        .next()
        .is_some_and(|first| !NOT_PLACES.contains(&first))
}

/// Find a location mention in `text`
pub(super) fn extract_location(text: &str) -> Option<LocationMention> {
    if let Some(caps) = AREA.captures(text) {
        let place = caps.get(1).map(|m| m.as_str().to_string())?;
        if is_place(&place) {
            return Some(LocationMention {
                place,
                parent: caps.get(2).map(|m| m.as_str().to_string()),
                sub_area: true,
            });
        }
    }

    PREPOSITION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(',').to_string())
        .find(|place| is_place(place))
        .map(|place| LocationMention {
            place,
            parent: None,
            sub_area: false,
        })
}

/// Location for this turn
///
/// A sub-area is qualified with its parent, or with the last component of
/// the previous location ("Kenton" after "Harrow" becomes "Kenton, Harrow").
/// No mention carries the previous location forward.
pub(super) fn resolve_location(mention: Option<LocationMention>, previous: Option<&str>) -> Option<String> {
    let Some(mention) = mention else {
        return previous.map(str::to_string);
    };

    if let Some(parent) = mention.parent {
        return Some(format!("{}, {}", mention.place, parent));
    }

    match previous {
        Some(previous) if mention.sub_area => {
            if previous.to_lowercase().contains(&mention.place.to_lowercase()) {
                return Some(previous.to_string());
            }
            let parent = previous.rsplit(',').next().unwrap_or(previous).trim();
            Some(format!("{}, {}", mention.place, parent))
        }
        _ => Some(mention.place),
    }
}

/// Plant for this turn: named in the query, else the previous turn's plant
pub(super) fn resolve_plant(text: &str, view: &SessionView) -> Option<String> {
    mentioned_plant(text)
        .map(str::to_string)
        .or_else(|| view.scratch_str(SCRATCH_LAST_PLANT).map(str::to_string))
}

/// Location for this turn given the session's scratch state
pub(super) fn location_for(text: &str, view: &SessionView) -> Option<String> {
    resolve_location(extract_location(text), view.scratch_str(SCRATCH_LAST_LOCATION))
}

/// Whether the query leans on the previous turn
pub(super) fn is_follow_up(text: &str, view: &SessionView) -> bool {
    !view.recent_turns.is_empty() && FOLLOW_UP.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{SessionKey, Turn};
    use serde_json::json;

    fn view_with(scratch: &[(&str, &str)]) -> SessionView {
        let mut view = SessionView::empty(SessionKey::new("a", "u", "s"));
        view.recent_turns.push(Turn::user("earlier", vec![]));
        for (k, v) in scratch {
            view.scratch.insert((*k).to_string(), json!(v));
        }
        view
    }

    #[test]
    fn test_extract_after_preposition() {
        let mention = extract_location("how can I grow a red rose in Harrow").unwrap();
        assert_eq!(mention.place, "Harrow");
        assert!(!mention.sub_area);

        let mention = extract_location("native plants near Leeds, West Yorkshire?").unwrap();
        assert_eq!(mention.place, "Leeds, West Yorkshire");

        assert!(extract_location("What is Monstera deliciosa?").is_none());
        assert!(extract_location("what to plant in May").is_none());
    }

    #[test]
    fn test_extract_area() {
        let mention = extract_location("specifically in the Kenton area").unwrap();
        assert_eq!(mention.place, "Kenton");
        assert!(mention.sub_area);
        assert_eq!(mention.parent, None);

        let mention = extract_location("soil in the Kenton area of Harrow").unwrap();
        assert_eq!(mention.parent.as_deref(), Some("Harrow"));
    }

    #[test]
    fn test_sub_area_qualified_by_previous() {
        let view = view_with(&[(SCRATCH_LAST_LOCATION, "Harrow")]);
        assert_eq!(
            location_for("specifically in the Kenton area", &view).as_deref(),
            Some("Kenton, Harrow")
        );

        let view = view_with(&[(SCRATCH_LAST_LOCATION, "Kenton, Harrow")]);
        assert_eq!(
            location_for("what about the Stanmore area", &view).as_deref(),
            Some("Stanmore, Harrow")
        );
        assert_eq!(
            location_for("and the Kenton area?", &view).as_deref(),
            Some("Kenton, Harrow")
        );
    }

    #[test]
    fn test_location_carried_or_replaced() {
        let view = view_with(&[(SCRATCH_LAST_LOCATION, "Harrow")]);
        assert_eq!(location_for("what should I water it with", &view).as_deref(), Some("Harrow"));
        assert_eq!(location_for("what about in Leeds", &view).as_deref(), Some("Leeds"));
        assert_eq!(location_for("the Kenton area", &view_with(&[])).as_deref(), Some("Kenton"));
    }

    #[test]
    fn test_plant_fallback() {
        let view = view_with(&[(SCRATCH_LAST_PLANT, "red rose")]);
        assert_eq!(resolve_plant("where can I buy it", &view).as_deref(), Some("red rose"));
        assert_eq!(resolve_plant("how about basil", &view).as_deref(), Some("basil"));
    }

    #[test]
    fn test_follow_up() {
        let view = view_with(&[]);
        assert!(is_follow_up("specifically in the Kenton area", &view));
        assert!(is_follow_up("where can I buy it", &view));
        assert!(!is_follow_up("What is Monstera deliciosa?", &view));

        let fresh = SessionView::empty(SessionKey::new("a", "u", "s"));
        assert!(!is_follow_up("specifically in the Kenton area", &fresh));
    }
}
