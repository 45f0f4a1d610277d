//! Intent classification
//!
//! Each label owns a table of weighted cue patterns. A label's score is the
//! sum of the weights of its matching cues, capped at 1.0; every label at or
//! above the routing threshold is selected.

use super::types::LabelScore;
use crate::agents::AgentKind;
use regex::Regex;
use std::sync::LazyLock;

/// Score added to labels dispatched on the previous turn for a follow-up
const FOLLOW_UP_WEIGHT: f64 = 0.5;

/// Score added to Locale when the query names a place
const LOCATION_WEIGHT: f64 = 0.3;

struct Cue {
    pattern: Regex,
    weight: f64,
}

fn cues(table: &[(&str, f64)]) -> Vec<Cue> {
    table
        .iter()
        .map(|(pattern, weight)| Cue {
            pattern: Regex::new(&format!(r"(?i){}", pattern))
                .expect("cue patterns are compile-time constants"),
            weight: *weight,
        })
        .collect()
}

static IDENTIFICATION: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    cues(&[
        (r"\bidentify\b|\bidentification\b", 0.8),
        (r"\bwhat\s+(is|are)\b", 0.6),
        (r"\btell\s+me\s+about\b", 0.6),
        (r"\bwhat\s+(plant|kind|type|species)\b", 0.7),
        (r"\bscientific\s+name\b|\bspecies\b|\bgenus\b", 0.5),
        (r"\bwhich\s+plant\b", 0.6),
        (r"\blearn\b|\binformation\b", 0.4),
    ])
});

static CULTIVATION: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    cues(&[
        (r"\bgrow(ing|n)?\b", 0.6),
        (r"\bcare\b|\blook\s+after\b", 0.7),
        (r"\bwater(ing)?\b", 0.6),
        (r"\bprun(e|ing)\b", 0.6),
        (r"\bfertili[sz](e|er|ing)\b|\bfeed(ing)?\b", 0.6),
        (r"\brepot(ting)?\b|\bpropagat(e|ion|ing)\b", 0.6),
        (r"\byellow(ing)?\b|\bwilt(ing)?\b|\bspots?\b|\bpests?\b|\bdisease\b|\bdying\b", 0.7),
        (r"\blight\b|\bsunlight\b", 0.3),
        (r"\bhow\s+(do|can|should)\s+I\b", 0.2),
    ])
});

static LOCALE: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    cues(&[
        (r"\bnative\b", 0.7),
        (r"\bhardiness\b", 0.8),
        (r"\bzone\b", 0.5),
        (r"\bsoil\b", 0.5),
        (r"\bclimate\b|\blocal(ly)?\b|\bweather\b", 0.5),
        (r"\barea\b|\bregion\b|\bneighbou?rhood\b", 0.3),
    ])
});

static MARKETPLACE: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    cues(&[
        (r"\bbuy(ing)?\b|\bpurchase\b", 0.8),
        (r"\bprices?\b|\bcosts?\b|\bcheap(est)?\b", 0.7),
        (r"\bsellers?\b|\bshops?\b|\bstores?\b|\bnurser(y|ies)\b", 0.6),
        (r"\bwhere\s+(can|do|could)\s+I\s+(get|find)\b", 0.6),
        (r"\border\b|\bdeliver(y|ed)?\b", 0.5),
    ])
});

fn table(kind: AgentKind) -> &'static [Cue] {
    match kind {
        AgentKind::Identification => IDENTIFICATION.as_slice(),
        AgentKind::Cultivation => CULTIVATION.as_slice(),
        AgentKind::Locale => LOCALE.as_slice(),
        AgentKind::Marketplace => MARKETPLACE.as_slice(),
    }
}

/// Signals beyond the query text
#[derive(Debug, Clone, Default)]
pub(super) struct ClassifyContext {
    /// The query names a place
    pub has_location: bool,
    /// The query leans on the previous turn
    pub follow_up: bool,
    /// Labels dispatched on the previous turn
    pub previous: Vec<AgentKind>,
}

/// Score every label, in canonical order
pub(super) fn score(text: &str, context: &ClassifyContext) -> Vec<LabelScore> {
    AgentKind::ALL
        .into_iter()
        .map(|agent| {
            let mut score: f64 = table(agent)
                .iter()
                .filter(|cue| cue.pattern.is_match(text))
                .map(|cue| cue.weight)
                .sum();
            if agent == AgentKind::Locale && context.has_location {
                score += LOCATION_WEIGHT;
            }
            if context.follow_up && context.previous.contains(&agent) {
                score += FOLLOW_UP_WEIGHT;
            }
            LabelScore {
                agent,
                score: score.min(1.0),
            }
        })
        .collect()
}

/// Labels at or above `threshold`, or Identification when none qualify
///
/// Returns the selection and whether the default was used.
pub(super) fn select(scores: &[LabelScore], threshold: f64) -> (Vec<AgentKind>, bool) {
    let selected: Vec<AgentKind> = scores
        .iter()
        .filter(|s| s.score >= threshold)
        .map(|s| s.agent)
        .collect();
    if selected.is_empty() {
        (vec![AgentKind::Identification], true)
    } else {
        (selected, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(text: &str, context: &ClassifyContext) -> Vec<AgentKind> {
        select(&score(text, context), 0.5).0
    }

    #[test]
    fn test_identification_only() {
        let context = ClassifyContext::default();
        assert_eq!(
            labels("What is Monstera deliciosa?", &context),
            vec![AgentKind::Identification]
        );
    }

    #[test]
    fn test_multi_label() {
        let context = ClassifyContext::default();
        assert_eq!(
            labels("identify this and where to buy it", &context),
            vec![AgentKind::Identification, AgentKind::Marketplace]
        );
    }

    #[test]
    fn test_location_boosts_locale() {
        let context = ClassifyContext {
            has_location: true,
            ..Default::default()
        };
        assert_eq!(
            labels("how can I grow a red rose in Harrow", &context),
            vec![AgentKind::Cultivation]
        );
        assert_eq!(
            labels("how is the soil in Harrow", &context),
            vec![AgentKind::Locale]
        );
    }

    #[test]
    fn test_follow_up_carries_previous_agents() {
        let context = ClassifyContext {
            has_location: true,
            follow_up: true,
            previous: vec![AgentKind::Cultivation],
        };
        let scores = score("specifically in the Kenton area", &context);
        let selected = select(&scores, 0.5).0;
        assert_eq!(selected, vec![AgentKind::Cultivation, AgentKind::Locale]);
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let (selected, defaulted) = select(&score("hello there", &ClassifyContext::default()), 0.5);
        assert_eq!(selected, vec![AgentKind::Identification]);
        assert!(defaulted);
    }

    #[test]
    fn test_scores_are_capped() {
        let scores = score(
            "buy cheap plants from a nursery that will deliver, where can I get prices",
            &ClassifyContext::default(),
        );
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(&s.score)));
        assert_eq!(scores[3].score, 1.0);
    }
}
