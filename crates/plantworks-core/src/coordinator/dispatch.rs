//! Dispatch ordering between specialists

use super::types::MergeStrategy;
use crate::agents::AgentKind;

/// `(upstream, downstream)`: the downstream agent consumes the upstream
/// agent's resolved plant name
pub(super) const AGENT_DEPENDENCIES: &[(AgentKind, AgentKind)] = &[
    (AgentKind::Identification, AgentKind::Marketplace),
    (AgentKind::Identification, AgentKind::Cultivation),
];

fn upstream_of(agent: AgentKind) -> impl Iterator<Item = AgentKind> {
    AGENT_DEPENDENCIES
        .iter()
        .filter(move |(_, down)| *down == agent)
        .map(|(up, _)| *up)
}

/// Group selected agents into stages; each stage runs after the previous one
pub(super) fn stages(selected: &[AgentKind]) -> Vec<Vec<AgentKind>> {
    let mut remaining = selected.to_vec();
    let mut placed: Vec<AgentKind> = Vec::new();
    let mut stages = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<AgentKind>, Vec<AgentKind>) = remaining.iter().partition(|agent| {
            upstream_of(**agent).all(|up| !selected.contains(&up) || placed.contains(&up))
        });
        if ready.is_empty() {
            stages.push(blocked);
            break;
        }
        placed.extend(&ready);
        stages.push(ready);
        remaining = blocked;
    }
    stages
}

/// Merge strategy for a selection
pub(super) fn strategy(selected: &[AgentKind]) -> MergeStrategy {
    if selected.len() <= 1 {
        return MergeStrategy::Single;
    }
    let dependent = AGENT_DEPENDENCIES
        .iter()
        .any(|(up, down)| selected.contains(up) && selected.contains(down));
    if dependent {
        MergeStrategy::Sequential
    } else {
        MergeStrategy::ParallelMerge
    }
}
