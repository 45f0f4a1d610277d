//! Tool execution in dependency waves

use super::planning::{bind_args, PlannedCall};
use super::{AgentSpec, Diagnostic, DiagnosticKind};
use futures::future::join_all;
use plantworks_tools::{ToolInvocation, ToolRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Everything gathered while running a plan
#[derive(Debug, Default)]
pub(super) struct ToolRun {
    /// Payloads keyed by tool name
    pub payloads: HashMap<String, Value>,
    /// One record per call made, in completion order per wave
    pub invocations: Vec<ToolInvocation>,
    pub diagnostics: Vec<Diagnostic>,
    /// Calls actually made (skipped calls excluded)
    pub attempted: usize,
    pub failed: usize,
}

impl ToolRun {
    /// Every attempted call failed
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }

    /// Fraction of attempted calls that were served
    pub fn success_ratio(&self) -> f64 {
        if self.attempted == 0 {
            1.0
        } else {
            (self.attempted - self.failed) as f64 / self.attempted as f64
        }
    }
}

/// Run `calls` wave by wave; calls inside a wave run concurrently
pub(super) async fn execute(spec: &AgentSpec, registry: &ToolRegistry, calls: Vec<PlannedCall>) -> ToolRun {
    let names: Vec<&str> = calls.iter().map(|c| c.tool).collect();
    let waves = spec.waves(&names);
    let by_name: HashMap<&str, &PlannedCall> = calls.iter().map(|c| (c.tool, c)).collect();
    let report_fallbacks = registry.config().live_enabled;

    let mut run = ToolRun::default();

    for (index, wave) in waves.iter().enumerate() {
        let mut ready = Vec::with_capacity(wave.len());
        for tool in wave {
            let Some(call) = by_name.get(tool.as_str()) else {
                continue;
            };
            match bind_args(call.tool, &call.args, &run.payloads) {
                Some(args) => ready.push((call.tool, args)),
                None => {
                    debug!(agent = %spec.kind, tool = %call.tool, "Skipping call without bound input");
                    run.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ToolSkipped,
                        call.tool,
                        "required input from an earlier tool was unavailable",
                    ));
                }
            }
        }

        debug!(agent = %spec.kind, wave = index, calls = ready.len(), "Running tool wave");

        let results = join_all(ready.into_iter().map(|(tool, args)| async move {
            let start = Instant::now();
            let result = registry.invoke(tool, args.clone()).await;
            (tool, args, result, start.elapsed().as_millis() as u64)
        }))
        .await;

        for (tool, args, result, elapsed_ms) in results {
            run.attempted += 1;
            match result {
                Ok(outcome) => {
                    if report_fallbacks {
                        if let Some(reason) = &outcome.fallback_reason {
                            run.diagnostics.push(Diagnostic::new(
                                DiagnosticKind::ToolFallback,
                                tool,
                                reason.clone(),
                            ));
                        }
                    }
                    run.invocations.push(ToolInvocation::served(tool, args, &outcome));
                    run.payloads.insert(tool.to_string(), outcome.payload);
                }
                Err(e) => {
                    warn!(agent = %spec.kind, tool = %tool, error = %e, "Tool call failed");
                    run.failed += 1;
                    run.diagnostics
                        .push(Diagnostic::new(DiagnosticKind::ToolFailure, tool, e.to_string()));
                    run.invocations
                        .push(ToolInvocation::failed(tool, args, &e, elapsed_ms));
                }
            }
        }
    }

    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentKind;
    use plantworks_tools::{register_plant_tools, RegistryConfig, ToolCredentials};
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new(RegistryConfig::offline());
        register_plant_tools(&mut registry, &ToolCredentials::default()).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_locale_binds_resolved_location() {
        let spec = AgentSpec::for_kind(AgentKind::Locale);
        let calls = vec![
            PlannedCall {
                tool: "location_resolver",
                args: json!({"query": "Harrow"}),
            },
            PlannedCall {
                tool: "hardiness_zone_lookup",
                args: json!({"location": "Harrow"}),
            },
        ];
        let run = execute(&spec, &registry(), calls).await;

        assert_eq!(run.attempted, 2);
        assert_eq!(run.failed, 0);
        // Offline mocks are not reported as fallbacks
        assert!(run.diagnostics.is_empty());
        let zone_args = &run.invocations[1].args;
        assert!(zone_args.get("latitude").is_some());
        assert!(run.payloads.contains_key("hardiness_zone_lookup"));
    }

    #[tokio::test]
    async fn test_failures_and_skips_are_recorded() {
        let spec = AgentSpec::for_kind(AgentKind::Marketplace);
        let calls = vec![
            PlannedCall {
                tool: "marketplace_search",
                args: json!({"plant_name": "triffid"}),
            },
            PlannedCall {
                tool: "price_comparator",
                args: json!({"plant_name": "triffid"}),
            },
            PlannedCall {
                tool: "seller_verifier",
                args: json!({}),
            },
        ];
        let run = execute(&spec, &registry(), calls).await;

        // The search succeeds with no products; both dependents are skipped
        assert_eq!(run.attempted, 1);
        assert_eq!(run.failed, 0);
        let skipped = run
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::ToolSkipped)
            .count();
        assert_eq!(skipped, 2);
        assert!(!run.all_failed());
    }

    #[tokio::test]
    async fn test_invalid_args_count_as_failure() {
        let spec = AgentSpec::for_kind(AgentKind::Identification);
        let calls = vec![PlannedCall {
            tool: "plant_database_search",
            args: json!({"query": ""}),
        }];
        let run = execute(&spec, &registry(), calls).await;
        assert!(run.all_failed());
        assert_eq!(run.success_ratio(), 0.0);
        assert!(run.invocations[0].error.is_some());
    }
}
