//! Registry - Tool registration, resolution and invocation
//!
//! Each registered name maps to a primary capability and, optionally, a mock
//! fallback with the same contract. [`ToolRegistry::invoke`] validates the
//! arguments, runs the primary under a timeout and falls back to the mock when
//! the live source is unavailable. The registry is built once at start and
//! shared read-only behind an `Arc`.

use crate::contract::{CapabilityKind, ToolContract};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Trait for tool implementations
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool contract
    fn contract(&self) -> &ToolContract;

    /// Execute the tool with already-validated arguments
    async fn call(&self, args: Value) -> Result<Value>;
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// When false, live tools are skipped and their mocks serve directly
    #[serde(default = "default_live_enabled")]
    pub live_enabled: bool,
    /// Per-invocation timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_live_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            live_enabled: default_live_enabled(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RegistryConfig {
    /// Mock-only configuration
    #[must_use]
    pub fn offline() -> Self {
        Self {
            live_enabled: false,
            ..Self::default()
        }
    }
}

/// Which path produced a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// The live capability answered
    Live,
    /// The mock answered (directly or after fallback)
    Mock,
}

impl From<CapabilityKind> for ToolSource {
    fn from(kind: CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Live => Self::Live,
            CapabilityKind::Mock => Self::Mock,
        }
    }
}

/// Successful invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Payload returned by the tool
    pub payload: Value,
    /// Path that produced it
    pub source: ToolSource,
    /// Why the live path was skipped, when the mock answered in its place
    pub fallback_reason: Option<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Observability record of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name
    pub tool: String,
    /// Arguments as sent
    pub args: Value,
    /// Path that answered, if any
    pub source: Option<ToolSource>,
    /// Live failure that triggered a fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Failure reason when no path answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ToolInvocation {
    /// Record a served invocation
    #[must_use]
    pub fn served(tool: impl Into<String>, args: Value, outcome: &ToolOutcome) -> Self {
        Self {
            tool: tool.into(),
            args,
            source: Some(outcome.source),
            fallback_reason: outcome.fallback_reason.clone(),
            error: None,
            duration_ms: outcome.duration_ms,
        }
    }

    /// Record a failed invocation
    #[must_use]
    pub fn failed(tool: impl Into<String>, args: Value, error: &Error, duration_ms: u64) -> Self {
        Self {
            tool: tool.into(),
            args,
            source: None,
            fallback_reason: None,
            error: Some(error.to_string()),
            duration_ms,
        }
    }

    /// Whether some path answered
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.source.is_some()
    }
}

struct RegistryEntry {
    primary: Arc<dyn Tool>,
    fallback: Option<Arc<dyn Tool>>,
}

/// Registry for managing tools
pub struct ToolRegistry {
    entries: HashMap<String, RegistryEntry>,
    config: RegistryConfig,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
        }
    }

    /// Registry configuration
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a tool without a fallback
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        self.insert(tool, None)
    }

    /// Register a live tool together with its mock fallback
    pub fn register_with_fallback(&mut self, live: Arc<dyn Tool>, mock: Arc<dyn Tool>) -> Result<()> {
        let (live_contract, mock_contract) = (live.contract(), mock.contract());
        if live_contract.name != mock_contract.name {
            return Err(Error::Registration(format!(
                "fallback '{}' does not match tool '{}'",
                mock_contract.name, live_contract.name
            )));
        }
        if mock_contract.capability != CapabilityKind::Mock {
            return Err(Error::Registration(format!(
                "fallback for '{}' must be a mock capability",
                live_contract.name
            )));
        }
        self.insert(live, Some(mock))
    }

    fn insert(&mut self, primary: Arc<dyn Tool>, fallback: Option<Arc<dyn Tool>>) -> Result<()> {
        let name = primary.contract().name.clone();
        if self.entries.contains_key(&name) {
            return Err(Error::Registration(format!("tool '{}' already registered", name)));
        }
        debug!(tool = %name, fallback = fallback.is_some(), "Registering tool");
        self.entries.insert(name, RegistryEntry { primary, fallback });
        Ok(())
    }

    /// Resolve a contract by exact name
    pub fn resolve(&self, name: &str) -> Result<&ToolContract> {
        self.entries
            .get(name)
            .map(|entry| entry.primary.contract())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether `name` has a mock fallback registered
    #[must_use]
    pub fn has_fallback(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.fallback.is_some())
    }

    /// List all tool names, sorted
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Model-facing definitions for the named tools (unknown names skipped)
    #[must_use]
    pub fn to_llm_tools(&self, names: &[&str]) -> Vec<plantworks_llm::ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.resolve(name).ok())
            .map(ToolContract::to_llm_tool)
            .collect()
    }

    /// Invoke a tool by name
    ///
    /// Validation failures return [`Error::InvalidArgs`] before any capability
    /// runs. A live capability that errors, times out, lacks a credential or
    /// returns a payload missing declared keys is treated as unavailable and
    /// the mock answers instead; without a mock the result is
    /// [`Error::Unavailable`].
    #[instrument(skip(self, args), fields(tool = %name))]
    pub async fn invoke(&self, name: &str, args: Value) -> Result<ToolOutcome> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let contract = entry.primary.contract();
        contract.validate_args(&args)?;

        let start = Instant::now();
        let primary_kind = contract.capability;

        let primary_failure = if primary_kind == CapabilityKind::Live && !self.config.live_enabled {
            "live tools disabled".to_string()
        } else {
            match self.call_bounded(entry.primary.as_ref(), args.clone()).await {
                Ok(payload) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    debug!(source = %primary_kind, duration_ms, "Tool served");
                    return Ok(ToolOutcome {
                        payload,
                        source: primary_kind.into(),
                        fallback_reason: None,
                        duration_ms,
                    });
                }
                Err(e) => e.to_string(),
            }
        };

        let Some(mock) = &entry.fallback else {
            warn!(reason = %primary_failure, "Tool unavailable and no fallback registered");
            return Err(Error::Unavailable {
                tool: name.to_string(),
                reason: primary_failure,
            });
        };

        if self.config.live_enabled {
            warn!(reason = %primary_failure, "Live tool unavailable, falling back to mock");
        }

        match self.call_bounded(mock.as_ref(), args).await {
            Ok(payload) => Ok(ToolOutcome {
                payload,
                source: ToolSource::Mock,
                fallback_reason: Some(primary_failure),
                duration_ms: start.elapsed().as_millis() as u64,
            }),
            Err(e) => {
                warn!(error = %e, "Mock fallback failed");
                Err(Error::Unavailable {
                    tool: name.to_string(),
                    reason: format!("{}; fallback: {}", primary_failure, e),
                })
            }
        }
    }

    async fn call_bounded(&self, tool: &dyn Tool, args: Value) -> Result<Value> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let payload = tokio::time::timeout(timeout, tool.call(args))
            .await
            .map_err(|_| Error::Timeout(self.config.timeout_ms))??;

        let missing = tool.contract().missing_output_keys(&payload);
        if !missing.is_empty() {
            return Err(Error::Execution(format!(
                "payload missing declared keys: {}",
                missing.join(", ")
            )));
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ParamKind, ParamRule, ParamSpec};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Echo,
        Fail,
        Hang,
        Incomplete,
    }

    struct TestTool {
        contract: ToolContract,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl TestTool {
        fn new(kind: CapabilityKind, behaviour: Behaviour) -> (Arc<dyn Tool>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let contract = ToolContract::new("probe", "test probe", kind)
                .with_param(
                    ParamSpec::required("query", ParamKind::String, "query")
                        .with_rule(ParamRule::NonEmpty),
                )
                .with_output_keys(&["echo"]);
            let tool = Arc::new(Self {
                contract,
                behaviour,
                calls: calls.clone(),
            });
            (tool, calls)
        }
    }

    #[async_trait::async_trait]
    impl Tool for TestTool {
        fn contract(&self) -> &ToolContract {
            &self.contract
        }

        async fn call(&self, args: Value) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Echo => Ok(json!({"echo": args["query"], "kind": self.contract.capability})),
                Behaviour::Fail => Err(Error::Network("connection refused".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(json!({"echo": "late"}))
                }
                Behaviour::Incomplete => Ok(json!({"other": 1})),
            }
        }
    }

    fn fast_config() -> RegistryConfig {
        RegistryConfig {
            live_enabled: true,
            timeout_ms: 50,
        }
    }

    #[test]
    fn test_resolve_is_exact() {
        let mut registry = ToolRegistry::default();
        let (tool, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register(tool).unwrap();

        assert_eq!(registry.resolve("probe").unwrap().name, "probe");
        assert!(matches!(registry.resolve("Probe"), Err(Error::NotFound(_))));
        assert_eq!(registry.list_names(), vec!["probe"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_and_mismatched_registration() {
        let mut registry = ToolRegistry::default();
        let (a, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        let (b, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register(a).unwrap();
        assert!(matches!(registry.register(b), Err(Error::Registration(_))));

        let mut registry = ToolRegistry::default();
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Echo);
        let (not_mock, _) = TestTool::new(CapabilityKind::Live, Behaviour::Echo);
        assert!(registry.register_with_fallback(live, not_mock).is_err());
    }

    #[tokio::test]
    async fn test_invalid_args_never_reach_capability() {
        let mut registry = ToolRegistry::new(fast_config());
        let (tool, calls) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register(tool).unwrap();

        let err = registry.invoke("probe", json!({"query": ""})).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_success() {
        let mut registry = ToolRegistry::new(fast_config());
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Echo);
        let (mock, mock_calls) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register_with_fallback(live, mock).unwrap();

        let outcome = registry.invoke("probe", json!({"query": "rose"})).await.unwrap();
        assert_eq!(outcome.source, ToolSource::Live);
        assert!(outcome.fallback_reason.is_none());
        assert_eq!(mock_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_failure_falls_back() {
        let mut registry = ToolRegistry::new(fast_config());
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Fail);
        let (mock, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register_with_fallback(live, mock).unwrap();

        let outcome = registry.invoke("probe", json!({"query": "rose"})).await.unwrap();
        assert_eq!(outcome.source, ToolSource::Mock);
        assert!(outcome.fallback_reason.unwrap().contains("connection refused"));
        assert_eq!(outcome.payload["echo"], "rose");
    }

    #[tokio::test]
    async fn test_timeout_is_unavailability() {
        let mut registry = ToolRegistry::new(fast_config());
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Hang);
        let (mock, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register_with_fallback(live, mock).unwrap();

        let outcome = registry.invoke("probe", json!({"query": "rose"})).await.unwrap();
        assert_eq!(outcome.source, ToolSource::Mock);
        assert!(outcome.fallback_reason.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_incomplete_payload_is_unavailability() {
        let mut registry = ToolRegistry::new(fast_config());
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Incomplete);
        let (mock, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register_with_fallback(live, mock).unwrap();

        let outcome = registry.invoke("probe", json!({"query": "rose"})).await.unwrap();
        assert_eq!(outcome.source, ToolSource::Mock);
        assert!(outcome.fallback_reason.unwrap().contains("echo"));
    }

    #[tokio::test]
    async fn test_live_disabled_skips_live() {
        let mut registry = ToolRegistry::new(RegistryConfig::offline());
        let (live, live_calls) = TestTool::new(CapabilityKind::Live, Behaviour::Echo);
        let (mock, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Echo);
        registry.register_with_fallback(live, mock).unwrap();

        let outcome = registry.invoke("probe", json!({"query": "rose"})).await.unwrap();
        assert_eq!(outcome.source, ToolSource::Mock);
        assert_eq!(live_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_without_fallback() {
        let mut registry = ToolRegistry::new(fast_config());
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Fail);
        registry.register(live).unwrap();

        let err = registry.invoke("probe", json!({"query": "rose"})).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable { ref tool, .. } if tool == "probe"));
    }

    #[tokio::test]
    async fn test_both_paths_failing() {
        let mut registry = ToolRegistry::new(fast_config());
        let (live, _) = TestTool::new(CapabilityKind::Live, Behaviour::Fail);
        let (mock, _) = TestTool::new(CapabilityKind::Mock, Behaviour::Fail);
        registry.register_with_fallback(live, mock).unwrap();

        let err = registry.invoke("probe", json!({"query": "rose"})).await.unwrap_err();
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn test_invocation_records() {
        let outcome = ToolOutcome {
            payload: json!({"echo": 1}),
            source: ToolSource::Mock,
            fallback_reason: Some("live tools disabled".to_string()),
            duration_ms: 3,
        };
        let served = ToolInvocation::served("probe", json!({}), &outcome);
        assert!(served.succeeded());
        assert_eq!(served.fallback_reason.as_deref(), Some("live tools disabled"));

        let failed = ToolInvocation::failed("probe", json!({}), &Error::Timeout(50), 50);
        assert!(!failed.succeeded());
        assert_eq!(failed.error.as_deref(), Some("timeout after 50ms"));
    }
}
