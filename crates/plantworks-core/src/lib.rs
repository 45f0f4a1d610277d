//! Plantworks Core - Orchestration Engine
//!
//! This crate provides the multi-agent engine behind Plantworks:
//! - Schema: the four structured result schemas
//! - Validator: extraction, coercion and one-shot repair of model output
//! - Memory: per-(app, user, session) history and scratch state
//! - Agents: the four specialists over one plan/execute/synthesize cycle
//! - Coordinator: intent routing, staged dispatch, merging and persistence

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod coordinator;
pub mod error;
pub mod memory;
pub mod schema;
pub mod validator;

pub use agents::{
    AgentKind, AgentRequest, AgentSpec, AgentState, Diagnostic, DiagnosticKind, SpecialistAgent,
    StructuredResult,
};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorError, LabelScore, MergeStrategy, NewMessage,
    RoutingDecision, TurnResponse,
};
pub use error::{Error, Result};
pub use memory::{MemoryStore, Part, Session, SessionKey, SessionStore, SessionView, Turn, TurnCommit};
pub use schema::{
    CareRecommendation, Listing, LocalRecommendation, MarketplaceListings, PlantIdentification,
    SchemaId, StructuredPayload,
};
pub use validator::{ValidatedOutput, ValidationError, Validator};
