//! Plantworks Tools - Tool Registry and Plant Tools
//!
//! This crate provides the tool system for Plantworks:
//! - Contract: typed input/output agreements and argument validation
//! - Registry: name-keyed registration, live→mock fallback, timeouts
//! - Builtins: the plant tools (search, weather, locale, care, marketplace)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod contract;
pub mod error;
pub mod registry;

pub use builtins::{register_plant_tools, retrieve_plants, PlantPassage, ToolCredentials};
pub use contract::{CapabilityKind, ParamKind, ParamRule, ParamSpec, ToolContract};
pub use error::{Error, Result};
pub use registry::{
    RegistryConfig, Tool, ToolInvocation, ToolOutcome, ToolRegistry, ToolSource,
};
