//! Memory - Session and context management
//!
//! This module provides per-(application, user, session) state:
//! - Session history (ordered turns) and scratch key/value state
//! - Read-only views handed to the specialists
//! - The `SessionStore` trait and an in-memory implementation

mod session;
mod store;

pub use session::{Part, Session, SessionKey, SessionView, Turn, TurnCommit};
pub use store::{MemoryStore, SessionStore};

/// Scratch key: location resolved on the last turn
pub const SCRATCH_LAST_LOCATION: &str = "last_location";
/// Scratch key: plant discussed on the last turn
pub const SCRATCH_LAST_PLANT: &str = "last_plant";
/// Scratch key: agents dispatched on the last turn
pub const SCRATCH_LAST_AGENTS: &str = "last_agents";
/// Scratch key: hardiness zone reported on the last turn
pub const SCRATCH_LAST_HARDINESS_ZONE: &str = "last_hardiness_zone";
