//! Configuration model for cardsend.
//!
//! This module defines the Config struct that represents `cardsend.yaml`:
//! the registry table mapping agent keys to module names, plus where
//! extension modules and the dispatch log live. Unknown fields are kept
//! for forward compatibility, and a missing file falls back to the
//! built-in table.

mod model;
mod operations;


// Re-export public API
pub use model::{AgentEntry, Config, Defaults};
