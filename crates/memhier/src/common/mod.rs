//! Common types shared by every part of the cache model.
//!
//! This module provides the building blocks the rest of the crate is written against:
//! 1. **Addresses and time:** The `Addr` and `Cycle` aliases and line-alignment helpers.
//! 2. **Events:** Coherence commands and the memory events that carry them between links.
//! 3. **Error Handling:** Configuration and runtime (deadlock) errors.
//! 4. **Logging:** The explicit logging context handed to each component.

/// Address and cycle type definitions.
pub mod addr;

/// Error types for configuration and simulation failures.
pub mod error;

/// Coherence commands and memory events.
pub mod event;

/// Per-controller logging context.
pub mod log;

pub use addr::{Addr, Cycle, line_base};
pub use error::{ConfigError, SimError};
pub use event::{Command, CommandClass, EventId, MemEvent, Side};
pub use log::LogContext;
