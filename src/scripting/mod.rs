//! Scripting module - Rhai runtime for user scripts and the scratch buffer
//!
//! Scripts get these namespaces:
//! - `scriptbox::console::*` - log/info/warn/error into the output channel
//! - `scriptbox::task::*` - deferred results (after, defer, delay, reject)
//! - `util::*` - collection helpers, also available in the scratch buffer

mod api;
mod context;
mod deferred;
mod directory;
mod engine;
mod reconcile;
mod runner;
mod scratch;

pub use directory::ScriptDirectory;
pub use engine::ScriptEngine;
pub use reconcile::Applied;
pub use runner::{RunOutcome, ScriptRunner};
pub use scratch::{ScratchEvaluator, evaluate};
