//! API modules exposed to scripts
//!
//! Host functions live under the `scriptbox` namespace
//! (`scriptbox::<module>::*`); the collection helpers are a top-level
//! `util` module shared with the scratch evaluator.

pub mod console;
pub mod task;
pub mod util;
