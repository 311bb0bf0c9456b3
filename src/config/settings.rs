use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MAX_OPERATIONS: u64 = 1_000_000;

/// Settings that can be customized via `config.rhai`
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    // Scratch evaluator
    pub debounce_ms: u64,

    // Script execution
    pub max_operations: u64,
    pub show_progress: bool,

    // Exposed to scripts as `this.env`
    pub env: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_operations: DEFAULT_MAX_OPERATIONS,
            show_progress: true,
            env: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
