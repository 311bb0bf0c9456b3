use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use rhai::{Engine, Scope};
use tracing::{debug, info};

use super::Settings;
use crate::error::{Result, ScriptError};

/// Reserved name of the startup configuration file in the script directory
pub const CONFIG_FILENAME: &str = "config.rhai";

/// The Rhai scripting engine for configuration
pub struct ConfigEngine {
    engine: Engine,
    settings: Arc<RwLock<Settings>>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        let settings = Arc::new(RwLock::new(Settings::default()));
        let engine = Self::create_engine(Arc::clone(&settings));

        Self { engine, settings }
    }

    fn create_engine(settings: Arc<RwLock<Settings>>) -> Engine {
        let mut engine = Engine::new();

        // Limit script execution for safety
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(100_000);

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_debounce_ms", move |ms: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.debounce_ms = ms.clamp(10, 10_000) as u64;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_max_operations", move |ops: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.max_operations = ops.clamp(1_000, 100_000_000) as u64;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_show_progress", move |enabled: bool| {
                if let Ok(mut settings) = s.write() {
                    settings.show_progress = enabled;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_env", move |key: &str, value: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.env.insert(key.to_string(), value.to_string());
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("get_env", move |key: &str| -> String {
                s.read()
                    .ok()
                    .and_then(|s| s.env.get(key).cloned())
                    .unwrap_or_default()
            });
        }

        engine.on_print(|msg| info!(target: "scriptbox::config", "{msg}"));

        engine
    }

    /// Load and execute a config file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        self.eval(&content)
    }

    /// Evaluate a config script string
    pub fn eval(&mut self, script: &str) -> Result<()> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|e| ScriptError::Config(format!("parse error: {}", e)))?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ScriptError::Config(e.to_string()))?;

        Ok(())
    }

    /// Get the current settings (cloned)
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config_file(script_dir: &Path) -> PathBuf {
        script_dir.join(CONFIG_FILENAME)
    }

    /// Load the config file of a script directory if it exists
    pub fn load_from_dir(&mut self, script_dir: &Path) -> Result<()> {
        let config_file = Self::config_file(script_dir);
        if config_file.exists() {
            debug!(path = %config_file.display(), "Loading config");
            return self.load_file(&config_file);
        }
        Ok(()) // No config file is fine
    }
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}
