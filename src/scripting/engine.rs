//! The Rhai engine scripts run in, and the loader that resolves a script
//! file to a callable module.
//!
//! Scripts see:
//! - `scriptbox::console::*` - diagnostics into the output channel
//! - `scriptbox::task::*` - deferred results
//! - `util::*` - collection helpers
//! - `this` - `#{ script, document, env }` for the running invocation

use std::path::Path;
use std::sync::Arc;

use rhai::module_resolvers::FileModuleResolver;
use rhai::{AST, CallFnOptions, Dynamic, Engine, FnAccess, Map, Scope};
use tracing::debug;

use super::api;
use super::context::CapturedContext;
use super::deferred::Deferred;
use super::directory::SCRIPT_EXTENSION;
use crate::config::Settings;
use crate::error::{Result, ScriptError};
use crate::host::{Level, OutputChannel};

/// Preferred entry point when a script defines several one-argument functions
const ENTRY_POINT: &str = "transform";
const ANONYMOUS_FN_PREFIX: &str = "anon$";

/// A script compiled from the file's current contents.
/// Owned by the single invocation that loaded it.
#[derive(Debug)]
pub struct ScriptModule {
    pub name: String,
    ast: Arc<AST>,
    entry: String,
}

impl ScriptModule {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn ast(&self) -> Arc<AST> {
        Arc::clone(&self.ast)
    }
}

/// The scripting engine used for user scripts
pub struct ScriptEngine {
    engine: Arc<Engine>,
    env: Map,
}

impl ScriptEngine {
    pub fn new(script_dir: &Path, settings: &Settings, output: OutputChannel) -> Self {
        let engine = Self::create_engine(script_dir, settings, output);
        let env = settings
            .env
            .iter()
            .map(|(key, value)| (key.as_str().into(), Dynamic::from(value.clone())))
            .collect();

        Self {
            engine: Arc::new(engine),
            env,
        }
    }

    fn create_engine(script_dir: &Path, settings: &Settings, output: OutputChannel) -> Engine {
        let mut engine = Engine::new();

        // Safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(settings.max_operations);
        engine.set_max_array_size(api::util::MAX_ARRAY_SIZE);

        // `import` resolves against the script directory, never from a cache
        let mut resolver =
            FileModuleResolver::new_with_path_and_extension(script_dir, SCRIPT_EXTENSION);
        resolver.enable_cache(false);
        engine.set_module_resolver(resolver);

        engine.register_type_with_name::<Deferred>("Deferred");

        let mut scriptbox_module = rhai::Module::new();
        scriptbox_module.set_sub_module("console", api::console::create_module(output.clone()));
        scriptbox_module.set_sub_module("task", api::task::create_module());
        engine.register_static_module("scriptbox", scriptbox_module.into());
        engine.register_static_module("util", api::util::create_module().into());

        {
            let out = output.clone();
            engine.on_print(move |msg| out.log(Level::Log, msg));
        }
        {
            let out = output;
            engine.on_debug(move |msg, _source, _pos| out.log(Level::Info, msg));
        }

        engine
    }

    pub fn rhai(&self) -> Arc<Engine> {
        Arc::clone(&self.engine)
    }

    /// Compile the script's current file contents and run its top level.
    /// Nothing is cached, so an edited script takes effect on the next load.
    pub fn load(&self, path: &Path) -> Result<ScriptModule> {
        let source = std::fs::read_to_string(path).map_err(|e| ScriptError::load(path, e))?;

        let mut ast = self
            .engine
            .compile(&source)
            .map_err(|e| ScriptError::load(path, e))?;
        ast.set_source(path.to_string_lossy().into_owned());

        let entry = entry_point(&ast).map_err(|cause| ScriptError::load(path, cause))?;

        // Top-level failures surface here rather than on every invocation
        self.engine
            .run_ast_with_scope(&mut Scope::new(), &ast)
            .map_err(|e| ScriptError::load(path, e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(script = %name, entry = %entry, "Loaded script");

        Ok(ScriptModule {
            name,
            ast: Arc::new(ast),
            entry,
        })
    }

    /// Call the module's entry point with the captured text.
    /// The top level is evaluated first so its imports and constants are
    /// visible to the entry point.
    pub fn invoke(&self, module: &ScriptModule, context: &CapturedContext) -> Result<Dynamic> {
        let mut this = self.receiver(module, context);
        let mut scope = Scope::new();
        let options = CallFnOptions::new()
            .eval_ast(true)
            .bind_this_ptr(&mut this);

        self.engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                &module.ast,
                &module.entry,
                (context.text.clone(),),
            )
            .map_err(|e| ScriptError::runtime(&module.name, e))
    }

    fn receiver(&self, module: &ScriptModule, context: &CapturedContext) -> Dynamic {
        let document = context
            .document
            .as_ref()
            .map(|path| Dynamic::from(path.display().to_string()))
            .unwrap_or(Dynamic::UNIT);

        let mut this = Map::new();
        this.insert("script".into(), Dynamic::from(module.name.clone()));
        this.insert("document".into(), document);
        this.insert("env".into(), Dynamic::from_map(self.env.clone()));
        Dynamic::from_map(this)
    }
}

/// Pick the function a script exports: `transform` if it takes one argument,
/// otherwise the only public one-argument function
fn entry_point(ast: &AST) -> std::result::Result<String, String> {
    let candidates: Vec<&str> = ast
        .iter_functions()
        .filter(|f| {
            f.params.len() == 1
                && matches!(f.access, FnAccess::Public)
                && !f.name.starts_with(ANONYMOUS_FN_PREFIX)
        })
        .map(|f| f.name)
        .collect();

    match candidates.as_slice() {
        [] => Err("script must define a function taking one argument".to_string()),
        [only] => Ok(only.to_string()),
        many if many.contains(&ENTRY_POINT) => Ok(ENTRY_POINT.to_string()),
        many => Err(format!(
            "ambiguous entry point ({}); name one of them `{ENTRY_POINT}`",
            many.join(", ")
        )),
    }
}
