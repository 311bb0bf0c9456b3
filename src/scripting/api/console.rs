//! scriptbox::console - Diagnostics routed to the output channel
//!
//! Usage in Rhai:
//! ```rhai
//! scriptbox::console::log("selected " + text.len() + " chars");
//! scriptbox::console::warn("no trailing newline");
//! ```

use rhai::{Dynamic, EvalAltResult};

use crate::host::{Level, OutputChannel};

/// Create the console module writing into `output`
pub fn create_module(output: OutputChannel) -> rhai::Module {
    let mut module = rhai::Module::new();

    for (name, level) in [
        ("log", Level::Log),
        ("info", Level::Info),
        ("warn", Level::Warn),
        ("error", Level::Error),
    ] {
        let out = output.clone();
        module.set_native_fn(
            name,
            move |message: Dynamic| -> Result<(), Box<EvalAltResult>> {
                out.log(level, &message.to_string());
                Ok(())
            },
        );
    }

    module
}
