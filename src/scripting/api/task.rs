//! scriptbox::task - Deferred results
//!
//! Usage in Rhai:
//! ```rhai
//! fn transform(text) {
//!     // resolve after a second
//!     scriptbox::task::after(1000, text.to_upper())
//! }
//!
//! fn slow(text) {
//!     // run a closure off the event loop
//!     scriptbox::task::defer(|t| t.to_upper(), text)
//! }
//! ```

use std::time::Duration;

use rhai::{Dynamic, EvalAltResult, FnPtr};

use crate::scripting::deferred::Deferred;

fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}

pub fn create_module() -> rhai::Module {
    let mut module = rhai::Module::new();

    // after(ms: i64, value) -> Deferred
    module.set_native_fn(
        "after",
        |ms: i64, value: Dynamic| -> Result<Deferred, Box<EvalAltResult>> {
            Ok(Deferred::resolved(millis(ms), value))
        },
    );

    // defer(callback: FnPtr, arg) -> Deferred
    module.set_native_fn(
        "defer",
        |callback: FnPtr, arg: Dynamic| -> Result<Deferred, Box<EvalAltResult>> {
            Ok(Deferred::call(Duration::ZERO, callback, arg))
        },
    );

    // delay(ms: i64, callback: FnPtr, arg) -> Deferred
    module.set_native_fn(
        "delay",
        |ms: i64, callback: FnPtr, arg: Dynamic| -> Result<Deferred, Box<EvalAltResult>> {
            Ok(Deferred::call(millis(ms), callback, arg))
        },
    );

    // reject(ms: i64, message: &str) -> Deferred
    module.set_native_fn(
        "reject",
        |ms: i64, message: &str| -> Result<Deferred, Box<EvalAltResult>> {
            Ok(Deferred::rejected(millis(ms), message))
        },
    );

    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::deferred::take_deferred;

    fn engine() -> rhai::Engine {
        let mut engine = rhai::Engine::new();
        engine.register_type_with_name::<Deferred>("Deferred");
        engine.register_static_module("task", create_module().into());
        engine
    }

    #[test]
    fn task_functions_build_deferred_values() {
        let engine = engine();
        for script in [
            r#"task::after(10, "x")"#,
            r#"task::defer(|s| s.len(), "abc")"#,
            r#"task::delay(-5, |s| s, "abc")"#,
            r#"task::reject(0, "nope")"#,
        ] {
            let value = engine.eval::<Dynamic>(script).unwrap();
            assert!(take_deferred(value).is_ok(), "{script} is not deferred");
        }
    }

    #[test]
    fn deferred_type_name_is_readable() {
        let engine = engine();
        let name = engine.eval::<String>(r#"type_of(task::after(0, 1))"#).unwrap();
        assert_eq!(name, "Deferred");
    }
}
