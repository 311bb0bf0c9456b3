//! Deferred script results: values that settle after the invocation returns.

use std::sync::Arc;
use std::time::Duration;

use rhai::{AST, Dynamic, Engine, FnPtr};
use tracing::debug;

/// A value a script hands back to be resolved later.
/// Built from scripts through `scriptbox::task`.
#[derive(Debug, Clone)]
pub struct Deferred {
    delay: Duration,
    work: Work,
}

#[derive(Debug, Clone)]
enum Work {
    Value(Dynamic),
    Call { callback: FnPtr, arg: Dynamic },
    Reject(String),
}

impl Deferred {
    pub fn resolved(delay: Duration, value: Dynamic) -> Self {
        Self {
            delay,
            work: Work::Value(value),
        }
    }

    pub fn call(delay: Duration, callback: FnPtr, arg: Dynamic) -> Self {
        Self {
            delay,
            work: Work::Call { callback, arg },
        }
    }

    pub fn rejected(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            delay,
            work: Work::Reject(message.into()),
        }
    }

    /// Wait for the value. Callbacks run on the blocking pool; a value that
    /// is itself deferred is awaited in turn.
    pub async fn settle(self, engine: Arc<Engine>, ast: Arc<AST>) -> Result<Dynamic, String> {
        let mut current = self;
        loop {
            if !current.delay.is_zero() {
                tokio::time::sleep(current.delay).await;
            }

            let value = match current.work {
                Work::Value(value) => value,
                Work::Reject(message) => return Err(message),
                Work::Call { callback, arg } => {
                    let engine = Arc::clone(&engine);
                    let ast = Arc::clone(&ast);
                    debug!(callback = %callback.fn_name(), "Running deferred callback");
                    tokio::task::spawn_blocking(move || {
                        callback.call::<Dynamic>(&engine, &ast, (arg,))
                    })
                    .await
                    .map_err(|e| e.to_string())?
                    .map_err(|e| e.to_string())?
                }
            };

            match take_deferred(value) {
                Ok(next) => current = next,
                Err(value) => return Ok(value),
            }
        }
    }
}

/// Split a script's return value into a deferred value or a plain one
pub fn take_deferred(value: Dynamic) -> Result<Deferred, Dynamic> {
    if !value.is::<Deferred>() {
        return Err(value);
    }
    value.try_cast::<Deferred>().ok_or(Dynamic::UNIT)
}
