//! The scratch buffer: a REPL re-evaluated after every edit burst.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use super::api;
use crate::error::{Result, ScriptError};
use crate::host::{Level, OutputChannel};

/// Collapses bursts of triggers into one action after a quiet period
pub struct Debouncer {
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `action`, discarding any action still waiting to fire
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now() + self.quiet;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            action();
        }));
    }

    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Evaluates the scratch file in an isolated engine whenever it changes
pub struct ScratchEvaluator {
    scratch_path: PathBuf,
    output: OutputChannel,
    debouncer: Debouncer,
    max_operations: u64,
    evaluations: Arc<AtomicUsize>,
}

impl ScratchEvaluator {
    pub fn new(
        scratch_path: PathBuf,
        output: OutputChannel,
        quiet: Duration,
        max_operations: u64,
    ) -> Self {
        Self {
            scratch_path,
            output,
            debouncer: Debouncer::new(quiet),
            max_operations,
            evaluations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Case-insensitive match against the scratch file path
    pub fn is_scratch(&self, path: &Path) -> bool {
        path.to_string_lossy().to_lowercase()
            == self.scratch_path.to_string_lossy().to_lowercase()
    }

    /// Feed a document change. Returns whether an evaluation was scheduled.
    pub fn on_document_changed(&self, path: &Path, text: String) -> bool {
        if !self.is_scratch(path) {
            return false;
        }

        let output = self.output.clone();
        let max_operations = self.max_operations;
        let evaluations = Arc::clone(&self.evaluations);
        self.debouncer.schedule(move || {
            let run = evaluations.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(run, "Evaluating scratch");
            evaluate_into(&text, max_operations, &output);
        });
        true
    }

    /// Number of evaluations that actually ran
    #[cfg(test)]
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

/// Replace the output with the result of `code`, or append the failure
fn evaluate_into(code: &str, max_operations: u64, output: &OutputChannel) {
    let (result, printed) = run_isolated(code, max_operations);
    match result {
        Ok(value) => {
            output.clear();
            for line in printed {
                output.append_line(line);
            }
            output.append_line(api::util::to_pretty_json(&value));
        }
        Err(err) => {
            for line in printed {
                output.append_line(line);
            }
            output.log(Level::Error, &err.to_string());
        }
    }
}

/// Evaluate `code` once in an isolated engine, appending prints, the
/// structured result or the error to `output` without clearing it
pub fn evaluate(code: &str, max_operations: u64, output: &OutputChannel) -> Result<Dynamic> {
    let (result, printed) = run_isolated(code, max_operations);
    for line in printed {
        output.append_line(line);
    }
    match result {
        Ok(value) => {
            output.append_line(api::util::to_pretty_json(&value));
            Ok(value)
        }
        Err(err) => {
            output.log(Level::Error, &err.to_string());
            Err(err)
        }
    }
}

/// A fresh engine per evaluation: only `util` is bound, imports resolve to
/// nothing, and prints are buffered rather than written to the process
fn run_isolated(code: &str, max_operations: u64) -> (Result<Dynamic>, Vec<String>) {
    let printed = Arc::new(Mutex::new(Vec::new()));

    let mut engine = Engine::new();
    engine.set_max_expr_depths(64, 64);
    engine.set_max_operations(max_operations);
    engine.set_max_array_size(api::util::MAX_ARRAY_SIZE);
    engine.set_module_resolver(DummyModuleResolver::new());
    engine.register_static_module("util", api::util::create_module().into());
    {
        let printed = Arc::clone(&printed);
        engine.on_print(move |msg| {
            printed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{} {msg}", Level::Log.tag()));
        });
    }
    {
        let printed = Arc::clone(&printed);
        engine.on_debug(move |msg, _source, _pos| {
            printed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{} {msg}", Level::Info.tag()));
        });
    }

    let result = engine
        .eval::<Dynamic>(code)
        .map_err(|e| ScriptError::Evaluation(e.to_string()));
    debug!(ok = result.is_ok(), "Evaluated scratch");

    let printed = std::mem::take(&mut *printed.lock().unwrap_or_else(PoisonError::into_inner));
    (result, printed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    fn evaluator(output: &OutputChannel) -> ScratchEvaluator {
        ScratchEvaluator::new(
            PathBuf::from("/home/me/.scriptbox/scratch.rhai"),
            output.clone(),
            QUIET,
            1_000_000,
        )
    }

    #[test]
    fn scratch_path_matches_case_insensitively() {
        let eval = evaluator(&OutputChannel::new("t"));
        assert!(eval.is_scratch(Path::new("/HOME/me/.scriptbox/Scratch.rhai")));
        assert!(!eval.is_scratch(Path::new("/home/me/.scriptbox/other.rhai")));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_edit() {
        let output = OutputChannel::new("t");
        let eval = evaluator(&output);
        let path = Path::new("/home/me/.scriptbox/scratch.rhai");

        for text in ["1", "1 + 1", "[1, 2, 3]"] {
            assert!(eval.on_document_changed(path, text.to_string()));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(eval.evaluation_count(), 0);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(eval.evaluation_count(), 1);
        assert_eq!(output.contents(), "[\n  1,\n  2,\n  3\n]");
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_each_evaluate() {
        let output = OutputChannel::new("t");
        let eval = evaluator(&output);
        let path = Path::new("/home/me/.scriptbox/scratch.rhai");

        eval.on_document_changed(path, "1".into());
        tokio::time::sleep(Duration::from_millis(400)).await;
        eval.on_document_changed(path, "2".into());
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(eval.evaluation_count(), 2);
        assert_eq!(output.lines(), vec!["2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn other_documents_are_ignored() {
        let output = OutputChannel::new("t");
        let eval = evaluator(&output);

        assert!(!eval.on_document_changed(Path::new("/tmp/notes.rhai"), "1".into()));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(eval.evaluation_count(), 0);
    }

    #[test]
    fn success_clears_previous_output() {
        let output = OutputChannel::new("t");
        output.append_line("stale");
        evaluate_into(r#"print("hey"); #{ a: util::sum([1, 2]) }"#, 1_000_000, &output);
        assert_eq!(output.lines(), vec!["LOG   hey", "{\n  \"a\": 3\n}"]);
    }

    #[test]
    fn failure_appends_without_clearing() {
        let output = OutputChannel::new("t");
        output.append_line("previous result");
        evaluate_into("let x = ;", 1_000_000, &output);

        let lines = output.lines();
        assert_eq!(lines[0], "previous result");
        assert!(lines[1].starts_with("ERROR Failed to evaluate scratch:"));
    }

    #[test]
    fn sandbox_cannot_import_modules() {
        let output = OutputChannel::new("t");
        let err = evaluate(r#"import "helpers" as h; h::x"#, 1_000_000, &output).unwrap_err();
        assert!(matches!(err, ScriptError::Evaluation(_)));
    }

    #[test]
    fn sandbox_has_no_script_namespace() {
        let output = OutputChannel::new("t");
        assert!(evaluate(r#"scriptbox::task::after(1, 1)"#, 1_000_000, &output).is_err());
    }

    #[test]
    fn runaway_evaluation_is_stopped() {
        let output = OutputChannel::new("t");
        assert!(evaluate("loop {}", 1_000, &output).is_err());
    }

    #[test]
    fn oversized_range_is_reported_not_allocated() {
        let output = OutputChannel::new("t");
        let err = evaluate("util::range(0, 10000000000)", 1_000_000, &output).unwrap_err();
        assert!(matches!(err, ScriptError::Evaluation(_)));
        assert!(output.contents().starts_with("ERROR"));
    }

    #[test]
    fn evaluate_appends_structured_result() {
        let output = OutputChannel::new("t");
        output.append_line("kept");
        let value = evaluate("util::words(\"a b\")", 1_000_000, &output).unwrap();
        assert!(value.is_array());
        assert_eq!(output.lines(), vec!["kept", "[\n  \"a\",\n  \"b\"\n]"]);
    }
}
