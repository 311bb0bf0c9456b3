//! Running a script end to end: load, capture, invoke, settle, write back.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::context::{self, CapturedContext};
use super::deferred::take_deferred;
use super::engine::ScriptEngine;
use super::reconcile::{self, Applied, ScriptResult};
use crate::editor::{SharedWorkspace, read_workspace};
use crate::error::{Result, ScriptError};
use crate::host::{Notifier, OutputChannel, Progress};

/// How a run ended, as seen by the caller of [`ScriptRunner::run`]
#[derive(Debug)]
pub enum RunOutcome {
    /// No active editor; nothing was invoked
    NoActiveEditor,
    /// The script threw; already reported to the user
    Failed(ScriptError),
    Completed(Applied),
    /// The script returned a deferred value that is still settling
    Pending(PendingRun),
}

/// A deferred script result settling in the background
#[derive(Debug)]
pub struct PendingRun {
    pub script: String,
    handle: JoinHandle<Result<Applied>>,
}

impl PendingRun {
    /// Wait for settlement and write-back
    pub async fn settled(self) -> Result<Applied> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ScriptError::runtime(self.script, e)),
        }
    }
}

pub struct ScriptRunner {
    engine: Arc<ScriptEngine>,
    workspace: SharedWorkspace,
    notifier: Arc<dyn Notifier>,
    output: OutputChannel,
    show_progress: bool,
}

impl ScriptRunner {
    pub fn new(
        engine: Arc<ScriptEngine>,
        workspace: SharedWorkspace,
        notifier: Arc<dyn Notifier>,
        output: OutputChannel,
    ) -> Self {
        Self {
            engine,
            workspace,
            notifier,
            output,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run the script at `path` against the active editor.
    ///
    /// Load errors are returned (and reported) before anything is captured.
    /// A deferred result is settled on a spawned task; must be called from
    /// within a tokio runtime.
    pub fn run(&self, path: &Path) -> Result<RunOutcome> {
        let module = match self.engine.load(path) {
            Ok(module) => module,
            Err(err) => {
                self.notifier.show_error(&err.to_string());
                return Err(err);
            }
        };

        let Some(context) = context::capture(&read_workspace(&self.workspace)) else {
            info!(script = %module.name, "No active editor; nothing to run against");
            return Ok(RunOutcome::NoActiveEditor);
        };

        info!(
            script = %module.name,
            entry = %module.entry(),
            editor = context.target,
            "Running script"
        );
        let value = match self.engine.invoke(&module, &context) {
            Ok(value) => value,
            Err(err) => {
                self.report(&err);
                return Ok(RunOutcome::Failed(err));
            }
        };

        let deferred = match take_deferred(value) {
            Ok(deferred) => deferred,
            Err(value) => {
                let applied = self.reconcile(ScriptResult::classify(value), &context);
                return Ok(RunOutcome::Completed(applied));
            }
        };

        let progress = self.show_progress.then(|| {
            Progress::begin(
                Arc::clone(&self.notifier),
                format!("Running script {}", module.name),
            )
        });
        let engine = self.engine.rhai();
        let ast = module.ast();
        let script = module.name.clone();
        let workspace = Arc::clone(&self.workspace);
        let notifier = Arc::clone(&self.notifier);
        let output = self.output.clone();

        let handle = tokio::spawn({
            let script = script.clone();
            async move {
                let settled = deferred.settle(engine, ast).await;
                drop(progress);
                match settled {
                    Ok(value) => {
                        let applied = reconcile::apply(
                            ScriptResult::classify(value),
                            &context,
                            &workspace,
                            &output,
                        );
                        summarize(notifier.as_ref(), &applied);
                        Ok(applied)
                    }
                    Err(message) => {
                        let err = ScriptError::runtime(script, message);
                        warn!("{err}");
                        notifier.show_error(&err.to_string());
                        Err(err)
                    }
                }
            }
        });

        Ok(RunOutcome::Pending(PendingRun { script, handle }))
    }

    fn reconcile(&self, result: ScriptResult, context: &CapturedContext) -> Applied {
        let applied = reconcile::apply(result, context, &self.workspace, &self.output);
        summarize(self.notifier.as_ref(), &applied);
        applied
    }

    fn report(&self, err: &ScriptError) {
        warn!("{err}");
        self.notifier.show_error(&err.to_string());
    }
}

fn summarize(notifier: &dyn Notifier, applied: &Applied) {
    if let Applied::Files(report) = applied {
        if !report.is_complete() {
            notifier.show_error(&format!(
                "{} of {} files could not be written; see the output channel",
                report.failed.len(),
                report.failed.len() + report.written.len()
            ));
        }
    }
}
