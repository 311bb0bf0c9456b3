//! The commands the host exposes: create, edit, run, run-selection,
//! open-scratch, plus listing and config inspection.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use futures::channel::mpsc;
use notify::{EventKind, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::config::{ConfigEngine, Settings};
use crate::editor::{Selection, SharedWorkspace, Workspace, read_workspace, write_workspace};
use crate::error::{Result, ScriptError, Surface};
use crate::host::{Notifier, OutputChannel, TerminalNotifier};
use crate::scripting::{
    Applied, RunOutcome, ScratchEvaluator, ScriptDirectory, ScriptEngine, ScriptRunner, evaluate,
};

const OUTPUT_CHANNEL: &str = "ScriptBox";
const FALLBACK_EDITOR: &str = "vi";

pub struct App {
    dir: ScriptDirectory,
    settings: Settings,
    notifier: Arc<dyn Notifier>,
}

impl App {
    /// Resolve the script directory, creating it if needed, and load its
    /// config. A broken config is reported and defaults are used.
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let root = dir
            .or_else(ScriptDirectory::default_root)
            .ok_or_else(|| ScriptError::Config("could not determine home directory".into()))?;
        let dir = ScriptDirectory::new(root);
        dir.ensure()?;

        let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
        let mut config = ConfigEngine::new();
        let settings = match config.load_from_dir(dir.root()) {
            Ok(()) => config.settings(),
            Err(err) => {
                notifier.show_error(&err.to_string());
                Settings::default()
            }
        };

        Ok(Self {
            dir,
            settings,
            notifier,
        })
    }

    pub fn report(&self, err: &ScriptError) {
        match err.surface() {
            Surface::Notification => self.notifier.show_error(&err.to_string()),
            Surface::OutputChannel => warn!("{err}"),
        }
    }

    pub fn list(&self) -> Result<ExitCode> {
        for name in self.dir.enumerate()? {
            println!("{name}");
        }
        Ok(ExitCode::SUCCESS)
    }

    pub fn create_script(&self, name: &str) -> Result<ExitCode> {
        let path = self.dir.create_script(name)?;
        info!(path = %path.display(), "Created script");
        println!("{}", path.display());
        Ok(ExitCode::SUCCESS)
    }

    pub async fn edit_script(&self, name: &str) -> Result<ExitCode> {
        let path = match self.dir.find(name) {
            Ok(path) => path,
            Err(err @ ScriptError::UnknownScript { .. }) => {
                self.show_available();
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        open_in_editor(&path).await
    }

    /// Run a script against `file` (or stdin) and print or save the result
    pub async fn run_script(
        &self,
        name: &str,
        file: Option<PathBuf>,
        select: Option<Selection>,
        write: bool,
    ) -> Result<ExitCode> {
        let script = match self.dir.find(name) {
            Ok(path) => path,
            Err(err @ ScriptError::UnknownScript { .. }) => {
                self.show_available();
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let workspace = open_document(file, select)?;
        let output = OutputChannel::new(OUTPUT_CHANNEL);
        let engine = ScriptEngine::new(self.dir.root(), &self.settings, output.clone());
        let runner = ScriptRunner::new(
            Arc::new(engine),
            Arc::clone(&workspace),
            Arc::clone(&self.notifier),
            output.clone(),
        )
        .with_progress(self.settings.show_progress);

        let applied = match runner.run(&script) {
            // Load errors are reported by the runner
            Err(_) | Ok(RunOutcome::NoActiveEditor) => None,
            Ok(RunOutcome::Failed(err)) => {
                debug!(script = name, "Script failed: {err}");
                None
            }
            Ok(RunOutcome::Completed(applied)) => Some(applied),
            Ok(RunOutcome::Pending(run)) => run.settled().await.ok(),
        };

        for line in output.lines() {
            eprintln!("{line}");
        }

        let target = match applied {
            None => return Ok(ExitCode::FAILURE),
            Some(Applied::Files(report)) => {
                for path in &report.written {
                    println!("{}", path.display());
                }
                return Ok(if report.is_complete() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                });
            }
            Some(Applied::Replaced { editor }) => Some(editor),
            Some(Applied::Nothing | Applied::TargetGone) => None,
        };

        if write {
            let mut ws = write_workspace(&workspace);
            if let Some(editor) = target.and_then(|id| ws.editor_mut(id)) {
                editor.buffer.save()?;
            }
        } else {
            let ws = read_workspace(&workspace);
            if let Some(editor) = target.and_then(|id| ws.editor(id)).or_else(|| ws.active_editor()) {
                print!("{}", editor.buffer.text());
            }
        }

        Ok(ExitCode::SUCCESS)
    }

    /// Evaluate the raw selection as a program, outside the script machinery
    pub fn run_selection(
        &self,
        file: Option<PathBuf>,
        select: Option<Selection>,
    ) -> Result<ExitCode> {
        let workspace = open_document(file, select)?;
        let code = {
            let ws = read_workspace(&workspace);
            match ws.active_editor() {
                Some(editor) if !editor.selection.is_empty() => editor.selected_text(),
                Some(editor) => editor.buffer.text(),
                None => return Ok(ExitCode::SUCCESS),
            }
        };

        let output = OutputChannel::new(OUTPUT_CHANNEL).with_terminal_echo();
        match evaluate(&code, self.settings.max_operations, &output) {
            Ok(_) => Ok(ExitCode::SUCCESS),
            Err(_) => Ok(ExitCode::FAILURE),
        }
    }

    /// Create the scratch file if absent and evaluate it on every change
    /// until interrupted
    pub async fn open_scratch(&self) -> Result<ExitCode> {
        let scratch = self.dir.ensure_scratch()?;
        let scratch = std::fs::canonicalize(&scratch).unwrap_or(scratch);
        let watch_root = scratch
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.dir.root().to_path_buf());

        let output = OutputChannel::new(OUTPUT_CHANNEL).with_terminal_echo();
        info!(channel = output.name(), "Scratch output channel");
        let evaluator = ScratchEvaluator::new(
            scratch.clone(),
            output,
            self.settings.debounce(),
            self.settings.max_operations,
        );

        let (tx, rx) = mpsc::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = tx.unbounded_send(res);
        })
        .map_err(io::Error::other)?;
        watcher
            .watch(&watch_root, RecursiveMode::NonRecursive)
            .map_err(io::Error::other)?;

        info!(path = %scratch.display(), "Watching scratch file");
        self.notifier
            .show_info(&format!("Evaluating {} on save; Ctrl-C to stop", scratch.display()));
        feed_scratch(&evaluator, &scratch);

        pump_scratch_events(&evaluator, rx, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

        Ok(ExitCode::SUCCESS)
    }

    pub fn print_config(&self) -> Result<ExitCode> {
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| ScriptError::Config(e.to_string()))?;
        println!("{json}");
        Ok(ExitCode::SUCCESS)
    }

    fn show_available(&self) {
        match self.dir.enumerate() {
            Ok(names) => self
                .notifier
                .show_info(&format!("Available scripts: {}", names.join(", "))),
            Err(err) => self.notifier.show_info(&err.to_string()),
        }
    }
}

/// Open `file`, or stdin as an untitled document, as the active editor
fn open_document(file: Option<PathBuf>, select: Option<Selection>) -> Result<SharedWorkspace> {
    let mut workspace = Workspace::new();
    let id = match file {
        Some(path) => workspace.open_file(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            workspace.open_text(&text)
        }
    };
    if let (Some(selection), Some(editor)) = (select, workspace.editor_mut(id)) {
        editor.select(selection);
    }
    Ok(workspace.shared())
}

fn feed_scratch(evaluator: &ScratchEvaluator, path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            evaluator.on_document_changed(path, text);
        }
        Err(e) => warn!(path = %path.display(), "Failed to read scratch file: {e}"),
    }
}

/// Feed watcher events for the scratch file to `evaluator` until `shutdown`
/// resolves or the event stream ends
async fn pump_scratch_events<S>(
    evaluator: &ScratchEvaluator,
    mut events: S,
    shutdown: impl Future<Output = ()>,
) where
    S: Stream<Item = notify::Result<notify::Event>> + Unpin,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            res = events.next() => match res {
                Some(Ok(event)) => {
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        continue;
                    }
                    for path in event.paths.iter().filter(|p| evaluator.is_scratch(p)) {
                        feed_scratch(evaluator, path);
                    }
                }
                Some(Err(e)) => warn!("Watch error: {e}"),
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }
}

async fn open_in_editor(path: &Path) -> Result<ExitCode> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| FALLBACK_EDITOR.to_string());

    let status = tokio::process::Command::new(&editor)
        .arg(path)
        .status()
        .await?;
    if status.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(editor = %editor, ?status, "Editor exited with failure");
        Ok(ExitCode::FAILURE)
    }
}
