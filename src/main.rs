use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod editor;
mod error;
mod host;
mod logging;
mod scripting;

use commands::App;
use editor::Selection;

/// Run personal text transformation scripts against files and selections
#[derive(Parser, Debug)]
#[command(name = "scriptbox", version)]
struct Cli {
    /// Script directory (defaults to ~/.scriptbox)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available scripts
    List,
    /// Create a new script from the template
    New { name: String },
    /// Open a script in $VISUAL / $EDITOR
    Edit { name: String },
    /// Run a script against a file (or stdin)
    Run {
        script: String,
        file: Option<PathBuf>,
        /// Char range to operate on, e.g. 0..12
        #[arg(long, value_parser = parse_selection)]
        select: Option<Selection>,
        /// Save the result back to the file instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Evaluate the selected text (or whole file/stdin) as a program
    Eval {
        file: Option<PathBuf>,
        #[arg(long, value_parser = parse_selection)]
        select: Option<Selection>,
    },
    /// Watch the scratch file and evaluate it on every change
    Scratch,
    /// Print the effective configuration
    Config,
}

fn parse_selection(s: &str) -> Result<Selection, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{s}'"))?;
    let start = start.trim().parse::<usize>().map_err(|e| e.to_string())?;
    let end = end.trim().parse::<usize>().map_err(|e| e.to_string())?;
    Ok(Selection::new(start, end))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let app = match App::new(cli.dir) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("scriptbox: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::List => app.list(),
        Command::New { name } => app.create_script(&name),
        Command::Edit { name } => app.edit_script(&name).await,
        Command::Run {
            script,
            file,
            select,
            write,
        } => app.run_script(&script, file, select, write).await,
        Command::Eval { file, select } => app.run_selection(file, select),
        Command::Scratch => app.open_scratch().await,
        Command::Config => app.print_config(),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            app.report(&err);
            ExitCode::FAILURE
        }
    }
}
