//! Native entry point for local testing of the playground runtime outside a
//! browser: `run <file>` loads one module through `ModuleRuntime::run_file`,
//! `repl` drops into an interactive evaluation loop -- the same two shapes
//! the teacher's own CLI offers, adapted to call into the facade instead of
//! evaluating source directly against a bare `Context`.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_vfs::LogicalClock;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Debug, Parser)]
#[command(name = "playground", about = "Run or explore the playground JS runtime from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Loads `file` into the virtual filesystem and executes it as a module.
    Run { file: PathBuf },
    /// Starts an interactive read-eval-print loop.
    Repl,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    simple_logger::init_with_level(log::Level::Warn).ok();

    match Cli::parse().command {
        Command::Run { file } => run_file(&file),
        Command::Repl => repl(),
    }
}

fn new_playground() -> color_eyre::Result<Playground> {
    let clock: Rc<dyn playground_vfs::Clock> = Rc::new(LogicalClock::new());
    Playground::new(clock, PlaygroundConfig::default()).map_err(|err| color_eyre::eyre::eyre!(err.to_string()))
}

fn run_file(file: &PathBuf) -> color_eyre::Result<()> {
    let source = fs::read_to_string(file)?;
    let mut playground = new_playground()?;

    let vfs_path = format!("/{}", file.file_name().and_then(|n| n.to_str()).unwrap_or("main.js"));
    playground.vfs().write(&vfs_path, &source).map_err(|err| color_eyre::eyre::eyre!(err.to_string()))?;

    match playground.run_file(&vfs_path) {
        Ok(value) => {
            let context = playground.context_mut();
            match value.to_string(context) {
                Ok(rendered) => println!("{}", rendered.to_std_string_escaped()),
                Err(err) => eprintln!("{} {err}", "error:".red().bold()),
            }
        }
        Err(err) => eprintln!("{} {err}", "error:".red().bold()),
    }
    Ok(())
}

fn repl() -> color_eyre::Result<()> {
    let mut playground = new_playground()?;
    let mut editor = DefaultEditor::new()?;
    let history_path = ".playground_history";
    let _ = editor.load_history(history_path);

    let mut counter: u64 = 0;
    loop {
        match editor.readline("playground> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                counter += 1;
                let vfs_path = format!("/repl/entry-{counter}.js");
                if let Err(err) = playground.vfs().write(&vfs_path, &line) {
                    eprintln!("{} {err}", "error:".red().bold());
                    continue;
                }

                match playground.run_file(&vfs_path) {
                    Ok(value) => {
                        let context = playground.context_mut();
                        match value.to_string(context) {
                            Ok(rendered) => println!("{}", rendered.to_std_string_escaped()),
                            Err(err) => eprintln!("{} {err}", "error:".red().bold()),
                        }
                    }
                    Err(err) => eprintln!("{} {err}", "error:".red().bold()),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {err}", "error:".red().bold());
                break;
            }
        }
    }

    let _ = editor.save_history(history_path);
    Ok(())
}
