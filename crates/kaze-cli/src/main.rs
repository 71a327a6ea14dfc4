mod repl;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser as CliParser;
use owo_colors::OwoColorize;

use kaze_interpreter::Interpreter;
use kaze_parser::Parser;
use kaze_syntax::error::Error;

/// The Kaze programming language.
#[derive(CliParser, Debug)]
#[command(name = "kaze", version, about = "Run a Kaze script, or start a REPL")]
struct Cli {
    /// Script to run; omit to start the interactive REPL.
    script: Option<PathBuf>,
}

fn render_error(kind: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg.red());
}

fn run_file(path: &Path) -> ExitCode {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!(
                "{}: {}",
                "error".red().bold(),
                format!("failed to read {}: {}", path.display(), e).red()
            );
            return ExitCode::FAILURE;
        }
    };
    let src = String::from_utf8_lossy(&bytes);

    let mut parser = Parser::from_source(&src);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        for err in parser.errors() {
            render_error("parse error", err);
        }
        return ExitCode::FAILURE;
    }

    let mut interpreter = Interpreter::new();
    if let Err(e) = interpreter.run(&program) {
        render_error("runtime error", &e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.script {
        Some(path) => run_file(&path),
        None => {
            repl::start_repl();
            ExitCode::SUCCESS
        }
    }
}
