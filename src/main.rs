//! declfmt CLI - An opinionated formatter for Swift-style declaration files

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use declfmt::cli::{discover_files, Cli, Commands};
use declfmt::config::{config_of_path, Configuration};
use declfmt::Diagnostic;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt { write, files } => run_fmt(&files, write),
        Commands::Check { files } => run_check(&files),
    }
}

/// Run the fmt command
fn run_fmt(files: &[PathBuf], write_mode: bool) -> ExitCode {
    let mut had_errors = false;

    for file_path in files {
        if file_path == Path::new("-") {
            match format_stdin() {
                Ok(formatted) => print!("{formatted}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    had_errors = true;
                }
            }
            continue;
        }

        for entry in discover_files(file_path) {
            if let Err(e) = format_file(&entry, write_mode) {
                eprintln!("{}: {e}", entry.display());
                had_errors = true;
            }
        }
    }

    if had_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

/// Run the check command
fn run_check(files: &[PathBuf]) -> ExitCode {
    let mut needs_formatting = false;
    let mut had_errors = false;

    for file_path in files {
        for entry in discover_files(file_path) {
            match check_file(&entry) {
                Ok(formatted) => {
                    if !formatted {
                        eprintln!("{}: needs formatting", entry.display());
                        needs_formatting = true;
                    }
                }
                Err(e) => {
                    eprintln!("{}: {e}", entry.display());
                    had_errors = true;
                }
            }
        }
    }

    if had_errors {
        ExitCode::from(2)
    } else if needs_formatting {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Format a single file
fn format_file(path: &Path, write_mode: bool) -> declfmt::Result<()> {
    let contents = fs::read_to_string(path)?;
    let config = config_of_path(path)?;
    let result = declfmt::format_with(&contents, &config)?;
    report_diagnostics(path, &result.diagnostics);

    if write_mode {
        if result.text != contents {
            fs::write(path, &result.text)?;
        }
    } else {
        print!("{}", result.text);
    }
    Ok(())
}

/// Check a single file
fn check_file(path: &Path) -> declfmt::Result<bool> {
    let contents = fs::read_to_string(path)?;
    let config = config_of_path(path)?;
    let result = declfmt::format_with(&contents, &config)?;
    Ok(result.text == contents)
}

/// Format from stdin
fn format_stdin() -> declfmt::Result<String> {
    let mut contents = String::new();
    io::stdin().read_to_string(&mut contents)?;
    let result = declfmt::format_with(&contents, &Configuration::default())?;
    for diagnostic in &result.diagnostics {
        eprintln!("<stdin>: {diagnostic}");
    }
    Ok(result.text)
}

fn report_diagnostics(path: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}: {diagnostic}", path.display());
    }
}
