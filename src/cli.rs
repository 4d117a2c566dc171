//! CLI argument parsing and file discovery

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// declfmt - An opinionated formatter for Swift-style declaration files
#[derive(Parser, Debug)]
#[command(name = "declfmt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Format declaration files
    Fmt {
        /// Write formatted output back to files
        #[arg(short, long)]
        write: bool,

        /// Files or directories to format (use - for stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check if files are formatted (exit code 1 if not)
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Discover declaration files from a path (file, directory or glob)
pub fn discover_files(path: &std::path::Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    if path.is_dir() {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "decl") {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        return files;
    }

    if let Ok(paths) = glob::glob(path.to_str().unwrap_or("")) {
        return paths
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
            .filter(|p| p.extension().is_some_and(|ext| ext == "decl"))
            .collect();
    }

    vec![]
}
