//! Formatting configuration
//!
//! A `Configuration` is treated as immutable for the duration of a run.
//! It can be loaded from a `.declfmt.yml` file discovered by walking up
//! from the formatted file, or built in code; every field has a default.

use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::formatter::indent::Indent;

pub const CONFIG_FILE_NAME: &str = ".declfmt.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Soft target column budget.
    pub line_length: usize,
    /// The unit pushed for each level of block or continuation indentation.
    pub indentation: Indent,
    /// Visual width of a tab character for measurement.
    pub tab_width: usize,
    /// Two consecutive newlines make one blank line.
    pub maximum_blank_lines: usize,
    /// Preserve line breaks that already exist in the source.
    pub respects_existing_line_breaks: bool,
    pub line_break_before_control_flow_keywords: bool,
    pub line_break_before_each_argument: bool,
    pub line_break_before_each_generic_requirement: bool,
    /// Re-wrap `///` comment bodies as Markdown.
    pub reflow_doc_comments: bool,
    /// Rule toggles consumed by the lint layer, carried here so one file
    /// configures the whole tool.
    pub rules: HashMap<String, bool>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            line_length: 100,
            indentation: Indent::Spaces(2),
            tab_width: 8,
            maximum_blank_lines: 1,
            respects_existing_line_breaks: true,
            line_break_before_control_flow_keywords: false,
            line_break_before_each_argument: false,
            line_break_before_each_generic_requirement: false,
            reflow_doc_comments: false,
            rules: HashMap::new(),
        }
    }
}

pub fn config_of_path(file_path: &Path) -> Result<Configuration> {
    match file_path.parent() {
        Some(dir_path) => config_of_dir(dir_path),
        None => Ok(Configuration::default()),
    }
}

pub fn config_of_dir(dir_path: &Path) -> Result<Configuration> {
    let config = match find_config_file_path(dir_path) {
        Some(config_path) => {
            let config_file = File::open(&config_path)?;
            let reader = BufReader::new(config_file);
            serde_yaml::from_reader(reader).map_err(|e| Error::ConfigError {
                message: format!("{}: {e}", config_path.display()),
            })?
        }
        None => Configuration::default(),
    };
    Ok(config)
}

fn find_config_file_path(base: &Path) -> Option<PathBuf> {
    let config_path = base.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        return Some(config_path);
    }
    base.parent().and_then(find_config_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert_eq!(config.line_length, 100);
        assert_eq!(config.indentation, Indent::Spaces(2));
        assert_eq!(config.maximum_blank_lines, 1);
        assert!(config.respects_existing_line_breaks);
        assert!(!config.reflow_doc_comments);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let config: Configuration =
            serde_yaml::from_str("line_length: 80\nmaximum_blank_lines: 2\n").unwrap();
        assert_eq!(config.line_length, 80);
        assert_eq!(config.maximum_blank_lines, 2);
        assert_eq!(config.indentation, Indent::Spaces(2));
    }

    #[test]
    fn indentation_unit_from_yaml() {
        let config: Configuration =
            serde_yaml::from_str("indentation:\n  spaces: 4\n").unwrap();
        assert_eq!(config.indentation, Indent::Spaces(4));

        let config: Configuration = serde_yaml::from_str("indentation:\n  tabs: 1\n").unwrap();
        assert_eq!(config.indentation, Indent::Tabs(1));
    }

    #[test]
    fn rule_toggles_from_yaml() {
        let config: Configuration =
            serde_yaml::from_str("rules:\n  NoExplicitInternal: true\n").unwrap();
        assert_eq!(config.rules.get("NoExplicitInternal"), Some(&true));
    }
}
