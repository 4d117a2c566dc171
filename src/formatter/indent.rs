//! Indentation units.
//!
//! Indentation is kept as a stack of units rather than a single counter so
//! that block indentation and continuation indentation can be pushed and
//! popped independently.

use serde::Deserialize;

use crate::config::Configuration;

/// One run of indentation characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indent {
    Spaces(usize),
    Tabs(usize),
}

impl Indent {
    /// The text this unit renders to.
    pub fn text(&self) -> String {
        match self {
            Self::Spaces(n) => " ".repeat(*n),
            Self::Tabs(n) => "\t".repeat(*n),
        }
    }

    /// Visual width in columns, using the configured tab width.
    pub fn width(&self, config: &Configuration) -> usize {
        match self {
            Self::Spaces(n) => *n,
            Self::Tabs(n) => *n * config.tab_width,
        }
    }
}

/// Rendering and measuring over a whole indentation stack.
pub trait Indentation {
    fn render(&self) -> String;
    fn width(&self, config: &Configuration) -> usize;
}

impl Indentation for [Indent] {
    fn render(&self) -> String {
        self.iter().map(Indent::text).collect()
    }

    fn width(&self, config: &Configuration) -> usize {
        self.iter().map(|unit| unit.width(config)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_render_and_measure() {
        let config = Configuration::default();
        let unit = Indent::Spaces(4);
        assert_eq!(unit.text(), "    ");
        assert_eq!(unit.width(&config), 4);
    }

    #[test]
    fn tabs_measure_with_tab_width() {
        let config = Configuration {
            tab_width: 8,
            ..Configuration::default()
        };
        let unit = Indent::Tabs(2);
        assert_eq!(unit.text(), "\t\t");
        assert_eq!(unit.width(&config), 16);
    }

    #[test]
    fn stack_renders_in_order() {
        let config = Configuration::default();
        let stack = [Indent::Spaces(2), Indent::Spaces(2)];
        assert_eq!(stack.render(), "    ");
        assert_eq!(stack.width(&config), 4);
    }
}
