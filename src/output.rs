//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and emoji support based on terminal capabilities and
//! user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;

use crate::loader::RootKind;
use crate::restriction::Restriction;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never", or "auto".
    /// In auto mode colors are off if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render a restriction, yellow for root-only and red for none.
pub fn restriction_label(config: &OutputConfig, restriction: Restriction) -> String {
    let text = restriction.to_string();
    if !config.use_color {
        return text;
    }
    match restriction {
        Restriction::RootOnly => style(text).yellow().force_styling(true).to_string(),
        Restriction::Unrestricted => style(text).red().force_styling(true).to_string(),
    }
}

/// Render a root kind with a marker for remote roots.
pub fn kind_label(config: &OutputConfig, kind: RootKind) -> String {
    match kind {
        RootKind::GitClone => format!("{} {}", emoji(config, "🌐", "[git]"), kind),
        RootKind::LocalDir => format!("{} {}", emoji(config, "📁", "[dir]"), kind),
        RootKind::LocalFile => format!("{} {}", emoji(config, "📄", "[file]"), kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("NEVER");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🌐", "[git]"), "🌐");
        assert_eq!(emoji(&OutputConfig::without_color(), "🌐", "[git]"), "[git]");
    }

    #[test]
    fn test_restriction_label_plain() {
        let config = OutputConfig::without_color();
        assert_eq!(restriction_label(&config, Restriction::RootOnly), "root-only");
        assert_eq!(restriction_label(&config, Restriction::Unrestricted), "none");
    }

    #[test]
    fn test_restriction_label_colored() {
        let config = OutputConfig::with_color();
        let label = restriction_label(&config, Restriction::RootOnly);
        assert!(label.contains("root-only"));
        assert!(label.contains('\u{1b}'));
    }

    #[test]
    fn test_kind_label() {
        let config = OutputConfig::without_color();
        assert_eq!(kind_label(&config, RootKind::GitClone), "[git] git-clone");
        assert_eq!(kind_label(&config, RootKind::LocalFile), "[file] local-file");
    }
}
