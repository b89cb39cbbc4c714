//! Logger and per-role transform settings.

use serde::{Deserialize, Serialize};

/// Log level for wpack output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging output
    #[serde(alias = "off")]
    Silent,
    /// Only errors
    Error,
    /// Errors and warnings
    #[serde(alias = "warning")]
    Warn,
    /// Errors, warnings, and info (default)
    #[default]
    Info,
    /// All logs including debug
    Debug,
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter())
    }
}

/// Logging channel settings.
///
/// `level: None` means "derive from the build mode": `warn` in production,
/// `info` in development.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    pub enabled: bool,
    pub level: Option<LogLevel>,
    /// Prefix prepended to every report line, e.g. `XCon-Prod`.
    pub prefix: Option<String>,
    pub timestamp: bool,
    /// `None` detects color support from the terminal and environment.
    pub colors: Option<bool>,
    /// Emit a debug line for every transformed module.
    pub show_processed_files: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            level: None,
            prefix: None,
            timestamp: false,
            colors: None,
            show_processed_files: false,
        }
    }
}

/// Per-role minification applied by the transform stage, independent of the
/// global shrink stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub minify_templates: bool,
    pub minify_styles: bool,
    pub remove_comments: bool,
    pub preserve_whitespace: bool,
    /// Inject style modules into the document at load time.
    pub inject_styles: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            minify_templates: true,
            minify_styles: true,
            remove_comments: true,
            preserve_whitespace: false,
            inject_styles: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn explicit_colors_setting_is_kept() {
        let options: LoggerOptions = serde_json::from_str(r#"{"colors": false}"#).unwrap();
        assert_eq!(options.colors, Some(false));
        assert_eq!(LoggerOptions::default().colors, None);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Silent.to_string(), "off");
    }
}
