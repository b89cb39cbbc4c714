//! Size budget tiers for the post-build report.

use serde::{Deserialize, Serialize};

/// Log level a size tier is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warn,
}

/// A budget tier: artifacts whose total size exceeds `limit_bytes` are
/// classified as `classification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeThreshold {
    pub limit_bytes: u64,
    pub classification: String,
    #[serde(default)]
    pub severity: Severity,
    /// Human readable line printed when this tier is hit.
    #[serde(default)]
    pub message: Option<String>,
}

impl SizeThreshold {
    pub fn new(limit_bytes: u64, classification: impl Into<String>) -> Self {
        Self {
            limit_bytes,
            classification: classification.into(),
            severity: Severity::Info,
            message: None,
        }
    }

    pub fn warn(mut self) -> Self {
        self.severity = Severity::Warn;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The two-tier widget budget: large above 300 KB, acceptable above 100 KB.
pub fn default_thresholds() -> Vec<SizeThreshold> {
    vec![
        SizeThreshold::new(300_000, "large")
            .warn()
            .with_message("Widget bundle is large (>300KB). Consider optimization."),
        SizeThreshold::new(100_000, "acceptable")
            .with_message("Widget bundle size is acceptable (>100KB but <300KB)"),
    ]
}
