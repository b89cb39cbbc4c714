//! Size auditing of the final artifact set.

use std::io::Write as _;

use flate2::Compression;
use flate2::write::GzEncoder;
use wpack_config::{BuildConfig, Mode, Severity, SizeThreshold};

use crate::bundle::{ArtifactKind, ArtifactSet};
use crate::error::BuildError;
use crate::lifecycle::{BuildObserver, BuildState};

/// Tracing target of every report line.
pub const REPORT_TARGET: &str = "wpack::report";

/// Classification when no threshold is exceeded.
pub const OPTIMAL: &str = "optimal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSize {
    pub name: String,
    pub size_bytes: u64,
    /// gzip size, when compressed sizes are reported.
    pub gzip_bytes: Option<u64>,
    pub kind: ArtifactKind,
}

/// The tier a total falls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub name: String,
    pub severity: Severity,
    pub message: Option<String>,
    /// Limit of the matched tier, `None` for [`OPTIMAL`].
    pub limit_bytes: Option<u64>,
}

impl Classification {
    fn optimal(thresholds: &[SizeThreshold]) -> Self {
        let smallest = thresholds.iter().map(|t| t.limit_bytes).min();
        Self {
            name: OPTIMAL.to_string(),
            severity: Severity::Info,
            message: Some(match smallest {
                Some(limit) => format!("Widget bundle is optimally sized (<{}KB)", limit / 1000),
                None => "Widget bundle is optimally sized".to_string(),
            }),
            limit_bytes: None,
        }
    }
}

/// Classify `total_bytes`: thresholds are checked from the largest limit
/// down and the first one exceeded wins.
pub fn classify(total_bytes: u64, thresholds: &[SizeThreshold]) -> Classification {
    let mut ordered: Vec<&SizeThreshold> = thresholds.iter().collect();
    ordered.sort_by(|a, b| b.limit_bytes.cmp(&a.limit_bytes));

    ordered
        .into_iter()
        .find(|threshold| total_bytes > threshold.limit_bytes)
        .map(|threshold| Classification {
            name: threshold.classification.clone(),
            severity: threshold.severity,
            message: threshold.message.clone(),
            limit_bytes: Some(threshold.limit_bytes),
        })
        .unwrap_or_else(|| Classification::optimal(thresholds))
}

/// Per-artifact and total sizes of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    pub per_artifact: Vec<ArtifactSize>,
    pub total_bytes: u64,
    pub classification: Classification,
}

impl SizeReport {
    pub fn compute(
        artifacts: &ArtifactSet,
        thresholds: &[SizeThreshold],
        report_compressed_size: bool,
    ) -> Self {
        let per_artifact: Vec<ArtifactSize> = artifacts
            .entries()
            .map(|(name, bytes, kind)| ArtifactSize {
                name: name.to_string(),
                size_bytes: bytes.len() as u64,
                gzip_bytes: report_compressed_size.then(|| gzip_size(bytes)).flatten(),
                kind,
            })
            .collect();
        let total_bytes = per_artifact.iter().map(|a| a.size_bytes).sum();

        Self {
            classification: classify(total_bytes, thresholds),
            per_artifact,
            total_bytes,
        }
    }

    pub fn chunk(&self) -> Option<&ArtifactSize> {
        self.per_artifact
            .iter()
            .find(|artifact| artifact.kind == ArtifactKind::Chunk)
    }
}

/// Size of `bytes` after gzip at the best compression level.
pub fn gzip_size(bytes: &[u8]) -> Option<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes).ok()?;
    encoder.finish().ok().map(|out| out.len() as u64)
}

/// `12.34 KB`, the unit report lines use.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// A rendered report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub severity: Severity,
    pub text: String,
}

impl ReportLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    fn warn(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            text: text.into(),
        }
    }
}

/// Logs the build-start notice, one line per artifact and the verdict.
#[derive(Debug, Clone)]
pub struct SizeReporter {
    prefix: Option<String>,
    mode: Mode,
    chunk_limit_bytes: u64,
}

impl SizeReporter {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            prefix: config.logger.prefix.clone(),
            mode: config.mode,
            chunk_limit_bytes: config.chunk_size_warning_limit_kb.saturating_mul(1024),
        }
    }

    pub fn start_lines(&self) -> Vec<ReportLine> {
        vec![ReportLine::info(format!(
            "🔨 Widget {} build starting...",
            self.mode.as_str()
        ))]
    }

    pub fn bundle_lines(&self, report: &SizeReport) -> Vec<ReportLine> {
        let mut lines = vec![ReportLine::info(format!(
            "📦 Widget {} build:",
            self.mode.as_str()
        ))];

        for artifact in &report.per_artifact {
            let icon = match artifact.kind {
                ArtifactKind::Chunk => "🎯",
                ArtifactKind::Asset => "📄",
            };
            let gzip = artifact
                .gzip_bytes
                .map(|gzip| format!(" (gzip: {})", format_kb(gzip)))
                .unwrap_or_default();
            lines.push(ReportLine::info(format!(
                "   {icon} {}: {}{gzip}",
                artifact.name,
                format_kb(artifact.size_bytes)
            )));
        }

        lines.push(ReportLine::info(format!(
            "   📊 Total Widget Size: {}",
            format_kb(report.total_bytes)
        )));

        if let Some(chunk) = report.chunk() {
            if chunk.size_bytes > self.chunk_limit_bytes {
                lines.push(ReportLine::warn(format!(
                    "⚠️  {} is {}, above the {} chunk size warning limit",
                    chunk.name,
                    format_kb(chunk.size_bytes),
                    format_kb(self.chunk_limit_bytes)
                )));
            }
        }

        let classification = &report.classification;
        let message = classification
            .message
            .clone()
            .unwrap_or_else(|| format!("Widget bundle is {}", classification.name));
        lines.push(match (classification.severity, classification.limit_bytes) {
            (Severity::Warn, _) => ReportLine::warn(format!("⚠️  {message}")),
            (Severity::Info, Some(_)) => ReportLine::info(format!("✅ {message}")),
            (Severity::Info, None) => ReportLine::info(format!("🎉 {message}")),
        });
        lines
    }

    pub fn end_lines(&self) -> Vec<ReportLine> {
        vec![ReportLine::info(format!(
            "✅ Widget {} build completed!",
            self.mode.as_str()
        ))]
    }

    fn emit(&self, lines: Vec<ReportLine>) {
        for line in lines {
            let text = match &self.prefix {
                Some(prefix) => format!("[{prefix}] {}", line.text),
                None => line.text,
            };
            match line.severity {
                Severity::Info => tracing::info!(target: REPORT_TARGET, "{text}"),
                Severity::Warn => tracing::warn!(target: REPORT_TARGET, "{text}"),
            }
        }
    }
}

impl BuildObserver for SizeReporter {
    fn on_build_start(&mut self, _config: &BuildConfig) {
        self.emit(self.start_lines());
    }

    fn on_bundle_generated(&mut self, _artifacts: &ArtifactSet, report: &SizeReport) {
        self.emit(self.bundle_lines(report));
    }

    fn on_build_end(&mut self, _report: &SizeReport) {
        self.emit(self.end_lines());
    }

    fn on_build_failed(&mut self, state: BuildState, error: &BuildError) {
        let text = format!("❌ Widget build failed while {state}: {error}");
        match &self.prefix {
            Some(prefix) => tracing::error!(target: REPORT_TARGET, "[{prefix}] {text}"),
            None => tracing::error!(target: REPORT_TARGET, "{text}"),
        }
    }
}
