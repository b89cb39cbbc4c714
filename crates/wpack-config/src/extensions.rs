//! Recognized file extensions per module role.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Extension tables used by the resolver.
///
/// `resolve` is the probe order for extension-less specifiers. The four role
/// sets must be pairwise disjoint; a file matching none of them is an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSets {
    pub resolve: Vec<String>,
    pub script: Vec<String>,
    pub template: Vec<String>,
    pub style: Vec<String>,
    pub data: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ExtensionSets {
    fn default() -> Self {
        Self {
            resolve: owned(&[".ts", ".js", ".json"]),
            script: owned(&[".ts", ".js"]),
            template: owned(&[".tbhtml", ".html"]),
            style: owned(&[".css", ".scss", ".sass"]),
            data: owned(&[".json"]),
        }
    }
}

impl ExtensionSets {
    fn roles(&self) -> [(&'static str, &[String]); 4] {
        [
            ("script", &self.script),
            ("template", &self.template),
            ("style", &self.style),
            ("data", &self.data),
        ]
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let all = self
            .roles()
            .into_iter()
            .flat_map(|(role, exts)| exts.iter().map(move |ext| (role, ext)))
            .chain(self.resolve.iter().map(|ext| ("resolve", ext)));

        for (role, ext) in all {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::invalid(
                    format!("extensions.{role}"),
                    format!("'{ext}' must start with a dot, e.g. '.js'"),
                ));
            }
        }

        let roles = self.roles();
        for (i, (first, exts)) in roles.iter().enumerate() {
            for (second, others) in &roles[i + 1..] {
                if let Some(ext) = exts.iter().find(|ext| others.contains(ext)) {
                    return Err(ConfigError::OverlappingExtension {
                        extension: ext.clone(),
                        first,
                        second,
                    });
                }
            }
        }
        Ok(())
    }
}
