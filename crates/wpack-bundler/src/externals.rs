use indexmap::IndexMap;
use wpack_config::ExternalSpec;

/// Modules supplied by the host page, keyed by exact specifier.
#[derive(Debug, Clone, Default)]
pub struct ExternalRegistry {
    globals: IndexMap<String, String>,
}

impl ExternalRegistry {
    /// Build a registry from config, logging a warning for every duplicate.
    pub fn from_specs(specs: &[ExternalSpec]) -> Self {
        let mut registry = Self::default();
        for spec in specs {
            if let Some(previous) = registry.register(&spec.module_id, &spec.global_name) {
                tracing::warn!(
                    module = %spec.module_id,
                    previous = %previous,
                    global = %spec.global_name,
                    "external registered twice, last registration wins"
                );
            }
        }
        registry
    }

    /// Register `module_id`, returning the global it previously mapped to.
    pub fn register(&mut self, module_id: &str, global_name: &str) -> Option<String> {
        self.globals
            .insert(module_id.to_string(), global_name.to_string())
    }

    pub fn is_external(&self, module_id: &str) -> bool {
        self.globals.contains_key(module_id)
    }

    pub fn global_name_for(&self, module_id: &str) -> Option<&str> {
        self.globals.get(module_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}
