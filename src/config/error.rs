use thiserror::Error;

/// Every missing or malformed setting found while building a
/// [`crate::PipelineConfig`], reported together.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid configuration:\n  - {}", .problems.join("\n  - "))]
pub struct ConfigError {
    pub problems: Vec<String>,
}

#[cfg(test)]
impl ConfigError {
    /// Whether any recorded problem contains `key`.
    pub(crate) fn mentions(&self, key: &str) -> bool {
        self.problems.iter().any(|p| p.contains(key))
    }
}
