//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL debate transcript; disabled when unset
    pub transcript: Option<PathBuf>,
    /// Diagnostic log file, written in addition to stderr
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::FileConfig;

    #[test]
    fn test_logging_deserialize() {
        let toml_str = r#"
[logging]
transcript = "debates/session.jsonl"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.logging.transcript.as_deref(),
            Some(std::path::Path::new("debates/session.jsonl"))
        );
        assert!(config.logging.file.is_none());
    }
}
