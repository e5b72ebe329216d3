//! Test suite loader
//!
//! Load a suite definition from a YAML or JSON file.

use std::path::Path;

use super::TestSuite;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },

    #[error("JSON parse error in {file}: {error}")]
    Json {
        file: String,
        error: serde_json::Error,
    },
}

pub struct SuiteLoader;

impl SuiteLoader {
    /// `.json` files are read as JSON, anything else as YAML
    pub fn load_file(path: &Path) -> Result<TestSuite, LoadError> {
        let content = std::fs::read_to_string(path)?;
        let file = path.display().to_string();

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|error| LoadError::Json { file, error })
            }
            _ => serde_yaml::from_str(&content).map_err(|error| LoadError::Yaml { file, error }),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<TestSuite, LoadError> {
        serde_yaml::from_str(yaml).map_err(|error| LoadError::Yaml {
            file: "<inline>".to_string(),
            error,
        })
    }
}
