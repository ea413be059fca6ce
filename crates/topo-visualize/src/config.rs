//! Visualizer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::VisualizeError;

/// Programs and artifacts used by the visualization pipeline.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualizeConfig {
    pub folder: FolderConfig,
    pub converter: ConverterConfig,
    pub renderer: RendererConfig,
    /// Where the (optionally collapsed) graph text is written.
    pub graph_output: PathBuf,
}

impl Default for VisualizeConfig {
    fn default() -> Self {
        Self {
            folder: FolderConfig::default(),
            converter: ConverterConfig::default(),
            renderer: RendererConfig::default(),
            graph_output: PathBuf::from("graph_output.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolderConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            program: "RNAfold".to_string(),
            args: vec!["--noPS".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub program: String,
    /// Arguments placed before the structure file path.
    pub args: Vec<String>,
    /// Layout engine passed through `-T`.
    pub layout_engine: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["examples/rnaConvert.py".to_string()],
            layout_engine: "neato".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub program: String,
    /// Image format passed through `-T`.
    pub format: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "neato".to_string(),
            format: "png".to_string(),
        }
    }
}

impl VisualizeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, VisualizeError> {
        toml::from_str(source).map_err(|source| VisualizeError::Config {
            origin: "<inline>".to_string(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisualizeError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| VisualizeError::Io {
            context: format!("failed to read config {}", path.display()),
            source,
        })?;
        toml::from_str(&source).map_err(|source| VisualizeError::Config {
            origin: path.display().to_string(),
            source,
        })
    }
}
