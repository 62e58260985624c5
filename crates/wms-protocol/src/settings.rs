//! GML output settings.
//!
//! Loaded from YAML and handed to output formats explicitly.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use wms_common::SrsNameStyle;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GmlSettings {
    /// Maximum number of decimals written for coordinates
    pub num_decimals: usize,

    /// Write a `gml:boundedBy` envelope computed from the features
    pub feature_bounding: bool,

    /// How EPSG codes are spelled in `srsName`
    pub srs_name_style: SrsNameStyle,

    /// Prefix used for feature type elements
    pub namespace_prefix: String,

    /// Namespace URI bound to `namespace_prefix`
    pub namespace_uri: String,

    /// Pretty-print output
    pub indent: bool,
}

impl Default for GmlSettings {
    fn default() -> Self {
        Self {
            num_decimals: 8,
            feature_bounding: true,
            srs_name_style: SrsNameStyle::Xml,
            namespace_prefix: "feature".to_string(),
            namespace_uri: "http://www.opengis.net/feature".to_string(),
            indent: true,
        }
    }
}

impl GmlSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            num_decimals = settings.num_decimals,
            "Loaded GML settings"
        );
        Ok(settings)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_yaml::Error),
}
