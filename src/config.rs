use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Knobs for reading one mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Lines starting with this are comments, unless they are section markers
    pub comment_marker: String,
    /// Lines starting with this outside sections are header directives
    pub directive_prefix: String,
    /// Cell separator for data rows
    pub delimiter: char,
    pub default_source_tradition: String,
    pub default_target_tradition: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comment_marker: "#".to_string(),
            directive_prefix: "@".to_string(),
            delimiter: '\t',
            default_source_tradition: "unspecified".to_string(),
            default_target_tradition: "standard".to_string(),
        }
    }
}

impl ParseOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
