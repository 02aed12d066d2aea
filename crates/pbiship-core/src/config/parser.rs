//! Manifest parser with helpful error messages

use super::schema::DeploymentsFile;
use anyhow::{Context, Result};
use std::path::Path;

/// Manifest encodings, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    /// `.toml` is TOML, everything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Load and validate a manifest file
pub fn load_manifest(path: &Path) -> Result<DeploymentsFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    parse_manifest_str(&content, ManifestFormat::from_path(path))
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Parse manifest content from a string
pub fn parse_manifest_str(content: &str, format: ManifestFormat) -> Result<DeploymentsFile> {
    let manifest: DeploymentsFile = match format {
        ManifestFormat::Json => {
            serde_json::from_str(content).map_err(|e| enhance_json_error(e, content))?
        }
        ManifestFormat::Toml => toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?,
    };

    manifest.validate()?;

    Ok(manifest)
}

fn enhance_json_error(error: serde_json::Error, content: &str) -> anyhow::Error {
    if error.line() == 0 {
        return anyhow::anyhow!("JSON parsing error: {}", error);
    }
    anyhow::anyhow!(
        "JSON parsing error at line {}:\n{}\n\nError: {}",
        error.line(),
        get_line_context(content, error.line()),
        error
    )
}

/// Enhance TOML parsing errors with helpful context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.to_string();

    let line_hint = error
        .span()
        .map(|span| content[..span.start.min(content.len())].lines().count().max(1));

    if let Some(line_num) = line_hint {
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
