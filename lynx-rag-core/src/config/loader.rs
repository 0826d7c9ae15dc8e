//! Loading [`RagSettings`] from TOML or JSON.

use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

use super::RagSettings;
use crate::{RagError, Result};

impl RagSettings {
    /// Parse and validate settings from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a `.toml` or `.json` file.
    ///
    /// `${VAR}` and `${VAR:default}` references are replaced with the value
    /// of the environment variable before parsing.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading settings file: {}", path.display());

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RagError::configuration(format!(
                "Failed to read settings file {}: {e}",
                path.display()
            ))
        })?;
        let content = substitute_env_variables(&content)?;

        let settings = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            other => {
                return Err(RagError::configuration(format!(
                    "Unsupported settings file extension: {}",
                    other.unwrap_or("<none>")
                )));
            }
        };

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

fn substitute_env_variables(content: &str) -> Result<String> {
    let env_var = Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}")
        .map_err(|e| RagError::internal(format!("invalid env pattern: {e}")))?;

    let substituted = env_var.replace_all(content, |captures: &regex::Captures<'_>| {
        let default_value = captures.get(2).map_or("", |m| m.as_str());
        std::env::var(&captures[1]).unwrap_or_else(|_| default_value.to_string())
    });

    Ok(substituted.into_owned())
}
