//! Environment credentials: the datastore URL and the LLM provider keys.
//!
//! Missing LLM credentials are a warning, not an error; nothing fails until
//! an LLM-backed feature is actually invoked.

use anyhow::{Context, Result};
use log::warn;
use std::env;
use std::io::Write;
use std::path::Path;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const LLM_PROVIDER_VAR: &str = "LLM_PROVIDER";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_DATABASE_URL: &str = "hyrox.db";

const ENV_TEMPLATE: &str = "\
# Hyrox training log credentials.
# DATABASE_URL points at the SQLite database file.
DATABASE_URL=hyrox.db

# LLM provider: \"ollama\" (local, default) or \"openai\".
LLM_PROVIDER=ollama

# Required only when LLM_PROVIDER=openai.
# OPENAI_API_KEY=sk-...
";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_provider: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var(DATABASE_URL_VAR)
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            llm_provider: env::var(LLM_PROVIDER_VAR).ok(),
            openai_api_key: env::var(OPENAI_API_KEY_VAR).ok(),
        }
    }

    /// Non-fatal credential check: logs what is missing and what that
    /// disables, and returns whether everything needed is present.
    pub fn warn_missing_credentials(&self) -> bool {
        let mut complete = true;
        match self.llm_provider.as_deref() {
            Some("openai") => {
                if self.openai_api_key.is_none() {
                    warn!(
                        "{} is set to openai but {} is missing; program import and coaching will fail",
                        LLM_PROVIDER_VAR, OPENAI_API_KEY_VAR
                    );
                    complete = false;
                }
            }
            Some(_) | None => {}
        }
        complete
    }
}

/// Write the credentials template to `path` unless a file already exists
/// there. Never overwrites. Returns whether anything was written.
pub fn write_env_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let mut file = std::fs::File::create_new(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(ENV_TEMPLATE.as_bytes())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_written_once_and_never_clobbered() {
        let dir = env::temp_dir().join(format!("hyrox-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");

        assert!(write_env_template(&path).unwrap());
        std::fs::write(&path, "DATABASE_URL=custom.db\n").unwrap();

        assert!(!write_env_template(&path).unwrap());
        let kept = std::fs::read_to_string(&path).unwrap();
        assert_eq!(kept, "DATABASE_URL=custom.db\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn openai_without_key_is_incomplete() {
        let config = Config {
            database_url: "hyrox.db".into(),
            llm_provider: Some("openai".into()),
            openai_api_key: None,
        };
        assert!(!config.warn_missing_credentials());

        let config = Config {
            llm_provider: Some("ollama".into()),
            ..config
        };
        assert!(config.warn_missing_credentials());
    }
}
