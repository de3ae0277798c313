//! Client configuration loaded from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
const CREDENTIAL_FILE_NAME: &str = ".todo-credential.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub credential_file: PathBuf,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// `TODO_API_URL`, `TODO_CREDENTIAL_FILE` and `LOG_FORMAT` are read; the
    /// credential file defaults to `$HOME/.todo-credential.json`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let credential_file = lookup("TODO_CREDENTIAL_FILE")
            .map(PathBuf::from)
            .or_else(|| {
                lookup("HOME")
                    .or_else(|| lookup("USERPROFILE"))
                    .map(|home| PathBuf::from(home).join(CREDENTIAL_FILE_NAME))
            })
            .unwrap_or_else(|| PathBuf::from(CREDENTIAL_FILE_NAME));

        Self {
            api_url: lookup("TODO_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            credential_file,
            json_logs: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, api_url: Option<String>, credential_file: Option<PathBuf>) -> Self {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        if let Some(credential_file) = credential_file {
            self.credential_file = credential_file;
        }
        self
    }
}
