use std::env;

use anyhow::Result;
use herd_storage::Store;

pub const DEFAULT_API_KEY: &str = "dev-herdcare-key";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub seed_directory: bool,
    pub api_key: String,
    pub bind: String,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            seed_directory: true,
            api_key: DEFAULT_API_KEY.to_string(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            database_url: lookup("HERDCARE_DATABASE_URL")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            seed_directory: lookup("HERDCARE_SEED_DIRECTORY")
                .and_then(|value| parse_flag(&value))
                .unwrap_or(defaults.seed_directory),
            api_key: lookup("HERDCARE_API_KEY")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.api_key),
            bind: lookup("HERDCARE_BIND").unwrap_or(defaults.bind),
        }
    }

    pub async fn open_store(&self) -> Result<Store> {
        match self.database_url.as_deref() {
            Some(database_url) => Store::sqlite(database_url).await,
            None => Ok(Store::memory()),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
