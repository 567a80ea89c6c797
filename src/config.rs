use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The value shipped in the sample settings file. It means "no key
/// configured", never a literal credential.
const PLACEHOLDER_KEY: &str = "123";

/// Search provider settings: an API key plus the search-scope identifier
/// (`cx` in Google Custom Search terms).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub key: String,
    pub cx: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_SEARCH_ENDPOINT.to_owned()
}

/// Loads the settings file. `Ok(None)` means the file parsed but search is
/// disabled because the key is missing or still the placeholder.
pub fn load(path: &Path) -> anyhow::Result<Option<SearchConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file: {}", path.display()))?;
    let config: SearchConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parse settings file: {}", path.display()))?;

    if config.key.trim().is_empty() || config.key == PLACEHOLDER_KEY {
        tracing::warn!("no search API key configured; online search is disabled");
        return Ok(None);
    }

    Ok(Some(config))
}
