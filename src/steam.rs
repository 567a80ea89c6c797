use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::catalog::CatalogSource;
use crate::fetch_cards::AppMetadata;
use crate::records::AppId;

pub const DEFAULT_CATALOG_URL: &str =
    "https://api.steampowered.com/ISteamApps/GetAppList/v0001/";
pub const DEFAULT_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails/";

/// Steam's category tag for "Steam Trading Cards".
pub const TRADING_CARDS_CATEGORY: u32 = 29;

const USER_AGENT: &str = "cardscan/0.1";

// The full app list weighs several megabytes; give it more room than a
// single appdetails call.
const CATALOG_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure modes of one remote call. Per-entry callers log these and leave
/// the entry unknown; only catalog loading escalates them.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("unexpected response shape: {0}")]
    Parse(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// Client for the two Steam capabilities: the full app catalog and
/// per-app metadata.
pub struct SteamClient {
    client: reqwest::Client,
    catalog_url: Url,
    details_url: Url,
    details_timeout: Duration,
}

impl SteamClient {
    pub fn new(
        catalog_url: &str,
        details_url: &str,
        details_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            catalog_url: Url::parse(catalog_url).context("parse catalog url")?,
            details_url: Url::parse(details_url).context("parse appdetails url")?,
            details_timeout,
        })
    }
}

#[async_trait]
impl CatalogSource for SteamClient {
    async fn fetch_raw(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.catalog_url.clone())
            .timeout(CATALOG_TIMEOUT)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }
}

#[async_trait]
impl AppMetadata for SteamClient {
    async fn has_trading_cards(&self, id: AppId) -> Result<bool, FetchError> {
        let mut url = self.details_url.clone();
        url.query_pairs_mut().append_pair("appids", &id.to_string());

        let response = self
            .client
            .get(url)
            .timeout(self.details_timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await.map_err(FetchError::from_reqwest)?;
        cards_from_details(&body, id)
    }
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    success: bool,
    data: Option<AppDetails>,
}

#[derive(Debug, Deserialize)]
struct AppDetails {
    #[serde(default)]
    categories: Vec<CategoryTag>,
}

#[derive(Debug, Deserialize)]
struct CategoryTag {
    id: u32,
}

/// The appdetails response is keyed by the requested id; inside, a
/// `success` flag and the category tag list. Absence of the trading-cards
/// tag on a successful response is a definitive "no".
fn cards_from_details(body: &serde_json::Value, id: AppId) -> Result<bool, FetchError> {
    let envelope = body
        .get(id.to_string())
        .ok_or_else(|| FetchError::Parse(format!("missing `{id}` key in appdetails response")))?;
    let envelope: DetailsEnvelope = serde_json::from_value(envelope.clone())
        .map_err(|err| FetchError::Parse(err.to_string()))?;

    if !envelope.success {
        return Err(FetchError::Parse(format!(
            "appdetails reported success=false for {id}"
        )));
    }
    let data = envelope
        .data
        .ok_or_else(|| FetchError::Parse(format!("appdetails has no data for {id}")))?;

    Ok(data
        .categories
        .iter()
        .any(|tag| tag.id == TRADING_CARDS_CATEGORY))
}
