use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::SearchConfig;
use crate::records::AppId;
use crate::resolve::IdSearch;
use crate::steam::FetchError;

const USER_AGENT: &str = "cardscan/0.1";

/// Custom-search client used as the fallback when a title is not in the
/// catalog (or is ambiguous there). One request per title; the raw,
/// unsimplified title is the query.
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: Url,
    key: String,
    cx: String,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(config: &SearchConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint).context("parse search endpoint")?,
            key: config.key.clone(),
            cx: config.cx.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl IdSearch for SearchClient {
    async fn search_id(&self, title: &str) -> Result<Option<AppId>, FetchError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", title)
            .append_pair("cx", &self.cx)
            .append_pair("key", &self.key)
            .append_pair("fields", "searchInformation(totalResults),items(title,link)");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await.map_err(FetchError::from_reqwest)?;
        Ok(top_result_id(&body))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "searchInformation", default)]
    search_information: Option<SearchInformation>,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchInformation {
    #[serde(rename = "totalResults")]
    total_results: String,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

fn top_result_id(response: &SearchResponse) -> Option<AppId> {
    let total = response
        .search_information
        .as_ref()
        .and_then(|info| info.total_results.parse::<u64>().ok())
        .unwrap_or(0);
    if total < 1 {
        return None;
    }

    let item = response.items.first()?;
    app_id_from_link(&item.link)
}

/// Extracts the app id from a store-page URL: the path segment right
/// after `/app/`.
pub fn app_id_from_link(link: &str) -> Option<AppId> {
    let (_, rest) = link.split_once("/app/")?;
    let id_segment = rest.split('/').next()?;
    id_segment.parse().ok()
}
