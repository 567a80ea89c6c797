use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;

use crate::cli::CatalogRefreshArgs;
use crate::normalize::simplified_name;
use crate::records::AppId;
use crate::steam::{FetchError, SteamClient};

/// Where the full (id, name) catalog comes from. The production
/// implementation is [`SteamClient`]; tests substitute stubs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<String, FetchError>;
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    applist: RawAppList,
}

#[derive(Debug, Deserialize)]
struct RawAppList {
    apps: RawApps,
}

#[derive(Debug, Deserialize)]
struct RawApps {
    app: Vec<RawApp>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    appid: AppId,
    name: String,
}

/// The reference catalog of all known apps, immutable once built.
///
/// The name index only contains simplified keys held by exactly one app.
/// Keys shared by several apps go to `duplicate_names` instead; resolving
/// those is deferred to the online search fallback.
pub struct Catalog {
    names_by_id: HashMap<AppId, String>,
    ids_by_name: HashMap<String, AppId>,
    duplicate_names: HashSet<String>,
}

impl Catalog {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let parsed: RawCatalog = serde_json::from_str(raw).context("parse app catalog json")?;
        Ok(Self::from_apps(parsed.applist.apps.app))
    }

    fn from_apps(apps: Vec<RawApp>) -> Self {
        let mut key_counts: HashMap<String, u32> = HashMap::with_capacity(apps.len());
        for app in &apps {
            *key_counts.entry(simplified_name(&app.name)).or_insert(0) += 1;
        }

        let mut names_by_id = HashMap::with_capacity(apps.len());
        let mut ids_by_name = HashMap::new();
        let mut duplicate_names = HashSet::new();
        for app in apps {
            let key = simplified_name(&app.name);
            if key_counts.get(&key).copied() == Some(1) {
                ids_by_name.insert(key, app.appid);
            } else {
                duplicate_names.insert(key);
            }
            names_by_id.insert(app.appid, app.name);
        }

        Self {
            names_by_id,
            ids_by_name,
            duplicate_names,
        }
    }

    pub fn id_for_name(&self, simplified: &str) -> Option<AppId> {
        self.ids_by_name.get(simplified).copied()
    }

    pub fn name_for_id(&self, id: AppId) -> Option<&str> {
        self.names_by_id.get(&id).map(String::as_str)
    }

    /// True when two or more catalog entries share this simplified key.
    pub fn contains_duplicate_name(&self, simplified: &str) -> bool {
        self.duplicate_names.contains(simplified)
    }

    pub fn len(&self) -> usize {
        self.names_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names_by_id.is_empty()
    }
}

/// Loads the catalog, once per run. The cache file holds the raw remote
/// response verbatim; it is only re-downloaded when `refresh` is set or
/// the file is missing, and the raw body is persisted before parsing so a
/// parse failure still leaves the bytes on disk for inspection.
pub async fn load(
    cache: &Path,
    refresh: bool,
    source: &dyn CatalogSource,
) -> anyhow::Result<Catalog> {
    let raw = if refresh || !cache.exists() {
        let raw = source.fetch_raw().await.context("fetch app catalog")?;
        if let Some(parent) = cache.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create catalog cache dir: {}", parent.display()))?;
        }
        std::fs::write(cache, &raw)
            .with_context(|| format!("write catalog cache: {}", cache.display()))?;
        tracing::info!(cache = %cache.display(), "app catalog downloaded");
        raw
    } else {
        tracing::debug!(cache = %cache.display(), "using cached app catalog");
        std::fs::read_to_string(cache)
            .with_context(|| format!("read catalog cache: {}", cache.display()))?
    };

    Catalog::parse(&raw)
}

pub async fn refresh(args: CatalogRefreshArgs) -> anyhow::Result<()> {
    let steam = SteamClient::new(
        &args.catalog_url,
        crate::steam::DEFAULT_DETAILS_URL,
        Duration::from_secs(10),
    )?;

    let catalog = load(Path::new(&args.cache), true, &steam).await?;
    tracing::info!(apps = catalog.len(), cache = %args.cache, "app catalog refreshed");

    Ok(())
}
