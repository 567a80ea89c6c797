use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::records::{AppId, Entry};
use crate::steam::FetchError;

/// The online search fallback capability. `Ok(None)` is "looked up, not
/// found"; `Err` is "lookup failed" — both leave the entry unresolved but
/// are logged differently.
#[async_trait]
pub trait IdSearch: Send + Sync {
    async fn search_id(&self, title: &str) -> Result<Option<AppId>, FetchError>;
}

/// Resolves `entry.id` in place. Returns whether the network was touched.
///
/// Catalog first, except that an ambiguous simplified key skips the
/// catalog whenever online resolution is allowed (the index would miss
/// anyway, and search can disambiguate). Ambiguous while offline stays
/// unresolved. A resolution miss is an expected outcome, never an error.
pub async fn resolve_id(
    entry: &mut Entry,
    catalog: Option<&Catalog>,
    search: Option<&dyn IdSearch>,
    online: bool,
) -> bool {
    if entry.id.is_some() {
        return false;
    }

    if let Some(catalog) = catalog
        && (!online || !catalog.contains_duplicate_name(&entry.simplified))
    {
        tracing::debug!(title = %entry.name, key = %entry.simplified, "catalog lookup");
        entry.id = catalog.id_for_name(&entry.simplified);
    }

    if entry.id.is_some() || !online {
        return false;
    }
    let Some(search) = search else {
        tracing::info!(title = %entry.name, "no search credentials; leaving id unresolved");
        return false;
    };

    tracing::info!(title = %entry.name, "not in catalog; trying online search");
    match search.search_id(&entry.name).await {
        Ok(Some(id)) => {
            tracing::info!(title = %entry.name, app_id = id, "search resolved id");
            entry.id = Some(id);
        }
        Ok(None) => tracing::warn!(title = %entry.name, "search found no results"),
        Err(err) => tracing::warn!(title = %entry.name, ?err, "search failed"),
    }

    true
}
