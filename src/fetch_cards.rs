use async_trait::async_trait;

use crate::records::{AppId, CardStatus, Entry};
use crate::steam::FetchError;

/// The per-app metadata capability. The production implementation queries
/// Steam's appdetails endpoint.
#[async_trait]
pub trait AppMetadata: Send + Sync {
    async fn has_trading_cards(&self, id: AppId) -> Result<bool, FetchError>;
}

/// Fills in `entry.cards`. Returns whether the network was touched.
///
/// Already-known status and missing ids are no-ops. A failed fetch leaves
/// the status unknown so a future run can retry; it still counts as a
/// network access because a request went out.
pub async fn fetch_card_info(entry: &mut Entry, metadata: &dyn AppMetadata) -> bool {
    if entry.cards.is_known() {
        tracing::debug!(title = %entry.name, "card status already known; skipping fetch");
        return false;
    }
    let Some(id) = entry.id else {
        tracing::debug!(title = %entry.name, "no app id; skipping card fetch");
        return false;
    };

    tracing::info!(app_id = id, title = %entry.name, "fetching card data");
    match metadata.has_trading_cards(id).await {
        Ok(true) => entry.cards = CardStatus::Yes,
        Ok(false) => entry.cards = CardStatus::No,
        Err(err) => {
            tracing::error!(app_id = id, title = %entry.name, ?err, "card info fetch failed");
        }
    }

    true
}
