use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;

use crate::cli::ScanArgs;
use crate::config;
use crate::fetch_cards;
use crate::pace::Delayer;
use crate::records;
use crate::resolve::{self, IdSearch};
use crate::search::SearchClient;
use crate::steam::SteamClient;
use crate::store::{Console, CsvFile, Exporter};

/// Drives the whole pipeline over one input list.
///
/// The list is preloaded before the output is opened, so re-running with
/// the previous output as both input and output is safe. Cancellation is
/// cooperative: the token is checked once per entry, after any in-flight
/// request finished and before the row is written.
pub async fn run(args: ScanArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let input_path = PathBuf::from(&args.input);
    let out_path = PathBuf::from(&args.out);

    let entries = records::read_entries(&input_path).context("read input list")?;
    tracing::info!(count = entries.len(), input = %input_path.display(), "loaded input list");

    let search_config = match args.config.as_deref() {
        Some(path) => config::load(Path::new(path)).context("load search settings")?,
        None => None,
    };

    let steam = SteamClient::new(
        &args.catalog_url,
        &args.details_url,
        Duration::from_secs(args.details_timeout_secs),
    )
    .context("build steam client")?;

    let catalog = match crate::catalog::load(Path::new(&args.cache), args.refresh_catalog, &steam)
        .await
    {
        Ok(catalog) => {
            tracing::info!(apps = catalog.len(), "app catalog ready");
            Some(catalog)
        }
        Err(err) if args.allow_missing_catalog => {
            tracing::warn!(?err, "catalog unavailable; continuing without offline resolution");
            None
        }
        Err(err) => {
            return Err(err.context(
                "load app catalog (pass --allow-missing-catalog to continue without it)",
            ));
        }
    };

    let search = match (&search_config, args.offline) {
        (Some(cfg), false) => Some(
            SearchClient::new(cfg, Duration::from_secs(args.search_timeout_secs))
                .context("build search client")?,
        ),
        _ => None,
    };
    // Mirrors the original behavior: online resolution is only "allowed"
    // when credentials actually exist.
    let online = !args.offline && search.is_some();
    let search_ref = search.as_ref().map(|client| client as &dyn IdSearch);

    let overwriting_input = is_same_file(&input_path, &out_path);
    let mut exporter = Exporter::new();
    exporter.push(Box::new(
        CsvFile::create(&out_path, args.force || overwriting_input).context("open output")?,
    ));
    if args.echo {
        exporter.push(Box::new(Console::new()));
    }

    let mut delayer = Delayer::new(
        args.rest_every,
        Duration::from_millis(args.delay_ms),
        Duration::from_millis(args.rest_ms),
    );

    for mut entry in entries {
        tracing::info!(title = %entry.name, "processing");

        let mut accessed =
            resolve::resolve_id(&mut entry, catalog.as_ref(), search_ref, online).await;
        if entry.id.is_none() {
            tracing::error!(title = %entry.name, "could not resolve app id");
        } else {
            // The fetch must run even when resolution already went online,
            // so no short-circuit on `accessed`.
            accessed = fetch_cards::fetch_card_info(&mut entry, &steam).await || accessed;
            if !entry.cards.is_known() {
                tracing::error!(title = %entry.name, "could not determine card status");
            }
        }

        if cancel.is_cancelled() {
            tracing::warn!("scan cancelled; skipping remaining entries");
            return Ok(());
        }
        exporter.write(&entry);

        if accessed {
            delayer.tick().await;
        }
    }

    exporter.flush();
    tracing::info!(out = %out_path.display(), "scan finished");
    Ok(())
}

fn is_same_file(input: &Path, out: &Path) -> bool {
    match (std::fs::canonicalize(input), std::fs::canonicalize(out)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
