use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    cardscan::logging::init().context("init logging")?;

    let cli = cardscan::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        cardscan::cli::Command::Scan(args) => {
            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received; stopping after the current entry");
                    signal_cancel.cancel();
                }
            });

            cardscan::scan::run(args, cancel).await.context("scan")?;
        }
        cardscan::cli::Command::Catalog {
            command: cardscan::cli::CatalogCommand::Refresh(args),
        } => {
            cardscan::catalog::refresh(args)
                .await
                .context("catalog refresh")?;
        }
    }

    Ok(())
}
