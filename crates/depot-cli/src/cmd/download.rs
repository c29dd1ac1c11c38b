//! Download command

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use depot_core::CatalogError;
use depot_schema::{Release, ReleaseId, Resolution, Selection};
use tokio_util::sync::CancellationToken;

use super::Session;
use super::resolve::describe;
use crate::ui::list::print_done;
use crate::ui::theme::format_size;

/// What to download.
#[derive(Debug, Clone)]
pub enum Target {
    /// A release id given directly.
    Release(ReleaseId),
    /// Whatever the selection narrows the application down to.
    Resolve { app: String, selection: Selection },
}

async fn pick(session: &Session, target: Target) -> Result<Release> {
    match target {
        Target::Release(id) => Ok(session.service.get_release(&session.caller, id).await?),
        Target::Resolve { app, selection } => {
            let app = session.application(&app).await?;
            let resolution = session
                .service
                .resolve(&session.caller, app.id, &selection)
                .await?;
            match resolution {
                Resolution::Resolved(release) => Ok(release),
                other => bail!(
                    "{}: {}",
                    app.name,
                    describe(&other).unwrap_or_default()
                ),
            }
        }
    }
}

/// Stream a release to disk. Ctrl-C stops the transfer and removes the partial file.
pub async fn download(session: &Session, target: Target, out: Option<PathBuf>) -> Result<()> {
    let release = pick(session, target).await?;
    let out = out.unwrap_or_else(|| PathBuf::from(session.service.offered_file_name(&release)));

    let mut file = tokio::fs::File::create(&out)
        .await
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = session
        .service
        .download_to(&session.caller, release.id, &mut file, &cancel)
        .await;
    watcher.abort();
    drop(file);

    match result {
        Ok((release, copied)) => {
            print_done(&format!(
                "Downloaded {} {} {}",
                release.key(),
                "→".dark_grey(),
                out.display()
            ));
            println!("    {}", format_size(copied).dark_grey());
            Ok(())
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&out).await {
                tracing::warn!(path = %out.display(), error = %rm, "Failed to remove partial download");
            }
            if matches!(e, CatalogError::Cancelled) {
                println!();
                println!("  {}", "Download cancelled.".yellow());
            }
            Err(e.into())
        }
    }
}
