//! Bridges client work to TUI actions.
//!
//! Background tasks never touch app state directly: everything they learn
//! comes back through the action channel. This module holds the log-stream
//! forwarder, the history image fetcher, and the shared result-to-action
//! mapping that turns an expired session into [`Action::SessionExpired`]
//! no matter which request tripped over it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use esplens_api::{Client, Error, LogEvent};

use crate::action::{Action, EntryImages};

/// Map a client result onto the action channel.
///
/// Auth failures short-circuit to [`Action::SessionExpired`] instead of the
/// wrapped action; every surface handles session loss the same way.
pub fn send_result<T>(
    action_tx: &UnboundedSender<Action>,
    result: Result<T, Error>,
    wrap: impl FnOnce(Result<T, String>) -> Action,
) {
    let action = match result {
        Ok(value) => wrap(Ok(value)),
        Err(e) if e.is_auth_required() => Action::SessionExpired,
        Err(e) => wrap(Err(e.to_string())),
    };
    let _ = action_tx.send(action);
}

/// Forward one live log stream as actions until it ends or is cancelled.
///
/// A call covers exactly one connection: when the stream reports closure
/// the task sends [`Action::LogsClosed`] and returns. Opening a fresh
/// stream is always an explicit decision upstream.
pub async fn run_log_stream(
    client: Arc<Client>,
    action_tx: UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut channel = match client.log_channel(cancel) {
        Ok(channel) => channel,
        Err(e) => {
            warn!(error = %e, "could not open log stream");
            let _ = action_tx.send(Action::LogsClosed(Some(e.to_string())));
            return;
        }
    };

    while let Some(event) = channel.recv().await {
        match event {
            LogEvent::Connected => {
                let _ = action_tx.send(Action::LogsConnected);
            }
            LogEvent::Line {
                received_at,
                message,
            } => {
                let _ = action_tx.send(Action::LogLine {
                    at: received_at,
                    message,
                });
            }
            LogEvent::Closed { reason } => {
                let _ = action_tx.send(Action::LogsClosed(reason));
                break;
            }
        }
    }
    debug!("log stream bridge shut down");
}

/// Download a history entry's before/after pair into the image cache and
/// report the outcome as [`Action::EntryImagesLoaded`].
///
/// Both downloads ride the authenticated session. File names derive from
/// the entry id, so re-viewing an entry overwrites its own files and
/// nothing else.
pub async fn fetch_entry_images(
    client: Arc<Client>,
    cache_dir: PathBuf,
    id: Uuid,
    image1: String,
    image2: String,
    action_tx: UnboundedSender<Action>,
) {
    debug!(%id, "fetching history images");
    let (first, second) = tokio::join!(client.fetch_image(&image1), client.fetch_image(&image2));
    let (before_bytes, after_bytes) = match (first, second) {
        (Ok(before), Ok(after)) => (before, after),
        (Err(e), _) | (_, Err(e)) => {
            send_result(&action_tx, Err::<EntryImages, _>(e), |result| {
                Action::EntryImagesLoaded { id, result }
            });
            return;
        }
    };

    let result = write_pair(&cache_dir, id, (&image1, before_bytes), (&image2, after_bytes))
        .await
        .map_err(|e| format!("could not cache images: {e}"));
    let _ = action_tx.send(Action::EntryImagesLoaded { id, result });
}

async fn write_pair(
    cache_dir: &Path,
    id: Uuid,
    before: (&str, Bytes),
    after: (&str, Bytes),
) -> std::io::Result<EntryImages> {
    tokio::fs::create_dir_all(cache_dir).await?;
    let before_path = write_image(cache_dir, id, "before", before.0, &before.1).await?;
    let after_path = write_image(cache_dir, id, "after", after.0, &after.1).await?;
    Ok(EntryImages {
        before: before_path,
        after: after_path,
    })
}

async fn write_image(
    cache_dir: &Path,
    id: Uuid,
    side: &str,
    source_url: &str,
    bytes: &Bytes,
) -> std::io::Result<PathBuf> {
    let mut short = id.simple().to_string();
    short.truncate(8);
    let path = cache_dir.join(format!("{short}-{side}.{}", extension_of(source_url)));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Extension from the source URL's final path segment, defaulting to jpg.
/// Query strings (signed storage URLs) are stripped first.
fn extension_of(source_url: &str) -> &str {
    let path = source_url.split(['?', '#']).next().unwrap_or(source_url);
    match path.rsplit('.').next() {
        Some(ext) if !ext.contains('/') && !ext.is_empty() && ext.len() <= 4 => ext,
        _ => "jpg",
    }
}
