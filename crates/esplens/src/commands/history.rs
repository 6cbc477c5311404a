//! Analysis history commands: list entries, download image pairs.

use std::path::{Path, PathBuf};

use esplens_api::{AnalysisEntry, Client};
use tabled::Tabled;

use crate::cli::{GlobalOpts, HistoryArgs, HistoryCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "MODEL")]
    model: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

fn entry_row(entry: &AnalysisEntry) -> EntryRow {
    EntryRow {
        id: short_id(entry),
        created: util::format_timestamp(&entry.created_at),
        model: entry.model_used.clone(),
        description: entry
            .description
            .as_deref()
            .map_or_else(|| "(pending)".to_string(), truncate),
    }
}

fn short_id(entry: &AnalysisEntry) -> String {
    entry.id.to_string().chars().take(8).collect()
}

fn truncate(text: &str) -> String {
    const MAX: usize = 72;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX - 1).collect();
        format!("{head}…")
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn handle(client: &Client, args: HistoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        HistoryCommand::List { limit } => list(client, limit, global).await,
        HistoryCommand::Images { id, dir } => images(client, &id, dir, global).await,
    }
}

async fn list(client: &Client, limit: usize, global: &GlobalOpts) -> Result<(), CliError> {
    // The server returns entries newest first.
    let mut entries = client.analysis_history().await?;
    entries.truncate(limit);
    let out = output::render_list(&global.output, &entries, entry_row, |e| e.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn images(
    client: &Client,
    id: &str,
    dir: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entries = client.analysis_history().await?;
    let entry = find_entry(&entries, id)?;

    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;

    let short = short_id(entry);
    for (label, url) in [("before", &entry.image1), ("after", &entry.image2)] {
        let bytes = client.fetch_image(url).await?;
        let path = dir.join(format!("{short}-{label}.{}", extension_of(url)));
        std::fs::write(&path, &bytes)?;
        if !global.quiet {
            eprintln!("✓ Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Match an entry by full ID or unique ID prefix.
fn find_entry<'a>(entries: &'a [AnalysisEntry], id: &str) -> Result<&'a AnalysisEntry, CliError> {
    let needle = id.to_lowercase();
    let matches: Vec<&AnalysisEntry> = entries
        .iter()
        .filter(|e| e.id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [entry] => Ok(entry),
        [] => Err(CliError::NotFound {
            resource_type: "history entry",
            identifier: id.to_string(),
            list_command: "history list",
        }),
        ambiguous => Err(CliError::InvalidValue {
            field: "id",
            reason: format!("'{id}' matches {} entries; give more characters", ambiguous.len()),
        }),
    }
}

fn extension_of(url: &str) -> &str {
    Path::new(url)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpg")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;

    fn entry(id: &str) -> AnalysisEntry {
        AnalysisEntry {
            id: id.parse().unwrap(),
            image1: "/media/captures/a.jpg".to_string(),
            image2: "/media/captures/b.jpg".to_string(),
            model_used: "gpt-4o-mini".to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_prefix_match_requires_uniqueness() {
        let entries = vec![
            entry("aaaa1111-0000-0000-0000-000000000000"),
            entry("aaaa2222-0000-0000-0000-000000000000"),
        ];

        assert!(find_entry(&entries, "aaaa1111").is_ok());
        assert!(matches!(
            find_entry(&entries, "aaaa"),
            Err(CliError::InvalidValue { .. })
        ));
        assert!(matches!(
            find_entry(&entries, "bbbb"),
            Err(CliError::NotFound { .. })
        ));
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(extension_of("/media/captures/a.png"), "png");
        assert_eq!(extension_of("/media/captures/noext"), "jpg");
    }
}
