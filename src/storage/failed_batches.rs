use crate::crawler::EventRecord;
use crate::delivery::{deliver, BatchSink, DeliveryOutcome, DeliveryPolicy};
use crate::storage::{PersistError, PersistResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of one failed batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedBatchRecord {
    pub location: String,
    pub sub_category: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Vec<EventRecord>,
}

/// A failed batch together with the file it was read from
#[derive(Debug, Clone)]
pub struct FailedBatchFile {
    pub path: PathBuf,
    pub record: FailedBatchRecord,
}

/// Counts from one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub delivered_batches: usize,
    pub delivered_events: usize,
    pub failed_batches: usize,
}

/// File name for a batch: `{millis}_{location}_{sub}.json`, whitespace replaced by `_`
pub fn batch_file_name(timestamp: DateTime<Utc>, location: &str, sub_category: &str) -> String {
    let name = format!(
        "{}_{}_{}.json",
        timestamp.timestamp_millis(),
        location,
        sub_category
    );
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Writes a failed batch to `dir`, creating the directory if needed
pub async fn write_failed_batch(
    dir: &Path,
    location: &str,
    sub_category: &str,
    batch: &[EventRecord],
) -> PersistResult<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let record = FailedBatchRecord {
        location: location.to_string(),
        sub_category: sub_category.to_string(),
        timestamp: Utc::now(),
        payload: batch.to_vec(),
    };

    let path = dir.join(batch_file_name(record.timestamp, location, sub_category));
    let json = serde_json::to_string_pretty(&record)?;

    tokio::fs::write(&path, json)
        .await
        .map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

/// Best-effort variant of [`write_failed_batch`]
///
/// Errors are logged and swallowed; the crawl goes on either way.
pub async fn persist_failed_batch(
    dir: &Path,
    location: &str,
    sub_category: &str,
    batch: &[EventRecord],
) -> Option<PathBuf> {
    match write_failed_batch(dir, location, sub_category, batch).await {
        Ok(path) => {
            tracing::warn!(
                "Persisted failed batch of {} events to {}",
                batch.len(),
                path.display()
            );
            Some(path)
        }
        Err(e) => {
            tracing::error!(
                "Could not persist failed batch for {} / {}: {}",
                location,
                sub_category,
                e
            );
            None
        }
    }
}

/// Reads every failed batch in `dir`, sorted by file name (oldest first)
///
/// A missing directory holds no batches. Files that are not valid batch
/// records are skipped with a warning.
pub async fn load_failed_batches(dir: &Path) -> PersistResult<Vec<FailedBatchFile>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(PersistError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| PersistError::Read {
            path: dir.to_path_buf(),
            source,
        })?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| PersistError::Read {
                path: path.clone(),
                source,
            })?;

        match serde_json::from_str::<FailedBatchRecord>(&content) {
            Ok(record) => files.push(FailedBatchFile { path, record }),
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(files)
}

/// Redelivers every persisted batch, removing each file once the sink accepted it
pub async fn replay_failed_batches(
    dir: &Path,
    sink: &dyn BatchSink,
    policy: &DeliveryPolicy,
) -> PersistResult<ReplaySummary> {
    let files = load_failed_batches(dir).await?;
    tracing::info!("Replaying {} failed batches from {}", files.len(), dir.display());

    let mut summary = ReplaySummary::default();
    for file in files {
        match deliver(sink, &file.record.payload, policy).await {
            DeliveryOutcome::Delivered { count } => {
                summary.delivered_batches += 1;
                summary.delivered_events += count;
                if let Err(e) = tokio::fs::remove_file(&file.path).await {
                    tracing::warn!("Delivered but could not remove {}: {}", file.path.display(), e);
                }
            }
            DeliveryOutcome::Failed { last_error, .. } => {
                summary.failed_batches += 1;
                tracing::error!(
                    "Replay of {} / {} failed: {}",
                    file.record.location,
                    file.record.sub_category,
                    last_error
                );
            }
        }
    }

    Ok(summary)
}
