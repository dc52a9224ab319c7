//! CSV file sink: one append-only file per event under the date directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::{EventId, JobError, SampleRecord, SampleSink};
use crate::infra::catalog::date_dir;
use crate::util::stamp::OBSERVED_AT_FORMAT;

/// Header row written when a file is created.
pub const CSV_HEADER: &str = "name,value,observed_at";

/// Appends sample rows to `<data_dir>/<yyyymmdd>/<group>/race_<number>.csv`.
pub struct CsvSampleSink {
    root: PathBuf,
    file_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl CsvSampleSink {
    /// Sink writing under the directory of `date`.
    #[must_use]
    pub fn new(data_dir: &Path, date: NaiveDate) -> Self {
        Self {
            root: date_dir(data_dir, date),
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    /// File that holds the samples of `event`.
    #[must_use]
    pub fn path_for(&self, event: &EventId) -> PathBuf {
        self.root
            .join(&event.group)
            .join(format!("race_{}.csv", event.number))
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.file_locks.lock().entry(path.to_path_buf()).or_default())
    }
}

#[async_trait]
impl SampleSink for CsvSampleSink {
    async fn append_records(&self, event: &EventId, records: &[SampleRecord]) -> Result<(), JobError> {
        let path = self.path_for(event);
        let file_lock = self.lock_for(&path);
        let _guard = file_lock.lock().await;

        let sink_error = |e: std::io::Error| JobError::Sink(format!("{}: {e}", path.display()));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(sink_error)?;
        }
        let is_new = tokio::fs::metadata(&path).await.map_or(true, |m| m.len() == 0);

        let mut body = String::new();
        if is_new {
            body.push_str(CSV_HEADER);
            body.push('\n');
        }
        for record in records {
            body.push_str(&render_row(record));
            body.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(sink_error)?;
        file.write_all(body.as_bytes()).await.map_err(sink_error)?;
        file.flush().await.map_err(sink_error)?;

        debug!(event = %event, path = %path.display(), rows = records.len(), "rows appended");
        Ok(())
    }
}

fn render_row(record: &SampleRecord) -> String {
    format!(
        "{},{},{}",
        quote(&record.subject_name),
        quote(&record.value),
        record.observed_at.format(OBSERVED_AT_FORMAT)
    )
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
