//! Event catalog stored on disk, one directory per event group:
//!
//! ```text
//! <data_dir>/<yyyymmdd>/<group>/times.json        {"1": "202203041000", ...}
//! <data_dir>/<yyyymmdd>/<group>/odds_params.json  {"1": "pw151ou...", ...}   (optional)
//! ```

use std::collections::BTreeMap;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::core::{ConfigError, Event, EventId};
use crate::util::stamp::{format_date, parse_minute_stamp};

/// File holding sequence number -> start stamp for one group.
pub const TIMES_FILE: &str = "times.json";

/// Optional file holding sequence number -> source reference for one group.
pub const PARAMS_FILE: &str = "odds_params.json";

/// Directory holding every group of `date`.
#[must_use]
pub fn date_dir(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(format_date(date))
}

/// Load every event scheduled under `<data_dir>/<date>`.
///
/// Groups are visited in name order and events within a group in numeric
/// order. Group directories without a times file are skipped.
///
/// # Errors
///
/// Returns [`ConfigError::Catalog`] when the date directory or one of its
/// files cannot be read or parsed, and [`ConfigError::InvalidStartTime`] for
/// a malformed stamp.
pub fn load_events(data_dir: &Path, date: NaiveDate) -> Result<Vec<Event>, ConfigError> {
    let root = date_dir(data_dir, date);
    let mut groups: Vec<(String, PathBuf)> = fs::read_dir(&root)
        .map_err(|e| catalog_error(&root, &e))?
        .filter_map(|entry| readable_entry(&root, entry))
        .filter(|entry| entry.path().is_dir())
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect();
    groups.sort();

    let mut events = Vec::new();
    for (group, dir) in groups {
        let times_path = dir.join(TIMES_FILE);
        if !times_path.is_file() {
            warn!(group = %group, path = %times_path.display(), "group has no times file; skipped");
            continue;
        }
        let loaded = load_group(&group, &dir, date)?;
        debug!(group = %group, events = loaded.len(), "group loaded");
        events.extend(loaded);
    }

    info!(date = %format_date(date), events = events.len(), "event catalog loaded");
    Ok(events)
}

/// Entry of the date directory, or `None` (with a warning) when it cannot be
/// read. A skipped entry means a group that will not be sampled.
fn readable_entry(root: &Path, entry: io::Result<DirEntry>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(path = %root.display(), error = %e, "unreadable catalog entry; group skipped");
            None
        }
    }
}

/// Load one group directory.
///
/// # Errors
///
/// See [`load_events`].
pub fn load_group(group: &str, dir: &Path, date: NaiveDate) -> Result<Vec<Event>, ConfigError> {
    let times_path = dir.join(TIMES_FILE);
    let times = read_string_map(&times_path)?;

    let params_path = dir.join(PARAMS_FILE);
    let params = if params_path.is_file() {
        read_string_map(&params_path)?
    } else {
        BTreeMap::new()
    };

    let mut events = parse_times(group, &times)?;
    for event in &mut events {
        if let Some(source_ref) = params.get(&event.id.number) {
            event.source_ref = Some(source_ref.clone());
        }
        if event.start_time.date() != date {
            warn!(
                event = %event.id,
                start_time = %event.start_time,
                date = %format_date(date),
                "event start is outside the target date; scheduling anyway"
            );
        }
    }
    Ok(events)
}

/// Parse the body of a times file.
///
/// # Errors
///
/// Returns [`ConfigError::Catalog`] for JSON that is not an object of strings.
pub fn parse_times_json(group: &str, body: &str) -> Result<Vec<Event>, ConfigError> {
    let times: BTreeMap<String, String> =
        serde_json::from_str(body).map_err(|e| ConfigError::Catalog {
            path: PathBuf::from(group).join(TIMES_FILE),
            reason: e.to_string(),
        })?;
    parse_times(group, &times)
}

fn parse_times(group: &str, times: &BTreeMap<String, String>) -> Result<Vec<Event>, ConfigError> {
    let mut events = times
        .iter()
        .map(|(number, stamp)| {
            parse_minute_stamp(stamp).map(|start| Event::new(EventId::new(group, number.as_str()), start))
        })
        .collect::<Result<Vec<_>, _>>()?;
    events.sort_by(|a, b| sequence_key(&a.id.number).cmp(&sequence_key(&b.id.number)));
    Ok(events)
}

fn sequence_key(number: &str) -> (u32, &str) {
    (number.parse().unwrap_or(u32::MAX), number)
}

fn read_string_map(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let body = fs::read_to_string(path).map_err(|e| catalog_error(path, &e))?;
    serde_json::from_str(&body).map_err(|e| catalog_error(path, &e))
}

fn catalog_error(path: &Path, err: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::Catalog {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
