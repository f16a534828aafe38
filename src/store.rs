use crate::error::StoreError;
use crate::models::{ListingRecord, ResultSet};
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Listings present in the previous run's file but not in this run
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedListings {
    /// When the previous file was last written, if the filesystem knows
    pub previous_run: Option<DateTime<Local>>,
    /// Key → value as stored by the previous run
    pub entries: Map<String, Value>,
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub path: PathBuf,
    pub result_set: ResultSet,
    /// Only set when a diff was requested and a previous file existed
    pub removed: Option<RemovedListings>,
}

/// Build the result set for `query_id`, optionally diff it against the file
/// at `path`, then overwrite that file.
pub async fn merge<I>(
    path: &Path,
    records: I,
    query_id: &str,
    emit_diff: bool,
) -> Result<MergeOutcome, StoreError>
where
    I: IntoIterator<Item = ListingRecord>,
{
    let mut result_set = ResultSet::new(query_id);
    result_set.extend(records);

    let current = serde_json::to_value(&result_set)?
        .as_object()
        .cloned()
        .unwrap_or_default();

    let removed = if emit_diff {
        load_previous(path)
            .await?
            .map(|(previous, previous_run)| RemovedListings {
                previous_run,
                entries: removed_entries(&previous, &current),
            })
    } else {
        None
    };

    let json = serde_json::to_string_pretty(&result_set)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    info!("💾 Saved {} listings to {}", result_set.len(), path.display());

    Ok(MergeOutcome {
        path: path.to_path_buf(),
        result_set,
        removed,
    })
}

/// Entries of `previous` whose keys are absent from `current`.
pub fn removed_entries(
    previous: &Map<String, Value>,
    current: &Map<String, Value>,
) -> Map<String, Value> {
    previous
        .iter()
        .filter(|(key, _)| !current.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Read a previous result file. A missing file is `None`; anything that
/// isn't a JSON object is an error.
async fn load_previous(
    path: &Path,
) -> Result<Option<(Map<String, Value>, Option<DateTime<Local>>)>, StoreError> {
    let read_error = |source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No previous results at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(read_error(e)),
    };

    let previous_run = tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Local>::from);

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(Some((map, previous_run))),
        Ok(_) => Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
