//! Export serialization.
//!
//! Turns aggregated records into one YAML, JSON or CSV file. JSON and YAML
//! keep the full nested structure; CSV flattens it (see [`csv`]).

mod csv;
mod naming;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ExportFormat, FieldProjection};
use crate::error::{ExportError, ExportResult};
use crate::record::TaskRecord;

pub use naming::{slugify, ExportTarget, FILE_PREFIX};

/// JSON indentation.
const JSON_INDENT: &[u8] = b"    ";

/// Failure while encoding rows into an output format.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Underlying write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Convert records to JSON objects and apply the projection.
///
/// [`FieldProjection::BasicOnly`] keeps the basic fields that are present,
/// in a fixed order; absent fields are omitted rather than null-filled.
///
/// # Errors
/// Returns error if a record cannot be represented as JSON.
pub fn project(
    records: &[TaskRecord],
    projection: FieldProjection,
) -> Result<Vec<Map<String, Value>>, EncodeError> {
    records
        .iter()
        .map(|record| {
            let full = record.to_object()?;
            Ok(match projection {
                FieldProjection::Full => full,
                FieldProjection::BasicOnly => basic_fields(full),
            })
        })
        .collect()
}

fn basic_fields(mut full: Map<String, Value>) -> Map<String, Value> {
    FieldProjection::BASIC_FIELDS
        .iter()
        .filter_map(|field| full.remove(*field).map(|v| ((*field).to_string(), v)))
        .collect()
}

/// Encode `rows` in `format` into `writer`.
///
/// # Errors
/// Returns error if encoding or writing fails.
pub fn write_rows<W: Write>(
    rows: &[Map<String, Value>],
    format: ExportFormat,
    mut writer: W,
) -> Result<(), EncodeError> {
    match format {
        ExportFormat::Json => {
            let formatter = PrettyFormatter::with_indent(JSON_INDENT);
            let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
            rows.serialize(&mut ser)?;
            writer.write_all(b"\n")?;
        }
        ExportFormat::Yaml => serde_yaml::to_writer(&mut writer, rows)?,
        ExportFormat::Csv => csv::write_rows(rows, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Write one export file into `dir` and return its path.
///
/// # Errors
/// Returns [`ExportError::Serialization`] naming the file if projection,
/// encoding or any write fails.
pub fn write_export(
    records: &[TaskRecord],
    format: ExportFormat,
    projection: FieldProjection,
    dir: &Path,
    target: &ExportTarget,
) -> ExportResult<PathBuf> {
    let path = dir.join(target.file_name(format));
    let fail = |source: EncodeError| ExportError::Serialization {
        path: path.clone(),
        source,
    };

    let rows = project(records, projection).map_err(fail)?;
    debug!(path = %path.display(), rows = rows.len(), %format, "Writing export");

    // `path` only ever holds a complete export.
    let tmp_path = partial_path(&path);
    let written = File::create(&tmp_path)
        .map_err(EncodeError::from)
        .and_then(|file| write_rows(&rows, format, BufWriter::new(file)))
        .and_then(|()| fs::rename(&tmp_path, &path).map_err(EncodeError::from));

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove partial export");
            }
        }
        return Err(fail(e));
    }

    info!(path = %path.display(), tasks = rows.len(), "Tasks exported");
    Ok(path)
}

/// `<path>.tmp`, where an export is encoded before being moved into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
