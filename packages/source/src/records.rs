//! Record source: pulls the full incident table.
//!
//! The table is consumed once on a cache miss and never re-queried within
//! the process.

use std::io::Read;

use landslide_viewer_incident_models::{CellValue, RawRecord, RecordTable};

use crate::SourceError;
use crate::config::RecordSourceConfig;

/// Loads the record table described by `config`.
///
/// # Errors
///
/// Returns [`SourceError`] if the source cannot be read or parsed.
pub async fn load_records(
    config: &RecordSourceConfig,
    client: &reqwest::Client,
) -> Result<RecordTable, SourceError> {
    let table = match config {
        RecordSourceConfig::Csv { path, delimiter } => {
            log::info!("Reading records from CSV {}", path.display());
            let bytes = tokio::fs::read(path).await?;
            let delimiter = delimiter
                .as_deref()
                .and_then(|d| d.as_bytes().first().copied())
                .unwrap_or(b',');
            parse_csv(bytes.as_slice(), delimiter)?
        }
        RecordSourceConfig::Json { path } => {
            log::info!("Reading records from JSON {}", path.display());
            let text = tokio::fs::read_to_string(path).await?;
            parse_json(&text)?
        }
        RecordSourceConfig::JsonUrl { url, token_env } => {
            log::info!("Fetching records from {url}");
            let mut request = client.get(url);
            if let Some(var) = token_env {
                let token = std::env::var(var).map_err(|_| SourceError::Format {
                    message: format!("Environment variable {var} is not set"),
                })?;
                request = request.bearer_auth(token);
            }
            let resp = request.send().await?;
            if !resp.status().is_success() {
                return Err(SourceError::Format {
                    message: format!("Record request failed with status {}", resp.status()),
                });
            }
            let body = resp.text().await?;
            parse_json(&body)?
        }
    };

    log::info!(
        "Loaded {} records with {} columns",
        table.len(),
        table.columns.len()
    );

    Ok(table)
}

/// Parses a CSV document with a header row. Empty fields are missing.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if the CSV is malformed.
pub fn parse_csv(reader: impl Read, delimiter: u8) -> Result<RecordTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRecord = columns
            .iter()
            .zip(record.iter())
            .map(|(column, field)| (column.clone(), CellValue::from_csv_field(field)))
            .collect();
        rows.push(row);
    }

    Ok(RecordTable::new(columns, rows))
}

/// Parses a JSON array of row objects.
///
/// Columns are listed in order of first appearance.
///
/// # Errors
///
/// Returns [`SourceError`] if the text is not JSON or not an array of
/// objects.
pub fn parse_json(text: &str) -> Result<RecordTable, SourceError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Array(items) = json else {
        return Err(SourceError::Format {
            message: "Expected a JSON array of records".to_string(),
        });
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());

    for (i, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(object) = item else {
            return Err(SourceError::Format {
                message: format!("Record {i} is not a JSON object"),
            });
        };

        let mut row = RawRecord::new();
        for (key, value) in object {
            if !columns.contains(&key) {
                columns.push(key.clone());
            }
            row.insert(key, CellValue::from_json(value));
        }
        rows.push(row);
    }

    Ok(RecordTable::new(columns, rows))
}
