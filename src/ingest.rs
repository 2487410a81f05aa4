//! Row sources: CSV files on disk or published CSV links
//!
//! Every cell is handed on as a JSON string, empty cells included, so the
//! normalizers see the same shape whatever the origin.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{DataSource, DataSources};
use crate::models::RawRow;
use crate::state::{DashboardStore, RowKind};

/// Read headed CSV into raw rows, skipping records the parser rejects
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers().context("reading CSV header")?.clone();
    let mut rows = Vec::new();
    let mut error_count = 0;

    for (i, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let row: RawRow = headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| !h.is_empty())
                    .map(|(idx, h)| {
                        let cell = record.get(idx).unwrap_or("");
                        (h.to_string(), Value::String(cell.to_string()))
                    })
                    .collect();
                rows.push(row);
            }
            Err(e) => {
                if error_count < 5 {
                    warn!("Skipping unreadable CSV record {}: {}", i + 1, e);
                }
                error_count += 1;
            }
        }
    }

    if error_count > 0 {
        warn!("{} CSV records skipped", error_count);
    }
    Ok(rows)
}

pub fn load_csv_file(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = read_csv_rows(file).with_context(|| format!("parsing {}", path.display()))?;
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Fetch a sheet published to the web as CSV
pub async fn fetch_csv(url: &str) -> Result<Vec<RawRow>> {
    let body = reqwest::get(url)
        .await
        .with_context(|| format!("fetching {}", url))?
        .error_for_status()
        .with_context(|| format!("fetching {}", url))?
        .text()
        .await
        .with_context(|| format!("reading body of {}", url))?;
    let rows = read_csv_rows(body.as_bytes()).with_context(|| format!("parsing {}", url))?;
    info!("Fetched {} rows from {}", rows.len(), url);
    Ok(rows)
}

impl DataSource {
    pub async fn load(&self) -> Result<Vec<RawRow>> {
        match self {
            DataSource::File(path) => load_csv_file(path),
            DataSource::Url(url) => fetch_csv(url).await,
        }
    }
}

/// Load every configured source and replace its rows in the store
///
/// Sources are read before anything is written, so a failing source leaves
/// the store untouched.
pub async fn load_into_store(store: &DashboardStore, sources: &DataSources) -> Result<Vec<(RowKind, usize)>> {
    let mut loaded = Vec::new();
    for (kind, source) in sources.configured() {
        let rows = source.load().await.with_context(|| format!("loading {:?} rows", kind))?;
        loaded.push((kind, rows));
    }

    let counts = loaded.iter().map(|(kind, rows)| (*kind, rows.len())).collect();
    for (kind, rows) in loaded {
        store.set_rows(kind, rows);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_rows_as_strings() {
        let csv = "Truck, Hauling Fee ,Ship Date\n101,\"$1,200.00\",45239\n202,,\n";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Truck"], Value::String("101".into()));
        assert_eq!(rows[0]["Hauling Fee"], Value::String("$1,200.00".into()));
        assert_eq!(rows[1]["Ship Date"], Value::String(String::new()));
    }

    #[test]
    fn test_short_records_padded() {
        let csv = "Truck,Miles,Empty Miles\n101,250\n";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0]["Empty Miles"], Value::String(String::new()));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Unit,Item,Amount").unwrap();
        writeln!(file, "2024-03-01,101,ULSD,389.10").unwrap();
        let rows = load_csv_file(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Item"], Value::String("ULSD".into()));
    }

    #[tokio::test]
    async fn test_load_into_store() {
        let mut loads = tempfile::NamedTempFile::new().unwrap();
        writeln!(loads, "Truck,Drivers,Hauling Fee").unwrap();
        writeln!(loads, "101,Ann,900").unwrap();
        writeln!(loads, "202,Bo,600").unwrap();

        let store = DashboardStore::new();
        let sources = DataSources {
            loads: Some(DataSource::File(loads.path().to_path_buf())),
            ..Default::default()
        };
        let counts = load_into_store(&store, &sources).await.unwrap();
        assert_eq!(counts, vec![(RowKind::Loads, 2)]);
        assert_eq!(store.snapshot().data.loads_rows.len(), 2);
        assert!(store.snapshot().data.fuel_rows.is_empty());
    }

    #[tokio::test]
    async fn test_failed_source_leaves_store_untouched() {
        let mut loads = tempfile::NamedTempFile::new().unwrap();
        writeln!(loads, "Truck\n101").unwrap();

        let store = DashboardStore::new();
        let sources = DataSources {
            loads: Some(DataSource::File(loads.path().to_path_buf())),
            fuel: Some(DataSource::File("/nonexistent/fuel.csv".into())),
            ..Default::default()
        };
        assert!(load_into_store(&store, &sources).await.is_err());
        assert_eq!(store.snapshot().revision, 0);
    }

    #[test]
    fn test_missing_file_errors() {
        let err = load_csv_file(Path::new("/nonexistent/loads.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/loads.csv"));
    }
}
