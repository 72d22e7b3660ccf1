//! CSV readers for source and previously enriched tables

use std::fs::File;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use tracing::{debug, instrument, warn};

use crate::pipeline::parse_timestamp;
use crate::table::{EnrichedRow, SourceRow, TableError, ENRICHED_AT_COLUMN, URL_COLUMN};

fn open(path: &Path) -> Result<Reader<File>, TableError> {
    ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Trimmed headers, with a leading byte order mark removed
fn read_headers(reader: &mut Reader<File>, path: &Path) -> Result<Vec<String>, TableError> {
    let headers = reader.headers().map_err(|source| TableError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let header = if i == 0 {
                header.trim_start_matches('\u{feff}')
            } else {
                header
            };
            header.trim().to_string()
        })
        .collect())
}

fn column(headers: &[String], name: &'static str, path: &Path) -> Result<usize, TableError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| TableError::MissingColumn {
            column: name,
            path: path.to_path_buf(),
        })
}

fn records(
    reader: &mut Reader<File>,
    path: &Path,
) -> impl Iterator<Item = Result<StringRecord, TableError>> {
    let path = path.to_path_buf();
    reader.records().map(move |record| {
        record.map_err(|source| TableError::Read {
            path: path.clone(),
            source,
        })
    })
}

/// Read the rows to enrich
///
/// # Arguments
///
/// * `path` - CSV file with a `website_url` header
///
/// # Returns
///
/// One `SourceRow` per row with a non-blank URL. Blank URL rows are skipped
/// with a warning. A missing `website_url` column is an error.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_source_rows(path: impl AsRef<Path>) -> Result<Vec<SourceRow>, TableError> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let headers = read_headers(&mut reader, path)?;
    let url_index = column(&headers, URL_COLUMN, path)?;

    let mut rows = Vec::new();
    for (line, record) in records(&mut reader, path).enumerate() {
        let record = record?;
        let url = record.get(url_index).unwrap_or_default();
        if url.trim().is_empty() {
            warn!("Skipping row {} with blank {}", line + 2, URL_COLUMN);
            continue;
        }

        let passthrough = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != url_index)
            .map(|(i, header)| {
                (
                    header.clone(),
                    record.get(i).unwrap_or_default().to_string(),
                )
            })
            .collect();

        rows.push(SourceRow {
            website_url: url.to_string(),
            passthrough,
        });
    }

    debug!("Read {} source rows", rows.len());
    Ok(rows)
}

/// Read URLs and enrichment timestamps from a previous run's output
///
/// A missing `last_enriched_at` column or an unparseable cell yields
/// `None` for the affected rows.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_enriched_rows(path: impl AsRef<Path>) -> Result<Vec<EnrichedRow>, TableError> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let headers = read_headers(&mut reader, path)?;
    let url_index = column(&headers, URL_COLUMN, path)?;
    let at_index = headers.iter().position(|header| header == ENRICHED_AT_COLUMN);
    if at_index.is_none() {
        warn!("{} has no {} column", path.display(), ENRICHED_AT_COLUMN);
    }

    let mut rows = Vec::new();
    for record in records(&mut reader, path) {
        let record = record?;
        let url = record.get(url_index).unwrap_or_default().trim();
        if url.is_empty() {
            continue;
        }

        rows.push(EnrichedRow {
            website_url: url.to_string(),
            last_enriched_at: at_index
                .and_then(|i| record.get(i))
                .and_then(parse_timestamp),
        });
    }

    debug!("Read {} enriched rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_source_rows() {
        let file = csv_file("name, website_url ,city\nAcme,acme.test,Berlin\nBlank,  ,Paris\nShort,short.test\n");
        let rows = read_source_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].website_url, "acme.test");
        assert_eq!(
            rows[0].passthrough,
            vec![
                ("name".to_string(), "Acme".to_string()),
                ("city".to_string(), "Berlin".to_string())
            ]
        );
        assert_eq!(rows[1].passthrough[1], ("city".to_string(), String::new()));
    }

    #[test]
    fn test_missing_url_column() {
        let file = csv_file("name,url\nAcme,acme.test\n");
        let result = read_source_rows(file.path());
        assert!(matches!(
            result,
            Err(TableError::MissingColumn { column: "website_url", .. })
        ));
    }

    #[test]
    fn test_byte_order_mark() {
        let file = csv_file("\u{feff}website_url\nacme.test\n");
        let rows = read_source_rows(file.path()).unwrap();
        assert_eq!(rows, vec![SourceRow::new("acme.test")]);
    }

    #[test]
    fn test_missing_file() {
        let result = read_source_rows("/nonexistent/sites.csv");
        assert!(matches!(result, Err(TableError::Read { .. })));
    }

    #[test]
    fn test_read_enriched_rows() {
        let file = csv_file(
            "website_url,last_enriched_at\nhttps://a.test/,2024-05-01T08:30:00Z\nhttps://b.test/,\nhttps://c.test/,garbage\n",
        );
        let rows = read_enriched_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].last_enriched_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(rows[1].last_enriched_at, None);
        assert_eq!(rows[2].last_enriched_at, None);
    }

    #[test]
    fn test_read_enriched_rows_without_timestamp_column() {
        let file = csv_file("website_url\nhttps://a.test/\n");
        let rows = read_enriched_rows(file.path()).unwrap();
        assert_eq!(rows[0].last_enriched_at, None);
    }
}
