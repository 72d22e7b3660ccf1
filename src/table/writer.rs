//! CSV writers for enriched records

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use tracing::{info, instrument};

use crate::pipeline::{format_timestamp, EnrichmentRecord};
use crate::table::{TableError, OUTPUT_COLUMNS, URL_COLUMN};

fn create(path: &Path) -> Result<Writer<File>, TableError> {
    WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| TableError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Passthrough headers across all records in first-seen order, minus
/// names already used by an output column
fn passthrough_headers(records: &[EnrichmentRecord]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for (header, _) in &record.passthrough {
            if !OUTPUT_COLUMNS.contains(&header.as_str()) && !headers.contains(header) {
                headers.push(header.clone());
            }
        }
    }
    headers
}

fn row(record: &EnrichmentRecord, passthrough: &[String]) -> Result<Vec<String>, TableError> {
    let mut row = vec![
        record.website_url.clone(),
        record.platform.clone(),
        record.industry.clone(),
        record.tags.clone(),
        serde_json::to_string(&record.platforms)?,
        serde_json::to_string(&record.industries)?,
        serde_json::to_string(&record.colors)?,
        record.tag_confidence_json()?,
        format_timestamp(&record.last_enriched_at),
    ];

    row.extend(passthrough.iter().map(|header| {
        record
            .passthrough
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }));
    Ok(row)
}

/// Write enriched records to a CSV file
///
/// # Arguments
///
/// * `path` - Output file, created or truncated
/// * `records` - Records in output order
#[instrument(skip_all, fields(path = %path.as_ref().display(), records = records.len()))]
pub fn write_records(
    path: impl AsRef<Path>,
    records: &[EnrichmentRecord],
) -> Result<(), TableError> {
    let path = path.as_ref();
    let passthrough = passthrough_headers(records);
    let mut writer = create(path)?;

    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };

    let headers: Vec<&str> = OUTPUT_COLUMNS
        .iter()
        .copied()
        .chain(passthrough.iter().map(String::as_str))
        .collect();
    writer.write_record(&headers).map_err(write_err)?;

    for record in records {
        writer.write_record(row(record, &passthrough)?).map_err(write_err)?;
    }
    writer.flush()?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write a single-column `website_url` CSV usable as enrichment input
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_url_list(path: impl AsRef<Path>, urls: &[String]) -> Result<(), TableError> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };

    writer.write_record([URL_COLUMN]).map_err(write_err)?;
    for url in urls {
        writer.write_record([url.as_str()]).map_err(write_err)?;
    }
    writer.flush()?;

    info!("Wrote {} URLs to {}", urls.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::classifier::{ColorPair, ScoredLabel};
    use crate::table::{read_enriched_rows, read_source_rows};

    fn record() -> EnrichmentRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let mut record = EnrichmentRecord::empty(
            "https://acme.test/",
            vec![
                ("name".to_string(), "Acme, Inc.".to_string()),
                ("platform".to_string(), "old value".to_string()),
                ("city".to_string(), "Berlin".to_string()),
            ],
            at,
        );
        record.platforms = vec![ScoredLabel::new("WordPress", 0.25).unwrap()];
        record.platform = "WordPress".to_string();
        record.tag_confidence = vec![
            ScoredLabel::new("zebra", 1.0).unwrap(),
            ScoredLabel::new("apple", 0.85).unwrap(),
        ];
        record.tags = "zebra, apple".to_string();
        record.colors = ColorPair {
            primary: Some("#0070f3".to_string()),
            secondary: None,
        };
        record
    }

    #[test]
    fn test_write_records_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[record()]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec![
                "website_url",
                "platform",
                "industry",
                "tags",
                "platforms",
                "industries",
                "colors",
                "tag_confidence",
                "last_enriched_at",
                "name",
                "city"
            ]
        );

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "WordPress");
        assert_eq!(&row[4], r#"[{"name":"WordPress","confidence":0.25}]"#);
        assert_eq!(&row[5], "[]");
        assert_eq!(&row[6], r##"{"primary":"#0070f3","secondary":null}"##);
        assert_eq!(&row[7], r#"{"zebra":1.0,"apple":0.85}"#);
        assert_eq!(&row[8], "2024-05-01T08:30:00Z");
        assert_eq!(&row[9], "Acme, Inc.");
        assert_eq!(&row[10], "Berlin");
    }

    #[test]
    fn test_output_reads_back_as_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[record()]).unwrap();

        let rows = read_source_rows(&path).unwrap();
        assert_eq!(rows[0].website_url, "https://acme.test/");
        let name = rows[0].passthrough.iter().find(|(h, _)| h == "name").unwrap();
        assert_eq!(name.1, "Acme, Inc.");

        let enriched = read_enriched_rows(&path).unwrap();
        assert_eq!(enriched[0].last_enriched_at, Some(record().last_enriched_at));
    }

    #[test]
    fn test_empty_records_write_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("website_url,platform,"));
    }

    #[test]
    fn test_write_url_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stale.csv");
        write_url_list(&path, &["https://a.test/".to_string(), "https://b.test/".to_string()])
            .unwrap();

        let rows = read_source_rows(&path).unwrap();
        let urls: Vec<_> = rows.iter().map(|r| r.website_url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/", "https://b.test/"]);
    }
}
