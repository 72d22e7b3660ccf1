//! CSV-to-CSV enrichment job

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::classifier::RuleSet;
use crate::error::Result;
use crate::fetcher::{FetcherConfig, HttpFetcher};
use crate::pipeline::{EnrichConfig, Enricher, RowOutcome, RowProgress, RunSummary};
use crate::table::{read_source_rows, write_records, SourceRow};

/// Enriches every row of an input CSV into an output CSV over HTTP
#[derive(Debug, Clone)]
pub struct EnrichJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rules: RuleSet,
    pub fetcher: FetcherConfig,
    pub enrich: EnrichConfig,
}

impl EnrichJob {
    /// Create a job with the built-in rules and default settings
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            rules: RuleSet::builtin(),
            fetcher: FetcherConfig::default(),
            enrich: EnrichConfig::default(),
        }
    }

    /// Read the input rows
    pub fn load(&self) -> Result<Vec<SourceRow>> {
        Ok(read_source_rows(&self.input)?)
    }

    /// Enrich `rows` and write the output file
    ///
    /// Row-level failures are contained in the output. Errors are returned
    /// only for unusable configuration or when the output cannot be written.
    #[instrument(skip_all, fields(output = %self.output.display()))]
    pub async fn run(
        &self,
        rows: Vec<SourceRow>,
        progress: Option<mpsc::Sender<RowProgress>>,
    ) -> Result<RunSummary> {
        let fetcher = HttpFetcher::new(&self.fetcher)?;
        let enricher = Arc::new(Enricher::new(fetcher, &self.rules, &self.enrich)?);

        let (outcomes, summary) = enricher.enrich_all(rows, progress).await;
        let records: Vec<_> = outcomes.into_iter().map(RowOutcome::into_record).collect();
        write_records(&self.output, &records)?;

        info!("{}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use mockito::Server;
    use tempfile::tempdir;

    use crate::error::Error;
    use crate::table::read_enriched_rows;

    #[tokio::test]
    async fn test_job_end_to_end() {
        let mut server = Server::new_async().await;
        let page = server
            .mock("GET", "/shop")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><head><title>Store</title>
                <link rel="stylesheet" href="https://cdn.shopify.com/s/files/theme.css">
                </head><body><div class="shopify-section"><p>Shop our store. Add to cart and checkout.</p></div></body></html>"#,
            )
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let input = dir.path().join("sites.csv");
        let output = dir.path().join("enriched.csv");
        let mut file = std::fs::File::create(&input).unwrap();
        writeln!(file, "website_url,name").unwrap();
        writeln!(file, "{}/shop,Store", server.url()).unwrap();
        writeln!(file, "{}/gone,Gone", server.url()).unwrap();
        writeln!(file, ",Blank").unwrap();
        drop(file);

        let job = EnrichJob::new(&input, &output);
        let rows = job.load().unwrap();
        assert_eq!(rows.len(), 2);

        let summary = job.run(rows, None).await.unwrap();
        page.assert_async().await;
        missing.assert_async().await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.fetch_failures, 1);

        let mut reader = csv::Reader::from_path(&output).unwrap();
        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert!(records[0][1].contains("Shopify"));
        assert!(records[0][2].contains("E-commerce"));
        assert_eq!(&records[0][9], "Store");
        assert_eq!(&records[1][1], "");
        assert_eq!(&records[1][9], "Gone");

        let enriched = read_enriched_rows(&output).unwrap();
        assert!(enriched.iter().all(|row| row.last_enriched_at == Some(summary.enriched_at)));
    }

    #[test]
    fn test_missing_input_column_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sites.csv");
        std::fs::write(&input, "url\nexample.com\n").unwrap();

        let job = EnrichJob::new(&input, dir.path().join("out.csv"));
        assert!(matches!(job.load(), Err(Error::Input(_))));
    }
}
