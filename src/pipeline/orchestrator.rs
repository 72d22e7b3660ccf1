//! Row orchestration for the enrichment pipeline

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SubsecRound, Utc};
use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, instrument, warn};

use crate::classifier::{
    join_names, ClassificationError, ColorExtractor, ColorPair, KeywordClassifier, RuleSet,
    ScoredLabel, SignatureMatcher, TagExtractor,
};
use crate::extractor::{ContentExtractor, ExtractedContent};
use crate::fetcher::Fetcher;
use crate::pipeline::{EnrichConfig, EnrichmentRecord, RowOutcome, RowProgress, RunSummary, Warning};
use crate::table::{normalize_url, SourceRow};

/// Everything computed from one page
#[derive(Debug, Default)]
struct Analysis {
    platforms: Vec<ScoredLabel>,
    industries: Vec<ScoredLabel>,
    tags: Vec<ScoredLabel>,
    colors: ColorPair,
}

/// Runs the fetch, extract and classify steps for source rows
#[derive(Debug)]
pub struct Enricher<F> {
    fetcher: F,
    content: ContentExtractor,
    platforms: SignatureMatcher,
    industries: KeywordClassifier,
    tags: TagExtractor,
    colors: ColorExtractor,
    concurrency: usize,
}

/// Log a failed extractor and fall back to its empty output
fn contain<T: Default>(
    extractor: &'static str,
    result: Result<T, ClassificationError>,
    warnings: &mut Vec<Warning>,
) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} extractor failed: {}", extractor, e);
        warnings.push(Warning::Classification {
            extractor,
            message: e.to_string(),
        });
        T::default()
    })
}

impl<F> Enricher<F>
where
    F: Fetcher + Send + Sync + 'static,
{
    /// Build an enricher from a rule set
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Where pages come from
    /// * `rules` - Platform, industry and stopword tables
    /// * `config` - Run tunables
    ///
    /// # Returns
    ///
    /// An error when the rule set or the tunables cannot be compiled
    pub fn new(fetcher: F, rules: &RuleSet, config: &EnrichConfig) -> Result<Self, ClassificationError> {
        rules.validate()?;

        Ok(Self {
            fetcher,
            content: ContentExtractor::new(&config.extractor),
            platforms: SignatureMatcher::new(&rules.platforms)?,
            industries: KeywordClassifier::new(
                &rules.industries,
                config.industry_threshold,
                config.max_industries,
            )?,
            tags: TagExtractor::new(&rules.stopwords, config.tags.clone())?,
            colors: ColorExtractor::new(config.max_style_bytes),
            concurrency: config.concurrency.max(1),
        })
    }

    /// Run every extractor over one page
    ///
    /// Parsing stays inside this synchronous step so no document is held
    /// across an await point.
    fn analyze(&self, html: &str, warnings: &mut Vec<Warning>) -> Analysis {
        if html.trim().is_empty() {
            return Analysis::default();
        }

        let content = match self.content.extract(html) {
            Ok(content) => content,
            Err(e) => {
                warn!("Content extraction failed: {}", e);
                warnings.push(Warning::Parse(e.to_string()));
                ExtractedContent::default()
            }
        };
        let text = content.signal_text();

        Analysis {
            platforms: contain("platforms", self.platforms.detect(html), warnings),
            industries: contain("industries", self.industries.classify(&text), warnings),
            tags: contain("tags", self.tags.extract(&text), warnings),
            colors: self.colors.extract(&content),
        }
    }

    /// Enrich a single row
    ///
    /// Never fails: fetch, parse and classifier errors become warnings on a
    /// degraded outcome with the affected fields left empty.
    #[instrument(skip_all, fields(url = %row.website_url))]
    pub async fn enrich_row(&self, row: &SourceRow, enriched_at: DateTime<Utc>) -> RowOutcome {
        let mut warnings = Vec::new();

        let (website_url, html) = match normalize_url(&row.website_url) {
            Ok(url) => {
                let html = match self.fetcher.fetch(&url).await {
                    Ok(document) if document.has_content() => {
                        debug!("Fetched {} bytes at {}", document.html.len(), document.fetched_at);
                        document.html
                    }
                    Ok(document) => {
                        debug!("Empty page fetched at {}", document.fetched_at);
                        String::new()
                    }
                    Err(e) => {
                        warn!("Failed to fetch {}: {}", url, e);
                        warnings.push(Warning::Fetch {
                            status: e.status(),
                            message: e.to_string(),
                        });
                        String::new()
                    }
                };
                (url.to_string(), html)
            }
            Err(e) => {
                warn!("Skipping fetch for '{}': {}", row.website_url, e);
                warnings.push(Warning::Fetch {
                    status: e.status(),
                    message: e.to_string(),
                });
                (row.website_url.trim().to_string(), String::new())
            }
        };

        let analysis = self.analyze(&html, &mut warnings);

        let record = EnrichmentRecord {
            website_url,
            platform: join_names(&analysis.platforms),
            industry: join_names(&analysis.industries),
            tags: join_names(&analysis.tags),
            platforms: analysis.platforms,
            industries: analysis.industries,
            colors: analysis.colors,
            tag_confidence: analysis.tags,
            last_enriched_at: enriched_at,
            passthrough: row.passthrough.clone(),
        };

        debug!(
            "Enriched with {} platforms, {} industries, {} tags",
            record.platforms.len(),
            record.industries.len(),
            record.tag_confidence.len()
        );
        RowOutcome::new(record, warnings)
    }

    /// Enrich every row, preserving input order
    ///
    /// # Arguments
    ///
    /// * `rows` - The source rows
    /// * `progress` - Optional channel receiving one event per finished row
    ///
    /// # Returns
    ///
    /// One outcome per input row, in input order, and the run summary
    #[instrument(skip_all, fields(rows = rows.len(), concurrency = self.concurrency))]
    pub async fn enrich_all(
        self: Arc<Self>,
        rows: Vec<SourceRow>,
        progress: Option<mpsc::Sender<RowProgress>>,
    ) -> (Vec<RowOutcome>, RunSummary) {
        let started = Instant::now();
        let enriched_at = Utc::now().trunc_subsecs(0);
        info!("Enriching {} rows with {} workers", rows.len(), self.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let handles: Vec<_> = rows
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, row)| {
                let enricher = Arc::clone(&self);
                let semaphore = Arc::clone(&semaphore);
                let progress = progress.clone();

                tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    let outcome = enricher.enrich_row(&row, enriched_at).await;

                    if let Some(tx) = progress {
                        let event = RowProgress {
                            index,
                            url: outcome.record().website_url.clone(),
                            degraded: outcome.is_degraded(),
                        };
                        if tx.send(event).await.is_err() {
                            debug!("Progress receiver dropped");
                        }
                    }
                    outcome
                })
            })
            .collect();

        let results = join_all(handles).await;

        let mut outcomes = Vec::with_capacity(rows.len());
        for (index, (row, result)) in rows.into_iter().zip(results).enumerate() {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Row {} ({}) task failed: {}", index, row.website_url, e);
                    let outcome = RowOutcome::new(
                        EnrichmentRecord::empty(row.website_url.trim(), row.passthrough, enriched_at),
                        vec![Warning::Classification {
                            extractor: "row task",
                            message: e.to_string(),
                        }],
                    );
                    if let Some(tx) = &progress {
                        let event = RowProgress {
                            index,
                            url: outcome.record().website_url.clone(),
                            degraded: true,
                        };
                        if tx.send(event).await.is_err() {
                            debug!("Progress receiver dropped");
                        }
                    }
                    outcome
                }
            };
            outcomes.push(outcome);
        }

        let summary = RunSummary::from_outcomes(&outcomes, enriched_at, started.elapsed());
        info!("Enrichment finished: {}", summary);
        (outcomes, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use url::Url;

    use crate::classifier::rules::{IndustryRule, PlatformRule, Signature, WeightedKeyword};
    use crate::classifier::TagOptions;
    use crate::fetcher::{FetchError, FetchedDocument};

    const SAAS_PAGE: &str = r##"<html><head>
        <title>Acme Billing</title>
        <meta name="generator" content="WordPress 6.2">
        <meta name="description" content="We offer a cloud-based SaaS platform for subscription billing">
        <meta name="theme-color" content="#0070f3">
        </head><body><p>Subscription billing in the cloud. Billing made easy.</p></body></html>"##;

    #[derive(Debug, Clone)]
    enum Page {
        Html(&'static str),
        Timeout,
        Status(u16),
        Panic,
    }

    /// Serves canned pages keyed by URL
    #[derive(Debug, Default)]
    struct StaticFetcher {
        pages: HashMap<String, Page>,
    }

    impl StaticFetcher {
        fn with(mut self, url: &str, page: Page) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }
    }

    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
            match self.pages.get(url.as_str()) {
                Some(Page::Html(html)) => Ok(FetchedDocument::success(url.as_str(), *html)),
                Some(Page::Timeout) => Err(FetchError::Timeout),
                Some(Page::Status(code)) => Err(FetchError::Status(*code)),
                Some(Page::Panic) => panic!("fetcher exploded"),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn fixture_rules() -> RuleSet {
        RuleSet {
            platforms: vec![PlatformRule {
                name: "WordPress".to_string(),
                signatures: vec![
                    Signature::Generator("WordPress".to_string()),
                    Signature::Substring("/wp-content/".to_string()),
                ],
            }],
            industries: vec![IndustryRule {
                name: "SaaS".to_string(),
                keywords: ["SaaS", "subscription", "cloud"]
                    .iter()
                    .map(|term| WeightedKeyword {
                        term: term.to_string(),
                        weight: 1.0,
                    })
                    .collect(),
            }],
            stopwords: vec!["the".to_string(), "for".to_string()],
        }
    }

    fn row(url: &str) -> SourceRow {
        SourceRow {
            website_url: url.to_string(),
            passthrough: vec![("name".to_string(), format!("row {}", url))],
        }
    }

    fn enricher(fetcher: StaticFetcher, concurrency: usize) -> Arc<Enricher<StaticFetcher>> {
        let config = EnrichConfig::builder().concurrency(concurrency).build();
        Arc::new(Enricher::new(fetcher, &fixture_rules(), &config).unwrap())
    }

    #[tokio::test]
    async fn test_enrich_row_merges_all_extractors() {
        let fetcher = StaticFetcher::default().with("https://acme.test/", Page::Html(SAAS_PAGE));
        let enricher = enricher(fetcher, 1);

        let outcome = enricher.enrich_row(&row("acme.test"), Utc::now()).await;
        assert!(!outcome.is_degraded());

        let record = outcome.record();
        assert_eq!(record.website_url, "https://acme.test/");
        assert_eq!(record.platform, "WordPress");
        assert_eq!(record.platforms[0].confidence, 0.5);
        assert_eq!(record.industry, "SaaS");
        assert_eq!(record.industries[0].confidence, 1.0);
        assert_eq!(record.tag_confidence[0].name, "billing");
        assert_eq!(record.tag_confidence[0].confidence, 1.0);
        assert!(record.tags.starts_with("billing, "));
        assert_eq!(record.colors.primary.as_deref(), Some("#0070f3"));
        assert_eq!(record.colors.secondary, None);
        assert_eq!(record.passthrough, row("acme.test").passthrough);
    }

    #[tokio::test]
    async fn test_timeout_still_emits_record() {
        let fetcher = StaticFetcher::default().with("https://slow.test/", Page::Timeout);
        let enricher = enricher(fetcher, 1);

        let outcome = enricher.enrich_row(&row("https://slow.test"), Utc::now()).await;
        assert!(outcome.fetch_failed());
        assert!(matches!(
            outcome.warnings()[0],
            Warning::Fetch {
                status: crate::fetcher::FetchStatus::Timeout,
                ..
            }
        ));

        let record = outcome.record();
        assert_eq!(record.website_url, "https://slow.test/");
        assert!(record.platforms.is_empty());
        assert!(record.industries.is_empty());
        assert!(record.tag_confidence.is_empty());
        assert_eq!(record.tag_confidence_json().unwrap(), "{}");
        assert!(record.colors.is_empty());
        assert_eq!(record.platform, "");
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_fetched() {
        let enricher = enricher(StaticFetcher::default(), 1);

        let outcome = enricher.enrich_row(&row("  ftp://files.test  "), Utc::now()).await;
        assert!(outcome.fetch_failed());
        assert_eq!(outcome.record().website_url, "ftp://files.test");
    }

    #[tokio::test]
    async fn test_enrich_all_preserves_order_and_count() {
        let fetcher = StaticFetcher::default()
            .with("https://a.test/", Page::Html(SAAS_PAGE))
            .with("https://b.test/", Page::Status(503))
            .with("https://c.test/", Page::Html("<html><body>plain page</body></html>"))
            .with("https://d.test/", Page::Timeout);
        let enricher = enricher(fetcher, 3);

        let rows: Vec<_> = ["a.test", "b.test", "c.test", "d.test", "e.test"]
            .iter()
            .map(|url| row(url))
            .collect();
        let (tx, mut rx) = mpsc::channel(16);

        let (outcomes, summary) = enricher.enrich_all(rows, Some(tx)).await;

        let urls: Vec<_> = outcomes
            .iter()
            .map(|o| o.record().website_url.as_str())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://a.test/",
                "https://b.test/",
                "https://c.test/",
                "https://d.test/",
                "https://e.test/"
            ]
        );
        assert_eq!(summary.total, 5);
        assert_eq!(summary.enriched, 2);
        assert_eq!(summary.degraded, 3);
        assert_eq!(summary.fetch_failures, 3);

        let timestamps: Vec<_> = outcomes.iter().map(|o| o.record().last_enriched_at).collect();
        assert!(timestamps.iter().all(|at| *at == summary.enriched_at));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert_eq!(events.iter().filter(|e| e.degraded).count(), 3);
    }

    #[tokio::test]
    async fn test_identical_pages_give_identical_results() {
        let fetcher = StaticFetcher::default().with("https://acme.test/", Page::Html(SAAS_PAGE));
        let enricher = enricher(fetcher, 2);
        let at = Utc::now();

        let first = enricher.enrich_row(&row("acme.test"), at).await;
        let second = enricher.enrich_row(&row("acme.test"), at).await;

        assert_eq!(first.record().platforms, second.record().platforms);
        assert_eq!(first.record().industries, second.record().industries);
        assert_eq!(first.record().tag_confidence, second.record().tag_confidence);
        assert_eq!(first.record().colors, second.record().colors);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_panic_is_contained_to_its_row() {
        let fetcher = StaticFetcher::default()
            .with("https://ok.test/", Page::Html(SAAS_PAGE))
            .with("https://boom.test/", Page::Panic);
        let enricher = enricher(fetcher, 2);

        let (outcomes, summary) = enricher
            .enrich_all(vec![row("ok.test"), row("boom.test"), row("ok.test")], None)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].is_degraded());
        assert!(outcomes[1].is_degraded());
        assert!(!outcomes[1].fetch_failed());
        assert_eq!(outcomes[1].record().website_url, "boom.test");
        assert_eq!(outcomes[1].record().passthrough, row("boom.test").passthrough);
        assert!(!outcomes[2].is_degraded());
        assert_eq!(summary.degraded, 1);
    }

    #[tokio::test]
    async fn test_oversize_page_degrades_content() {
        let fetcher = StaticFetcher::default().with("https://big.test/", Page::Html(SAAS_PAGE));
        let config = EnrichConfig::builder().max_document_bytes(64).build();
        let enricher = Enricher::new(fetcher, &fixture_rules(), &config).unwrap();

        let outcome = enricher.enrich_row(&row("big.test"), Utc::now()).await;
        assert!(matches!(outcome.warnings()[0], Warning::Parse(_)));
        assert!(!outcome.fetch_failed());

        let record = outcome.record();
        assert!(record.industries.is_empty());
        assert!(record.tag_confidence.is_empty());
        assert!(record.colors.is_empty());
        // Platform detection reads the raw page, not the extracted content
        assert_eq!(record.platform, "WordPress");
    }

    #[tokio::test]
    async fn test_failing_classifier_keeps_other_fields() {
        let fetcher = StaticFetcher::default().with("https://acme.test/", Page::Html(SAAS_PAGE));
        let mut enricher = Enricher::new(fetcher, &fixture_rules(), &EnrichConfig::default()).unwrap();
        // A growing decay pushes the second tag past confidence 1
        enricher.tags = TagExtractor::new_unchecked(
            &fixture_rules().stopwords,
            TagOptions {
                decay: 2.0,
                ..TagOptions::default()
            },
        );

        let outcome = enricher.enrich_row(&row("acme.test"), Utc::now()).await;
        assert!(outcome.is_degraded());
        assert!(!outcome.fetch_failed());
        assert_eq!(outcome.warnings().len(), 1);
        assert!(matches!(
            outcome.warnings()[0],
            Warning::Classification { extractor: "tags", .. }
        ));

        let record = outcome.record();
        assert!(record.tag_confidence.is_empty());
        assert_eq!(record.tags, "");
        assert_eq!(record.platform, "WordPress");
        assert_eq!(record.industry, "SaaS");
        assert_eq!(record.industries[0].confidence, 1.0);
        assert_eq!(record.colors.primary.as_deref(), Some("#0070f3"));
        assert_eq!(record.passthrough, row("acme.test").passthrough);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut rules = fixture_rules();
        rules.industries[0].keywords[0].weight = -1.0;
        let result = Enricher::new(StaticFetcher::default(), &rules, &EnrichConfig::default());
        assert!(result.is_err());
    }
}
