//! Depth-bounded, same-origin, depth-first link traversal.
//!
//! Each job owns one [`Crawler`] with its own visited set and work stack.
//! The store, fetcher and pipeline are shared.

use crate::error::ScanError;
use crate::fetcher::Fetcher;
use crate::pipeline::{ArtifactPipeline, RecordOutcome};
use metaprobe_core::{Classifier, ScanTarget};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is hardcoded and valid"));

/// Live counters for one crawl, readable while it runs.
#[derive(Debug, Default)]
pub struct CrawlCounters {
    /// Pages requested
    pub pages_visited: AtomicU64,
    /// New artifacts stored
    pub artifacts_recorded: AtomicU64,
    /// File links skipped because the URL was already stored
    pub duplicates_skipped: AtomicU64,
    /// Network, status and storage failures
    pub errors: AtomicU64,
}

impl CrawlCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Crawl state for one job.
pub struct Crawler<'a> {
    target: &'a ScanTarget,
    max_depth: u32,
    fetcher: &'a Fetcher,
    classifier: &'a Classifier,
    pipeline: &'a ArtifactPipeline,
    visited: HashSet<Url>,
    stack: Vec<(Url, u32)>,
}

impl<'a> Crawler<'a> {
    /// Prepare a crawl of `target` seeded with its start URL at depth 0.
    #[must_use]
    pub fn new(
        target: &'a ScanTarget,
        max_depth: u32,
        fetcher: &'a Fetcher,
        classifier: &'a Classifier,
        pipeline: &'a ArtifactPipeline,
    ) -> Self {
        Self {
            target,
            max_depth,
            fetcher,
            classifier,
            pipeline,
            visited: HashSet::new(),
            stack: vec![(target.url().clone(), 0)],
        }
    }

    /// Run until the work stack is empty or `cancel` fires.
    ///
    /// Cancellation is checked before each pop and before each file fetch,
    /// so at most the request already in flight completes after a stop.
    pub async fn run(&mut self, cancel: &CancellationToken, counters: &CrawlCounters) {
        while let Some((url, depth)) = self.stack.pop() {
            if cancel.is_cancelled() {
                info!("Crawl of {} cancelled", self.target);
                return;
            }
            if self.visited.contains(&url) || depth > self.max_depth {
                continue;
            }
            self.visited.insert(url.clone());
            CrawlCounters::bump(&counters.pages_visited);

            let page = match self.fetcher.fetch_page(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("{}", e);
                    CrawlCounters::bump(&counters.errors);
                    continue;
                }
            };
            if !page.is_success() {
                warn!("{} -> status {}", url, page.status);
                CrawlCounters::bump(&counters.errors);
                continue;
            }
            if !page.is_html() {
                debug!("Not HTML, not expanding: {}", url);
                continue;
            }

            for link in extract_links(&page.body, &page.url) {
                if !self.target.contains(&link) {
                    debug!("Skipping off-origin link {}", link);
                    continue;
                }

                if let Some(extension) = self.classifier.classify(&link) {
                    if cancel.is_cancelled() {
                        info!("Crawl of {} cancelled", self.target);
                        return;
                    }
                    self.download(&link, &extension, counters).await;
                } else if depth < self.max_depth {
                    self.stack.push((link, depth + 1));
                }
            }
        }

        info!(
            "Crawl of {} finished: {} pages visited",
            self.target,
            self.visited.len()
        );
    }

    async fn download(&self, url: &Url, extension: &str, counters: &CrawlCounters) {
        match self.pipeline.database().artifact_exists(url.as_str()).await {
            Ok(true) => {
                debug!("Already recorded: {}", url);
                CrawlCounters::bump(&counters.duplicates_skipped);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Dedup check failed for {}: {}", url, e);
                CrawlCounters::bump(&counters.errors);
                return;
            }
        }

        let file = match self.fetcher.fetch_file(url).await {
            Ok(file) if file.is_success() => file,
            Ok(file) => {
                warn!(
                    "{}",
                    ScanError::HttpStatus {
                        url: url.to_string(),
                        status: file.status,
                    }
                );
                CrawlCounters::bump(&counters.errors);
                return;
            }
            Err(e) => {
                warn!("{}", e);
                CrawlCounters::bump(&counters.errors);
                return;
            }
        };

        info!("Downloaded {}", url);
        match self
            .pipeline
            .record_download(self.target.domain(), url, extension, file.bytes)
            .await
        {
            Ok(RecordOutcome::Recorded(_)) => CrawlCounters::bump(&counters.artifacts_recorded),
            Ok(RecordOutcome::Duplicate) => CrawlCounters::bump(&counters.duplicates_skipped),
            Err(e) => {
                warn!("Dropping artifact {}: {}", url, e);
                CrawlCounters::bump(&counters.errors);
            }
        }
    }
}

/// Absolute `http`/`https` links of every anchor, resolved against `base`,
/// fragments removed, in document order.
fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links_resolves_relative() {
        let base = Url::parse("http://a.test/docs/index.html").expect("base");
        let html = r##"
            <a href="a.pdf">a</a>
            <a href="/root.html#section">root</a>
            <a href="../up/">up</a>
            <a href="https://b.test/x">x</a>
            <a href="mailto:me@a.test">mail</a>
            <a href="#top">top</a>
            <a>no href</a>
        "##;

        let links: Vec<String> = extract_links(html, &base)
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            links,
            vec![
                "http://a.test/docs/a.pdf",
                "http://a.test/root.html",
                "http://a.test/up/",
                "https://b.test/x",
                "http://a.test/docs/index.html",
            ]
        );
    }

    #[test]
    fn test_extract_links_empty_document() {
        let base = Url::parse("http://a.test/").expect("base");
        assert!(extract_links("", &base).is_empty());
        assert!(extract_links("<html><body>no links</body></html>", &base).is_empty());
    }
}
