use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;

use crate::cli::CrawlArgs;
use crate::extract::{ExtractSelectors, PageExtractor};
use crate::fetch::PageFetcher;
use crate::formats::Chapter;
use crate::translate::{TranslateConfig, Translator};

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: String,
    pub data_file: PathBuf,
    /// Ceiling on the size of the whole collection, existing chapters included.
    pub max_chapters: usize,
    /// Pause between consecutive page fetches.
    pub delay: Duration,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// A next link containing any of these ends the crawl.
    pub wall_markers: Vec<String>,
    pub selectors: ExtractSelectors,
    pub translate: TranslateConfig,
}

impl CrawlConfig {
    pub fn from_args(args: &CrawlArgs) -> Self {
        Self {
            start_url: args.url.clone(),
            data_file: PathBuf::from(&args.data),
            max_chapters: args.max_chapters,
            delay: Duration::from_millis(args.delay_ms),
            user_agent: args.user_agent.clone(),
            fetch_timeout: Duration::from_secs(args.timeout_secs),
            wall_markers: args.wall_markers.clone(),
            selectors: ExtractSelectors::default(),
            translate: TranslateConfig {
                engine: args.translate_engine,
                target_lang: args.to.clone(),
                max_chars: args.translate_max_chars,
                base_url: args.translate_base_url.clone(),
                ..TranslateConfig::default()
            },
        }
    }
}

/// Why a crawl run ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stored collection has no reachable next chapter.
    AlreadyComplete,
    CapReached,
    FetchFailed,
    NoContent,
    NoNextLink,
    WallMarker,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::AlreadyComplete => "already complete",
            StopReason::CapReached => "chapter cap reached",
            StopReason::FetchFailed => "page fetch failed",
            StopReason::NoContent => "no content found",
            StopReason::NoNextLink => "no next link",
            StopReason::WallMarker => "next link leads to login/premium wall",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub appended: usize,
    pub total: usize,
    pub stop: StopReason,
}

pub struct Crawler<'a> {
    config: &'a CrawlConfig,
    fetcher: PageFetcher,
    extractor: PageExtractor,
    translator: Box<dyn Translator>,
}

impl<'a> Crawler<'a> {
    pub fn new(config: &'a CrawlConfig, translator: Box<dyn Translator>) -> anyhow::Result<Self> {
        let fetcher = PageFetcher::new(&config.user_agent, config.fetch_timeout)?;
        let extractor = PageExtractor::new(&config.selectors).context("build page extractor")?;
        Ok(Self {
            config,
            fetcher,
            extractor,
            translator,
        })
    }

    /// Picks the first page to fetch for a collection.
    ///
    /// An empty collection starts at the configured start URL. Otherwise the
    /// last stored chapter's page is fetched again and its next link followed;
    /// `None` means there is nothing left to crawl.
    pub fn resume(&self, chapters: &[Chapter]) -> Option<String> {
        let Some(last) = chapters.last() else {
            return Some(self.config.start_url.clone());
        };
        tracing::info!(id = last.id, url = %last.url, "resuming after stored chapter");

        let html = match self.fetcher.fetch(&last.url) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(url = %last.url, error = %format!("{err:#}"), "cannot refetch last chapter");
                return None;
            }
        };

        match self.follow(self.extractor.next_link_in(&html)) {
            Ok(next) => Some(next),
            Err(reason) => {
                tracing::info!(%reason, "no chapter after the stored collection");
                None
            }
        }
    }

    pub fn run(&self) -> anyhow::Result<CrawlReport> {
        let data_file = &self.config.data_file;
        let mut chapters = match crate::store::load_chapters(data_file) {
            Ok(chapters) => chapters,
            Err(err) => {
                tracing::warn!(
                    path = %data_file.display(),
                    error = %format!("{err:#}"),
                    "cannot load existing chapters; starting over"
                );
                Vec::new()
            }
        };
        if !chapters.is_empty() {
            tracing::info!(chapters = chapters.len(), "loaded existing chapters");
        }

        let mut appended = 0usize;
        let Some(mut current_url) = self.resume(&chapters) else {
            return Ok(CrawlReport {
                appended,
                total: chapters.len(),
                stop: StopReason::AlreadyComplete,
            });
        };
        tracing::info!(url = %current_url, "starting crawl");

        let max = self.config.max_chapters;
        let stop = loop {
            if chapters.len() >= max {
                tracing::info!(max, "chapter cap reached");
                break StopReason::CapReached;
            }

            let id = u32::try_from(chapters.len() + 1).context("chapter id overflow")?;
            tracing::info!(url = %current_url, "crawl chapter [{id}/{max}]");

            let html = match self.fetcher.fetch(&current_url) {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(url = %current_url, error = %format!("{err:#}"), "fetch failed");
                    break StopReason::FetchFailed;
                }
            };

            let page = self.extractor.extract_page(&html);
            if page.content.is_empty() {
                tracing::warn!(url = %current_url, "no content found");
                break StopReason::NoContent;
            }
            tracing::debug!(strategy = page.strategy, "content extracted");

            let original_title = page.title.unwrap_or_else(|| format!("Chapter {id}"));
            tracing::info!(id, title = %original_title, "translate chapter");
            let max_chars = self.config.translate.max_chars;
            let translator = self.translator.as_ref();
            let title = crate::translate::translate_text(translator, &original_title, max_chars);
            let content = crate::translate::translate_text(translator, &page.content, max_chars);

            chapters.push(Chapter {
                id,
                original_title,
                title,
                content,
                url: current_url.clone(),
            });
            appended += 1;
            crate::store::save_chapters(data_file, &chapters).context("save chapters")?;

            match self.follow(page.next_href) {
                Ok(next) => current_url = next,
                Err(reason) => break reason,
            }

            if !self.config.delay.is_zero() {
                std::thread::sleep(self.config.delay);
            }
        };

        Ok(CrawlReport {
            appended,
            total: chapters.len(),
            stop,
        })
    }

    fn follow(&self, next_href: Option<String>) -> Result<String, StopReason> {
        let Some(next) = next_href else {
            tracing::info!("no next link found");
            return Err(StopReason::NoNextLink);
        };
        if self
            .config
            .wall_markers
            .iter()
            .any(|marker| next.contains(marker.as_str()))
        {
            tracing::info!(url = %next, "next link leads to login/premium");
            return Err(StopReason::WallMarker);
        }
        Ok(next)
    }
}

pub fn run(args: CrawlArgs) -> anyhow::Result<CrawlReport> {
    let config = CrawlConfig::from_args(&args);
    let translator =
        crate::translate::build_translator(&config.translate).context("build translator")?;
    let crawler = Crawler::new(&config, translator)?;

    let report = crawler.run()?;
    tracing::info!(
        appended = report.appended,
        total = report.total,
        stop = %report.stop,
        "crawl finished"
    );
    Ok(report)
}
