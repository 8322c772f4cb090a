use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, USER_AGENT};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Blocking page fetcher with a fixed `User-Agent`.
pub struct PageFetcher {
    client: reqwest::blocking::Client,
    user_agent: String,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build page http client")?;

        Ok(Self {
            client,
            user_agent: user_agent.to_owned(),
        })
    }

    /// GETs `url` and returns the body. Transport errors and non-2xx
    /// statuses are both errors.
    pub fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: status {status}");
        }

        response
            .text()
            .with_context(|| format!("read body of {url}"))
    }
}
