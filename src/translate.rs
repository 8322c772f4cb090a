use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::cli::TranslateEngine;

#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub engine: TranslateEngine,
    pub source_lang: String,
    pub target_lang: String,
    pub max_chars: usize,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            engine: TranslateEngine::Google,
            source_lang: "auto".to_owned(),
            target_lang: "id".to_owned(),
            max_chars: 4500,
            base_url: "https://translate.googleapis.com".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Translates one chunk of text. Callers never pass more than
/// [`TranslateConfig::max_chars`] characters at once.
pub trait Translator {
    fn translate_chunk(&self, chunk: &str) -> anyhow::Result<String>;
}

pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate_chunk(&self, chunk: &str) -> anyhow::Result<String> {
        Ok(chunk.to_owned())
    }
}

/// Client for the public Google Translate `translate_a/single` endpoint.
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    endpoint: Url,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> anyhow::Result<Self> {
        let mut endpoint = Url::parse(&config.base_url)
            .with_context(|| format!("parse translate base url: {}", config.base_url))?
            .join("translate_a/single")
            .context("build translate endpoint")?;
        endpoint
            .query_pairs_mut()
            .append_pair("client", "gtx")
            .append_pair("sl", &config.source_lang)
            .append_pair("tl", &config.target_lang)
            .append_pair("dt", "t");

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build translate http client")?;

        Ok(Self { client, endpoint })
    }
}

impl Translator for GoogleTranslator {
    fn translate_chunk(&self, chunk: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(USER_AGENT, "novelsite/0.1")
            .form(&[("q", chunk)])
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?
            .error_for_status()
            .context("translate endpoint returned error status")?;

        let body: serde_json::Value = response.json().context("parse translate response json")?;
        parse_google_response(&body)
    }
}

fn parse_google_response(body: &serde_json::Value) -> anyhow::Result<String> {
    let sentences = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("translate response has no sentence list"))?;

    let mut out = String::new();
    for sentence in sentences {
        if let Some(text) = sentence.get(0).and_then(|v| v.as_str()) {
            out.push_str(text);
        }
    }
    Ok(out)
}

pub fn build_translator(config: &TranslateConfig) -> anyhow::Result<Box<dyn Translator>> {
    if config.max_chars == 0 {
        anyhow::bail!("--translate-max-chars must be > 0");
    }

    match config.engine {
        TranslateEngine::Noop => Ok(Box::new(NoopTranslator)),
        TranslateEngine::Google => Ok(Box::new(GoogleTranslator::new(config)?)),
    }
}

/// Splits `input` into contiguous pieces of exactly `max_chars` characters
/// (the last one shorter). Word boundaries are not respected.
pub fn chunk_by_chars(input: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (idx, _) in input.char_indices() {
        if count == max_chars {
            chunks.push(&input[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < input.len() {
        chunks.push(&input[start..]);
    }

    chunks
}

/// Translates `text`, chunking long input. Any failure returns `text` unchanged.
pub fn translate_text(translator: &dyn Translator, text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    match try_translate_text(translator, text, max_chars) {
        Ok(translated) => translated,
        Err(err) => {
            tracing::warn!(
                chars = text.chars().count(),
                error = %format!("{err:#}"),
                "translation failed; keeping original text"
            );
            text.to_owned()
        }
    }
}

fn try_translate_text(
    translator: &dyn Translator,
    text: &str,
    max_chars: usize,
) -> anyhow::Result<String> {
    let chunks = chunk_by_chars(text, max_chars.max(1));
    let total_chunks = chunks.len();

    let mut out = String::with_capacity(text.len());
    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
        tracing::debug!(chunk_index, total_chunks, "translate chunk");
        let translated = translator
            .translate_chunk(chunk)
            .with_context(|| format!("translate chunk {chunk_index}/{total_chunks}"))?;
        out.push_str(&translated);
    }
    Ok(out)
}
