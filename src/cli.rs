use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_START_URL: &str =
    "https://levelingods.shop/novel/chronicles-of-the-lazy-sovereign-novel/chapter-1/";

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl, translate and store chapters, resuming after the last stored one.
    Crawl(CrawlArgs),
    /// Render the stored chapters into a static site.
    Build(BuildArgs),
    /// Serve a built site locally.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranslateEngine {
    /// Public Google Translate endpoint.
    Google,
    /// Keep text as scraped.
    Noop,
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// First chapter URL, used when the data file holds no chapters.
    #[arg(long, default_value = DEFAULT_START_URL)]
    pub url: String,

    /// Chapter data file (JSON).
    #[arg(long, default_value = "novel_data.json")]
    pub data: String,

    /// Stop once the collection holds this many chapters.
    #[arg(long, default_value_t = 358)]
    pub max_chapters: usize,

    /// Delay between page fetches (politeness).
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// User-Agent header sent with page requests.
    #[arg(long, default_value = crate::fetch::DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Page request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Substrings of a next link that mark a login/premium wall.
    #[arg(long = "wall-marker", default_values_t = vec!["login".to_owned(), "premium".to_owned()])]
    pub wall_markers: Vec<String>,

    /// Translation backend.
    #[arg(long, value_enum, default_value_t = TranslateEngine::Google)]
    pub translate_engine: TranslateEngine,

    /// Target language code.
    #[arg(long, default_value = "id")]
    pub to: String,

    /// Longer texts are translated in chunks of this many characters.
    #[arg(long, default_value_t = 4500)]
    pub translate_max_chars: usize,

    /// Base URL of the translation endpoint.
    #[arg(long, default_value = "https://translate.googleapis.com")]
    pub translate_base_url: String,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Chapter data file (JSON).
    #[arg(long, default_value = "novel_data.json")]
    pub data: String,

    /// Output directory (deleted and recreated).
    #[arg(long, default_value = "docs")]
    pub out: String,

    /// Directory holding `index.html` and `chapter.html` templates.
    #[arg(long, default_value = "templates")]
    pub templates: String,

    /// Static assets copied to `<out>/static`.
    #[arg(long = "static", default_value = "static")]
    pub static_dir: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Built site directory.
    #[arg(long, default_value = "docs")]
    pub dir: String,

    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: SocketAddr,
}
