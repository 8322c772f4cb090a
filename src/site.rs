use std::path::{Path, PathBuf};

use anyhow::Context as _;
use minijinja::{Environment, context};
use walkdir::WalkDir;

use crate::cli::BuildArgs;

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub data_file: PathBuf,
    pub out_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Passed to templates so they emit file links instead of dynamic routes.
    pub is_static: bool,
}

impl SiteConfig {
    pub fn from_args(args: &BuildArgs) -> Self {
        Self {
            data_file: PathBuf::from(&args.data),
            out_dir: PathBuf::from(&args.out),
            templates_dir: PathBuf::from(&args.templates),
            static_dir: PathBuf::from(&args.static_dir),
            is_static: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub chapters: usize,
}

pub fn run(args: BuildArgs) -> anyhow::Result<BuildReport> {
    let config = SiteConfig::from_args(&args);
    let report = build_site(&config)?;
    tracing::info!(
        chapters = report.chapters,
        out = %config.out_dir.display(),
        "build complete"
    );
    Ok(report)
}

/// Rebuilds the whole output directory from the data file, templates and
/// static assets. Running it twice on unchanged inputs yields identical files.
pub fn build_site(config: &SiteConfig) -> anyhow::Result<BuildReport> {
    let out_dir = &config.out_dir;
    let chapter_dir = out_dir.join("chapter");
    let static_out_dir = out_dir.join("static");

    if out_dir.exists() {
        std::fs::remove_dir_all(out_dir)
            .with_context(|| format!("remove output dir: {}", out_dir.display()))?;
    }
    for dir in [out_dir, &chapter_dir, &static_out_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir: {}", dir.display()))?;
    }

    if config.static_dir.is_dir() {
        copy_tree(&config.static_dir, &static_out_dir).context("copy static assets")?;
    } else {
        tracing::debug!(dir = %config.static_dir.display(), "no static assets dir");
    }

    let env = template_env(&config.templates_dir);

    let mut chapters = crate::store::load_chapters_or_empty(&config.data_file);
    chapters.sort_by_key(|chapter| chapter.id);

    tracing::info!(chapters = chapters.len(), "generate index.html");
    let index = env
        .get_template("index.html")
        .context("load index template")?
        .render(context! {
            chapters => &chapters,
            is_static => config.is_static,
        })
        .context("render index.html")?;
    write_page(&out_dir.join("index.html"), &index)?;

    let template = env
        .get_template("chapter.html")
        .context("load chapter template")?;
    for (idx, chapter) in chapters.iter().enumerate() {
        tracing::info!(id = chapter.id, "build chapter");
        let prev_chapter = idx.checked_sub(1).and_then(|prev| chapters.get(prev));
        let next_chapter = chapters.get(idx + 1);

        let html = template
            .render(context! {
                chapter => chapter,
                prev_chapter => prev_chapter,
                next_chapter => next_chapter,
                is_static => config.is_static,
            })
            .with_context(|| format!("render chapter {}", chapter.id))?;
        write_page(&chapter_dir.join(format!("{}.html", chapter.id)), &html)?;
    }

    Ok(BuildReport {
        chapters: chapters.len(),
    })
}

fn template_env(templates_dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(templates_dir.to_path_buf()));
    env.add_filter("paragraphs", paragraphs);
    env
}

/// Splits chapter content into its paragraphs.
fn paragraphs(content: String) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

fn write_page(path: &Path, html: &str) -> anyhow::Result<()> {
    std::fs::write(path, html).with_context(|| format!("write page: {}", path.display()))
}

/// Copies every file and directory under `src` into `dst`, keeping relative
/// paths, permissions and modification times.
fn copy_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("walk static dir: {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .context("strip static dir prefix")?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("create dir: {}", target.display()))?;
            continue;
        }

        std::fs::copy(entry.path(), &target).with_context(|| {
            format!("copy {} -> {}", entry.path().display(), target.display())
        })?;
        let modified = entry
            .metadata()
            .context("read static file metadata")?
            .modified()
            .context("read static file mtime")?;
        std::fs::File::options()
            .write(true)
            .open(&target)
            .and_then(|file| file.set_modified(modified))
            .with_context(|| format!("set mtime: {}", target.display()))?;
    }
    Ok(())
}
