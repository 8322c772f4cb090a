use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize as _;

use crate::formats::Chapter;

/// Reads the chapter collection. A missing file is an empty collection.
pub fn load_chapters(path: &Path) -> anyhow::Result<Vec<Chapter>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read data file: {}", path.display()))?;
    let chapters: Vec<Chapter> = serde_json::from_str(&contents)
        .with_context(|| format!("parse data file: {}", path.display()))?;
    Ok(chapters)
}

/// Like [`load_chapters`], but any failure is logged and yields an empty collection.
pub fn load_chapters_or_empty(path: &Path) -> Vec<Chapter> {
    match load_chapters(path) {
        Ok(chapters) => chapters,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "ignoring unreadable data file");
            Vec::new()
        }
    }
}

/// Overwrites the data file with the full collection.
///
/// The JSON is written with four-space indentation and non-ASCII text kept
/// literal, into a temporary sibling file that is then renamed over `path`.
pub fn save_chapters(path: &Path, chapters: &[Chapter]) -> anyhow::Result<()> {
    let json = to_pretty_json(chapters).context("serialize chapters")?;

    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create data file parent dir: {}", parent_dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("create temp data file in {}", parent_dir.display()))?;
    tmp.write_all(&json)
        .with_context(|| format!("write temp data file for {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("flush temp data file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("replace data file: {}", path.display()))?;

    Ok(())
}

fn to_pretty_json(chapters: &[Chapter]) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    chapters.serialize(&mut serializer)?;
    Ok(out)
}
