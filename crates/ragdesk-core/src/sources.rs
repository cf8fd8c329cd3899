//! Reading source documents into [`RawDocument`]s for ingestion.
//!
//! Two local adapters live here: a folder of plain-text / markdown files and a folder
//! of knowledge-base JSON exports. Other adapters (PDF extraction, remote ticketing
//! APIs) only need to yield the same `Result<RawDocument, AcquisitionError>` items.
//! A failure on one document is an `Err` item; the rest still come through.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::chunks::Origin;

/// Extensions picked up by [`scan_documents`].
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// A document's full text and where it came from, before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub text: String,
    pub origin: Origin,
}

/// One acquired document, or the reason it could not be read.
pub type Acquired = Result<RawDocument, AcquisitionError>;

impl RawDocument {
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    /// Human-readable label for logs and reports.
    pub fn label(&self) -> String {
        match &self.origin.title {
            Some(title) => format!("{} ({})", self.origin.source, title),
            None => self.origin.source.clone(),
        }
    }
}

/// Knowledge-base article as exported to JSON. Every field is optional.
#[derive(Debug, Deserialize)]
struct KbArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, alias = "sys_id", alias = "number")]
    id: Option<String>,
}

/// Walks `root` for text and markdown files, one document per file, named by file name.
/// Hidden entries are skipped and symlinks are not followed (walkdir default).
pub fn scan_documents(root: &Path) -> Result<Vec<Acquired>, AcquisitionError> {
    walk_files(root, TEXT_EXTENSIONS).map(|entries| {
        entries
            .into_iter()
            .map(|entry| {
                let path = entry?;
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| AcquisitionError::Read(path.clone(), e))?;
                Ok(RawDocument::new(text, Origin::new(file_name(&path))))
            })
            .collect()
    })
}

/// Reads every `.json` file under `root` as an array of articles. Each article becomes
/// a document titled by the article title; a file that fails to parse is one failure.
pub fn load_kb_articles(root: &Path) -> Result<Vec<Acquired>, AcquisitionError> {
    let entries = walk_files(root, &["json"])?;
    let mut docs = Vec::new();
    for entry in entries {
        match entry.and_then(|path| read_kb_file(&path)) {
            Ok(articles) => docs.extend(articles.into_iter().map(Ok)),
            Err(e) => docs.push(Err(e)),
        }
    }
    Ok(docs)
}

fn read_kb_file(path: &Path) -> Result<Vec<RawDocument>, AcquisitionError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AcquisitionError::Read(path.to_path_buf(), e))?;
    let articles: Vec<KbArticle> =
        serde_json::from_str(&raw).map_err(|e| AcquisitionError::Parse(path.to_path_buf(), e))?;
    let source = file_name(path);
    Ok(articles
        .into_iter()
        .map(|article| {
            let mut origin = Origin::new(source.clone());
            origin.title = article.title.filter(|t| !t.trim().is_empty());
            origin.external_id = article.id;
            RawDocument::new(article.content.unwrap_or_default(), origin)
        })
        .collect())
}

/// Files under `root` with one of `extensions`, sorted by path. A walk error for one
/// entry becomes one `Err` item.
fn walk_files(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<Result<PathBuf, AcquisitionError>>, AcquisitionError> {
    if !root.is_dir() {
        return Err(AcquisitionError::NotADirectory(root.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                found.push(Err(AcquisitionError::Walk(e.to_string())));
                continue;
            }
        };
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|want| e.eq_ignore_ascii_case(want)));
        if matches && entry.file_type().is_file() {
            found.push(Ok(path.to_path_buf()));
        }
    }
    Ok(found)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("invalid knowledge-base file {0}: {1}")]
    Parse(PathBuf, serde_json::Error),
    /// Failure reported by an adapter outside this module (PDF reader, remote API client).
    #[error("{document}: {message}")]
    Other { document: String, message: String },
}
