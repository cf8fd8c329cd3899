//! Splits document text into overlapping fixed-size windows and turns them into
//! [`ChunkRecord`]s, the unit that gets embedded, indexed and retrieved.
//!
//! Windows are measured in characters, not bytes, so multi-byte text never gets
//! cut inside a code point.

use serde::{Deserialize, Serialize};

/// Default window length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Window parameters for [`chunk`]. `overlap` must be smaller than `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkError> {
        let config = Self { size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.size == 0 || self.overlap >= self.size {
            return Err(ChunkError::InvalidConfiguration {
                size: self.size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Where a document came from. Copied onto every chunk cut from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// File name, or the name of the remote system (e.g. "ServiceNow").
    pub source: String,
    pub title: Option<String>,
    /// Identifier in the origin system. Kept for traceability only.
    pub external_id: Option<String>,
}

impl Origin {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }
}

/// A chunk of document text plus its provenance. Stored alongside its embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub source: String,
    /// 1-based position of this chunk within its document.
    pub sequence: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Records cut from one document, plus how many whitespace-only windows were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedDocument {
    pub records: Vec<ChunkRecord>,
    pub dropped: usize,
}

/// Splits `text` into windows of `size` characters, each starting `size - overlap`
/// characters after the previous one. The last window may be shorter.
/// Empty text gives no windows.
///
/// Stops at the first window that reaches the end of `text`: a further window would
/// lie entirely inside the overlap of the previous one.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    ChunkConfig { size, overlap }.validate()?;

    // Byte offset of every char boundary, including the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;
    let step = size - overlap;

    let mut windows = Vec::with_capacity(len.div_ceil(step));
    let mut start = 0;
    while start < len {
        let end = (start + size).min(len);
        windows.push(text[bounds[start]..bounds[end]].to_string());
        if end == len {
            break;
        }
        start += step;
    }
    Ok(windows)
}

/// Chunks one document and stamps each window with `origin`. Windows that are empty
/// after trimming are dropped and counted; `sequence` keeps the window's position.
pub fn chunk_document(
    text: &str,
    origin: &Origin,
    config: ChunkConfig,
) -> Result<ChunkedDocument, ChunkError> {
    let mut out = ChunkedDocument::default();
    for (i, window) in chunk(text, config.size, config.overlap)?
        .into_iter()
        .enumerate()
    {
        if window.trim().is_empty() {
            out.dropped += 1;
            continue;
        }
        out.records.push(ChunkRecord {
            text: window,
            source: origin.source.clone(),
            sequence: i + 1,
            title: origin.title.clone(),
            external_id: origin.external_id.clone(),
        });
    }
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("invalid chunk configuration: size {size}, overlap {overlap} (need size > 0 and overlap < size)")]
    InvalidConfiguration { size: usize, overlap: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_with_overlap() {
        let c = chunk("abcdefghij", 4, 1).unwrap();
        assert_eq!(c, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn chunk_empty_text() {
        assert!(chunk("", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn chunk_short_text_is_one_window() {
        assert_eq!(chunk("hello", 500, 50).unwrap(), vec!["hello"]);
    }

    #[test]
    fn chunk_last_window_may_be_short() {
        let c = chunk("abcdefgh", 4, 1).unwrap();
        assert_eq!(c, vec!["abcd", "defg", "gh"]);
    }

    #[test]
    fn chunk_overlap_repeats_tail() {
        let text: String = ('a'..='z').cycle().take(1234).collect();
        let c = chunk(&text, 100, 10).unwrap();
        for pair in c.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(prev.len(), 100);
            assert_eq!(&prev[90..], &next[..10]);
        }
        assert!(c.last().unwrap().chars().count() <= 100);
    }

    #[test]
    fn chunk_counts_chars_not_bytes() {
        let c = chunk("äöüßé", 2, 0).unwrap();
        assert_eq!(c, vec!["äö", "üß", "é"]);
    }

    #[test]
    fn chunk_is_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        assert_eq!(chunk(&text, 64, 8).unwrap(), chunk(&text, 64, 8).unwrap());
    }

    #[test]
    fn chunk_rejects_bad_parameters() {
        assert!(matches!(
            chunk("abc", 0, 0),
            Err(ChunkError::InvalidConfiguration { size: 0, overlap: 0 })
        ));
        assert!(chunk("abc", 4, 4).is_err());
        assert!(chunk("abc", 4, 5).is_err());
        assert!(ChunkConfig::new(4, 3).is_ok());
    }

    #[test]
    fn chunk_document_copies_origin() {
        let origin = Origin::new("kb.json")
            .with_title("VPN setup")
            .with_external_id("KB0001");
        let doc = chunk_document("abcdefghij", &origin, ChunkConfig::new(4, 1).unwrap()).unwrap();
        assert_eq!(doc.dropped, 0);
        assert_eq!(doc.records.len(), 3);
        assert_eq!(doc.records[1].text, "defg");
        assert_eq!(doc.records[1].sequence, 2);
        assert!(doc.records.iter().all(|r| r.source == "kb.json"
            && r.title.as_deref() == Some("VPN setup")
            && r.external_id.as_deref() == Some("KB0001")));
    }

    #[test]
    fn chunk_document_drops_blank_windows() {
        let text = format!("{}{}", "a".repeat(4), " ".repeat(8));
        let doc = chunk_document(&text, &Origin::new("a.txt"), ChunkConfig::new(4, 0).unwrap())
            .unwrap();
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.dropped, 2);
        assert_eq!(doc.records[0].sequence, 1);
    }

    #[test]
    fn chunk_document_whitespace_only_yields_nothing() {
        let doc = chunk_document("   \n\t ", &Origin::new("blank.txt"), ChunkConfig::default())
            .unwrap();
        assert!(doc.records.is_empty());
        assert_eq!(doc.dropped, 1);
    }
}
