//! Exhaustive nearest-neighbour index over chunk embeddings, persisted to disk as
//! two paired files: `vectors.bin` (raw embeddings) and `records.json` (metadata).
//!
//! Embeddings live in one flat buffer; row `i` is `vectors[i * dimension..][..dimension]`
//! and pairs with `records[i]`. Row position is the only link between the two, so
//! they only ever grow together.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunks::ChunkRecord;

pub const VECTORS_FILENAME: &str = "vectors.bin";
pub const RECORDS_FILENAME: &str = "records.json";

const MAGIC: &[u8; 4] = b"RDVX";
const FORMAT_VERSION: u32 = 1;
/// magic + version (u32) + dimension (u32) + count (u64)
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Size and shape of an index, in memory or on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub dimension: usize,
}

/// A search result: the stored record and its squared Euclidean distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub record: ChunkRecord,
    pub distance: f32,
}

/// Embeddings paired with their chunk records, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
    records: Vec<ChunkRecord>,
}

/// Metadata artifact. `R` is a borrowed slice when writing and a `Vec` when reading.
#[derive(Serialize, Deserialize)]
struct RecordsFile<R> {
    version: u32,
    dimension: usize,
    count: usize,
    records: R,
}

impl VectorIndex {
    /// Creates an empty index that only accepts embeddings of length `dimension`.
    pub fn new(dimension: usize) -> Result<Self, StoreError> {
        if dimension == 0 {
            return Err(StoreError::InvalidConfiguration(
                "index dimension must be positive".into(),
            ));
        }
        header_dimension(dimension)?;
        Ok(Self {
            dimension,
            vectors: Vec::new(),
            records: Vec::new(),
        })
    }

    /// Restores the index persisted in `dir`, or starts empty when nothing was persisted.
    /// Corrupt or mismatched state is an error, never silently replaced.
    pub fn open(dir: &Path, dimension: usize) -> Result<Self, StoreError> {
        match Self::restore(dir, dimension) {
            Err(StoreError::NoPersistedState(_)) => {
                tracing::info!(dir = %dir.display(), dimension, "no persisted index, starting empty");
                Self::new(dimension)
            }
            other => other,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored (embedding, record) pairs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    /// Embedding stored at insertion position `position`.
    pub fn embedding(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.vectors[start..start + self.dimension])
    }

    /// Checks that a batch could be appended: one embedding per record, each of the
    /// index's dimension.
    pub fn check_batch(&self, records: usize, embeddings: &[Vec<f32>]) -> Result<(), StoreError> {
        if records != embeddings.len() {
            return Err(StoreError::DimensionMismatch {
                context: "records vs embeddings in batch",
                expected: records,
                actual: embeddings.len(),
            });
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(StoreError::DimensionMismatch {
                context: "appended embedding",
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        Ok(())
    }

    /// Appends records and their embeddings, in order. The whole batch is validated
    /// first; on error nothing is added. Appending the same batch twice stores it twice.
    pub fn append(
        &mut self,
        records: Vec<ChunkRecord>,
        embeddings: &[Vec<f32>],
    ) -> Result<(), StoreError> {
        self.check_batch(records.len(), embeddings)?;
        self.vectors.reserve(embeddings.len() * self.dimension);
        for embedding in embeddings {
            self.vectors.extend_from_slice(embedding);
        }
        self.records.extend(records);
        Ok(())
    }

    /// Drops every entry at or after `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.vectors.truncate(len * self.dimension);
        self.records.truncate(len);
    }

    /// Returns the `top_k` records closest to `query`, nearest first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ChunkRecord>, StoreError> {
        Ok(self
            .search_scored(query, top_k)?
            .into_iter()
            .map(|hit| hit.record)
            .collect())
    }

    /// Scores every stored embedding by squared Euclidean distance to `query` and
    /// returns the `top_k` smallest, ascending. Ties go to the earlier insertion.
    pub fn search_scored(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                context: "query embedding",
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if top_k == 0 {
            return Err(StoreError::InvalidConfiguration(
                "top_k must be positive".into(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|row| squared_l2(query, row))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchHit {
                record: self.records[position].clone(),
                distance,
            })
            .collect())
    }

    /// Writes both artifacts into `dir`. Each is written to a temporary sibling and
    /// synced before either is renamed into place, so an interrupted persist leaves
    /// the previous pair intact or a pair whose headers disagree (caught by `restore`).
    pub fn persist(&self, dir: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(dir).map_err(|e| StoreError::Io(dir.to_path_buf(), e))?;
        let vectors_path = dir.join(VECTORS_FILENAME);
        let records_path = dir.join(RECORDS_FILENAME);
        let vectors_tmp = tmp_sibling(&vectors_path);
        let records_tmp = tmp_sibling(&records_path);

        let records = serde_json::to_vec(&RecordsFile {
            version: FORMAT_VERSION,
            dimension: self.dimension,
            count: self.records.len(),
            records: self.records.as_slice(),
        })
        .map_err(StoreError::Serialize)?;

        write_synced(&vectors_tmp, &self.encode_vectors()?)?;
        write_synced(&records_tmp, &records)?;
        rename(&vectors_tmp, &vectors_path)?;
        rename(&records_tmp, &records_path)?;

        tracing::debug!(
            dir = %dir.display(),
            entries = self.len(),
            dimension = self.dimension,
            "persisted index"
        );
        Ok(())
    }

    /// Loads the artifacts written by [`persist`](Self::persist). Fails with
    /// `NoPersistedState` when neither exists and `CorruptPersistentState` when only one
    /// exists, when their counts disagree, or when the stored dimension is not
    /// `expected_dimension`.
    pub fn restore(dir: &Path, expected_dimension: usize) -> Result<Self, StoreError> {
        if expected_dimension == 0 {
            return Err(StoreError::InvalidConfiguration(
                "index dimension must be positive".into(),
            ));
        }
        let vectors_path = dir.join(VECTORS_FILENAME);
        let records_path = dir.join(RECORDS_FILENAME);
        match (vectors_path.is_file(), records_path.is_file()) {
            (false, false) => return Err(StoreError::NoPersistedState(dir.to_path_buf())),
            (true, false) => {
                return Err(StoreError::CorruptPersistentState(format!(
                    "{} exists but {} is missing",
                    vectors_path.display(),
                    RECORDS_FILENAME
                )))
            }
            (false, true) => {
                return Err(StoreError::CorruptPersistentState(format!(
                    "{} exists but {} is missing",
                    records_path.display(),
                    VECTORS_FILENAME
                )))
            }
            (true, true) => {}
        }

        let bytes = fs::read(&vectors_path).map_err(|e| StoreError::Io(vectors_path.clone(), e))?;
        let (dimension, vectors) = decode_vectors(&bytes)?;

        let raw = fs::read(&records_path).map_err(|e| StoreError::Io(records_path.clone(), e))?;
        let file: RecordsFile<Vec<ChunkRecord>> = serde_json::from_slice(&raw).map_err(|e| {
            StoreError::CorruptPersistentState(format!("unreadable {RECORDS_FILENAME}: {e}"))
        })?;

        if file.version != FORMAT_VERSION {
            return Err(StoreError::CorruptPersistentState(format!(
                "{RECORDS_FILENAME} has format version {}, expected {FORMAT_VERSION}",
                file.version
            )));
        }
        if file.dimension != dimension {
            return Err(StoreError::CorruptPersistentState(format!(
                "{VECTORS_FILENAME} has dimension {dimension} but {RECORDS_FILENAME} declares {}",
                file.dimension
            )));
        }
        if dimension != expected_dimension {
            return Err(StoreError::CorruptPersistentState(format!(
                "persisted dimension {dimension} does not match the configured dimension {expected_dimension}"
            )));
        }
        let count = vectors.len() / dimension;
        if file.count != file.records.len() || count != file.records.len() {
            return Err(StoreError::CorruptPersistentState(format!(
                "{count} embeddings but {} records ({} declared)",
                file.records.len(),
                file.count
            )));
        }

        tracing::info!(dir = %dir.display(), entries = count, dimension, "restored index");
        Ok(Self {
            dimension,
            vectors,
            records: file.records,
        })
    }

    /// Reads only the `vectors.bin` header in `dir`. `None` when nothing was persisted.
    /// Does not cross-check `records.json`; use [`restore`](Self::restore) for that.
    pub fn peek(dir: &Path) -> Result<Option<IndexStats>, StoreError> {
        let path = dir.join(VECTORS_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let mut header = [0u8; HEADER_LEN];
        fs::File::open(&path)
            .and_then(|mut file| file.read_exact(&mut header))
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => {
                    StoreError::CorruptPersistentState(format!("{VECTORS_FILENAME}: truncated header"))
                }
                _ => StoreError::Io(path.clone(), e),
            })?;
        let (dimension, count) = decode_header(&header)?;
        let entries = usize::try_from(count).map_err(|_| {
            StoreError::CorruptPersistentState(format!("{VECTORS_FILENAME}: count {count} too large"))
        })?;
        Ok(Some(IndexStats { entries, dimension }))
    }

    fn encode_vectors(&self) -> Result<Vec<u8>, StoreError> {
        let mut buffer = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        buffer.extend_from_slice(MAGIC);
        buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buffer.extend_from_slice(&header_dimension(self.dimension)?.to_le_bytes());
        buffer.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.vectors {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
        Ok(buffer)
    }
}

/// The header stores the dimension as a u32.
fn header_dimension(dimension: usize) -> Result<u32, StoreError> {
    u32::try_from(dimension).map_err(|_| {
        StoreError::InvalidConfiguration(format!(
            "index dimension {dimension} exceeds the persisted maximum of {}",
            u32::MAX
        ))
    })
}

fn corrupt_vectors(msg: String) -> StoreError {
    StoreError::CorruptPersistentState(format!("{VECTORS_FILENAME}: {msg}"))
}

/// Returns (dimension, count) from a `vectors.bin` header.
fn decode_header(header: &[u8; HEADER_LEN]) -> Result<(usize, u64), StoreError> {
    if &header[0..4] != MAGIC {
        return Err(corrupt_vectors("bad magic".into()));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(corrupt_vectors(format!("format version {version}, expected {FORMAT_VERSION}")));
    }
    let dimension = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&header[12..20]);
    let count = u64::from_le_bytes(count_bytes);
    if dimension == 0 {
        return Err(corrupt_vectors("zero dimension".into()));
    }
    Ok((dimension, count))
}

fn decode_vectors(bytes: &[u8]) -> Result<(usize, Vec<f32>), StoreError> {
    if bytes.len() < HEADER_LEN {
        return Err(corrupt_vectors(format!("truncated header ({} bytes)", bytes.len())));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    let mut fixed = [0u8; HEADER_LEN];
    fixed.copy_from_slice(header);
    let (dimension, count) = decode_header(&fixed)?;

    let expected_len = usize::try_from(count)
        .ok()
        .and_then(|c| c.checked_mul(dimension))
        .and_then(|n| n.checked_mul(4));
    if expected_len != Some(payload.len()) {
        return Err(corrupt_vectors(format!(
            "header declares {count} x {dimension} values but payload has {} bytes",
            payload.len()
        )));
    }

    let vectors = payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((dimension, vectors))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = fs::File::create(path).map_err(|e| StoreError::Io(path.to_path_buf(), e))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| StoreError::Io(path.to_path_buf(), e))
}

fn rename(from: &Path, to: &Path) -> Result<(), StoreError> {
    fs::rename(from, to).map_err(|e| StoreError::Io(to.to_path_buf(), e))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("dimension mismatch ({context}): expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("no persisted index in {0}")]
    NoPersistedState(PathBuf),
    #[error("corrupt persisted index: {0}")]
    CorruptPersistentState(String),
    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, io::Error),
    #[error("failed to serialize records: {0}")]
    Serialize(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> ChunkRecord {
        ChunkRecord {
            text: text.to_string(),
            source: "test".to_string(),
            sequence: 1,
            title: None,
            external_id: None,
        }
    }

    fn abc_index() -> VectorIndex {
        let mut index = VectorIndex::new(3).unwrap();
        index
            .append(
                vec![record("A"), record("B"), record("C")],
                &[vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![5.0, 5.0, 5.0]],
            )
            .unwrap();
        index
    }

    fn texts(records: &[ChunkRecord]) -> Vec<&str> {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn new_rejects_zero_dimension() {
        assert!(matches!(
            VectorIndex::new(0),
            Err(StoreError::InvalidConfiguration(_))
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn new_rejects_dimension_too_wide_for_header() {
        assert!(matches!(
            VectorIndex::new(u32::MAX as usize + 1),
            Err(StoreError::InvalidConfiguration(_))
        ));
        assert_eq!(VectorIndex::new(u32::MAX as usize).unwrap().dimension(), u32::MAX as usize);
    }

    #[test]
    fn truncate_drops_trailing_entries() {
        let mut index = abc_index();
        index.truncate(1);
        assert_eq!(texts(index.records()), vec!["A"]);
        assert_eq!(index.embedding(0), Some(&[0.0, 0.0, 0.0][..]));
        assert_eq!(index.embedding(1), None);
    }

    #[test]
    fn peek_reads_header_only() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(VectorIndex::peek(dir.path()).unwrap(), None);
        abc_index().persist(dir.path()).unwrap();
        assert_eq!(
            VectorIndex::peek(dir.path()).unwrap(),
            Some(IndexStats {
                entries: 3,
                dimension: 3
            })
        );

        let path = dir.path().join(VECTORS_FILENAME);
        fs::write(&path, b"RDVX").unwrap();
        assert!(matches!(
            VectorIndex::peek(dir.path()),
            Err(StoreError::CorruptPersistentState(_))
        ));
    }

    #[test]
    fn search_nearest_first() {
        let index = abc_index();
        let hits = index.search_scored(&[0.1, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.text, "A");
        assert_eq!(hits[1].record.text, "B");
        assert!((hits[0].distance - 0.01).abs() < 1e-6);
        assert!((hits[1].distance - 0.81).abs() < 1e-6);
    }

    #[test]
    fn search_returns_all_when_top_k_exceeds_len() {
        let index = abc_index();
        let found = index.search(&[4.0, 4.0, 4.0], 10).unwrap();
        assert_eq!(texts(&found), vec!["C", "B", "A"]);
    }

    #[test]
    fn search_empty_index() {
        let index = VectorIndex::new(3).unwrap();
        assert!(index.search(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(index.search(&[0.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn search_ties_prefer_earlier_insert() {
        let mut index = VectorIndex::new(2).unwrap();
        index
            .append(
                vec![record("first"), record("second"), record("third")],
                &[vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
            )
            .unwrap();
        let found = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(texts(&found), vec!["first", "second", "third"]);
    }

    #[test]
    fn search_finds_exact_match() {
        let index = abc_index();
        let query = index.embedding(2).unwrap().to_vec();
        let hits = index.search_scored(&query, 1).unwrap();
        assert_eq!(hits[0].record.text, "C");
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn search_rejects_wrong_query_length() {
        let index = abc_index();
        assert!(matches!(
            index.search(&[0.0, 0.0], 1),
            Err(StoreError::DimensionMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn search_rejects_zero_top_k() {
        let index = abc_index();
        assert!(matches!(
            index.search(&[0.0, 0.0, 0.0], 0),
            Err(StoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn append_rejects_wrong_dimension_without_partial_write() {
        let mut index = abc_index();
        let err = index
            .append(
                vec![record("D"), record("E")],
                &[vec![1.0, 1.0, 1.0], vec![1.0, 1.0]],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 3, actual: 2, .. }));
        assert_eq!(index.len(), 3);
        assert_eq!(index.records().len(), 3);
    }

    #[test]
    fn append_rejects_count_mismatch() {
        let mut index = abc_index();
        let err = index
            .append(vec![record("D"), record("E")], &[vec![1.0, 1.0, 1.0]])
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn append_twice_duplicates() {
        let mut index = VectorIndex::new(2).unwrap();
        for _ in 0..2 {
            index.append(vec![record("dup")], &[vec![1.0, 2.0]]).unwrap();
        }
        assert_eq!(index.len(), 2);
        assert_eq!(index.embedding(0), index.embedding(1));
    }

    #[test]
    fn persist_and_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let index = abc_index();
        index.persist(dir.path()).unwrap();

        let restored = VectorIndex::restore(dir.path(), 3).unwrap();
        assert_eq!(restored, index);
        assert_eq!(
            restored.search_scored(&[0.1, 0.0, 0.0], 2).unwrap(),
            index.search_scored(&[0.1, 0.0, 0.0], 2).unwrap()
        );
        assert!(!dir.path().join("vectors.bin.tmp").exists());
    }

    #[test]
    fn persist_overwrites_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = abc_index();
        index.persist(dir.path()).unwrap();
        index.append(vec![record("D")], &[vec![2.0, 2.0, 2.0]]).unwrap();
        index.persist(dir.path()).unwrap();
        assert_eq!(VectorIndex::restore(dir.path(), 3).unwrap().len(), 4);
    }

    #[test]
    fn restore_empty_dir_is_not_corruption() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VectorIndex::restore(dir.path(), 3),
            Err(StoreError::NoPersistedState(_))
        ));
        let opened = VectorIndex::open(dir.path(), 3).unwrap();
        assert!(opened.is_empty());
        assert_eq!(opened.dimension(), 3);
    }

    #[test]
    fn restore_detects_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        abc_index().persist(dir.path()).unwrap();
        fs::remove_file(dir.path().join(RECORDS_FILENAME)).unwrap();
        assert!(matches!(
            VectorIndex::restore(dir.path(), 3),
            Err(StoreError::CorruptPersistentState(_))
        ));
        assert!(matches!(
            VectorIndex::open(dir.path(), 3),
            Err(StoreError::CorruptPersistentState(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        abc_index().persist(dir.path()).unwrap();
        fs::remove_file(dir.path().join(VECTORS_FILENAME)).unwrap();
        assert!(matches!(
            VectorIndex::restore(dir.path(), 3),
            Err(StoreError::CorruptPersistentState(_))
        ));
    }

    #[test]
    fn restore_detects_count_disagreement() {
        let older = tempfile::tempdir().unwrap();
        let newer = tempfile::tempdir().unwrap();
        let mut index = abc_index();
        index.persist(older.path()).unwrap();
        index.append(vec![record("D")], &[vec![2.0, 2.0, 2.0]]).unwrap();
        index.persist(newer.path()).unwrap();

        // New vectors next to stale records, as after a crash between the two renames.
        fs::copy(
            newer.path().join(VECTORS_FILENAME),
            older.path().join(VECTORS_FILENAME),
        )
        .unwrap();
        assert!(matches!(
            VectorIndex::restore(older.path(), 3),
            Err(StoreError::CorruptPersistentState(_))
        ));
    }

    #[test]
    fn restore_detects_dimension_change() {
        let dir = tempfile::tempdir().unwrap();
        abc_index().persist(dir.path()).unwrap();
        assert!(matches!(
            VectorIndex::restore(dir.path(), 4),
            Err(StoreError::CorruptPersistentState(_))
        ));
    }

    #[test]
    fn restore_detects_truncated_vectors() {
        let dir = tempfile::tempdir().unwrap();
        abc_index().persist(dir.path()).unwrap();
        let path = dir.path().join(VECTORS_FILENAME);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();
        assert!(matches!(
            VectorIndex::restore(dir.path(), 3),
            Err(StoreError::CorruptPersistentState(_))
        ));
    }

    #[test]
    fn restore_detects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        abc_index().persist(dir.path()).unwrap();
        let path = dir.path().join(VECTORS_FILENAME);
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] = 0;
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            VectorIndex::restore(dir.path(), 3),
            Err(StoreError::CorruptPersistentState(_))
        ));
    }
}
