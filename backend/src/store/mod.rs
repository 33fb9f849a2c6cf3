//! Document store for validated catalog records.
//!
//! The catalog only needs two things from a store: a snapshot of every
//! record for browsing, and an append for newly accepted submissions.
//! [`CatalogStore`] captures that contract; callers own the store and pass
//! it to [`crate::catalog::Catalog`] explicitly.
//!
//! - [`JsonDirStore`] - one pretty-printed `<slug>.json` document per record
//!
//! Names are unique by exact value. The slug only names the document, and a
//! numeric suffix (`<slug>-2.json`) keeps distinct names that share a slug
//! apart.
//! - [`MemoryStore`] - in-process store for tests and ephemeral servers

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::DatasetMetadataRecord;
use crate::schema;

/// Directory where records are stored (relative to current dir)
pub const DEFAULT_DATA_DIR: &str = ".umud/datasets";

static DOCUMENT_VALIDATOR: Lazy<Validator> = Lazy::new(|| {
    jsonschema::draft7::new(&schema::document_schema()).expect("Invalid generated schema")
});

/// Serializes the name check and the document write of concurrent inserts.
static INSERT_LOCK: Mutex<()> = Mutex::new(());

/// Storage backend of the catalog.
pub trait CatalogStore: Send + Sync {
    /// Every stored record, in a stable order.
    fn snapshot(&self) -> StoreResult<Vec<DatasetMetadataRecord>>;

    /// Append one validated record, returning its document id.
    fn insert(&self, record: DatasetMetadataRecord) -> StoreResult<String>;
}

/// Document id of a dataset name: lowercase, runs of non-alphanumerics
/// collapsed to `-`. Several names can share one id; see [`numbered_id`].
pub fn document_id(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// The `n`-th document id for a slug: `slug`, `slug-2`, `slug-3`, ...
pub fn numbered_id(slug: &str, n: usize) -> String {
    if n <= 1 {
        slug.to_string()
    } else {
        format!("{}-{}", slug, n)
    }
}

/// Create `path` (it must not exist yet) and fill it. A file that was
/// created but not completely written is removed again, so a failed write
/// never leaves a document behind.
fn create_document(path: &Path, fill: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = fill(&mut file).and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "cannot remove partly written document");
        }
        return Err(e);
    }
    Ok(())
}

// =============================================================================
// JSON Directory Store
// =============================================================================

/// Stores each record as a JSON document in a directory.
///
/// The directory is read on every snapshot, so documents dropped in by hand
/// (the e-mail submission path) show up without a restart. Documents that do
/// not parse or do not match [`schema::document_schema`] are skipped.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Store rooted at [`DEFAULT_DATA_DIR`].
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_DATA_DIR)
    }

    /// Store rooted at a custom directory. The directory is created on the
    /// first insert.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(path: &Path) -> Option<DatasetMetadataRecord> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read stored document");
                return None;
            }
        };
        let doc: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stored document is not JSON");
                return None;
            }
        };

        let problems: Vec<String> = DOCUMENT_VALIDATOR
            .iter_errors(&doc)
            .map(|e| e.to_string())
            .collect();
        if !problems.is_empty() {
            warn!(
                path = %path.display(),
                problems = %problems.join("; "),
                "skipping stored document that does not match the record schema"
            );
            return None;
        }

        match serde_json::from_value(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stored document does not deserialize");
                None
            }
        }
    }
}

impl Default for JsonDirStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for JsonDirStore {
    fn snapshot(&self) -> StoreResult<Vec<DatasetMetadataRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .collect();
        paths.sort();

        let records: Vec<_> = paths.iter().filter_map(|p| Self::load(p)).collect();
        debug!(dir = %self.dir.display(), records = records.len(), "loaded catalog snapshot");
        Ok(records)
    }

    fn insert(&self, record: DatasetMetadataRecord) -> StoreResult<String> {
        let _guard = INSERT_LOCK.lock().map_err(poisoned)?;
        fs::create_dir_all(&self.dir)?;

        if self.snapshot()?.iter().any(|r| r.name == record.name) {
            return Err(StoreError::Duplicate(record.name));
        }

        let slug = document_id(&record.name);
        let content = serde_json::to_string_pretty(&record)?;

        let mut n = 1;
        loop {
            let id = numbered_id(&slug, n);
            let path = self.dir.join(format!("{}.json", id));
            match create_document(&path, |file| file.write_all(content.as_bytes())) {
                Ok(()) => {
                    info!(id = %id, path = %path.display(), "stored dataset record");
                    return Ok(id);
                }
                // Taken by another name with the same slug, or by an unreadable document.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Keeps records in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<DatasetMetadataRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with records, bypassing the duplicate check.
    pub fn with_records(records: Vec<DatasetMetadataRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("store lock poisoned".into())
}

impl CatalogStore for MemoryStore {
    fn snapshot(&self) -> StoreResult<Vec<DatasetMetadataRecord>> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }

    fn insert(&self, record: DatasetMetadataRecord) -> StoreResult<String> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.iter().any(|r| r.name == record.name) {
            return Err(StoreError::Duplicate(record.name));
        }
        let slug = document_id(&record.name);
        let sharing = records.iter().filter(|r| document_id(&r.name) == slug).count();
        let id = numbered_id(&slug, sharing + 1);
        records.push(record);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record_with, sample_record};
    use tempfile::tempdir;

    use std::collections::BTreeSet;

    fn stored_names(store: &dyn CatalogStore) -> BTreeSet<String> {
        store.snapshot().unwrap().into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_document_id() {
        assert_eq!(document_id("DeepACSA_2022"), "deepacsa-2022");
        assert_eq!(document_id("  DL Track__US_2023 "), "dl-track-us-2023");
        assert_eq!(numbered_id("deepacsa-2022", 1), "deepacsa-2022");
        assert_eq!(numbered_id("deepacsa-2022", 3), "deepacsa-2022-3");
    }

    #[test]
    fn test_json_dir_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::with_dir(dir.path().join("datasets"));
        assert!(store.snapshot().unwrap().is_empty());

        let id = store.insert(sample_record()).unwrap();
        assert_eq!(id, "deepacsa-2022");
        assert!(dir.path().join("datasets/deepacsa-2022.json").exists());

        let records = store.snapshot().unwrap();
        assert_eq!(records, vec![sample_record()]);
    }

    #[test]
    fn test_json_dir_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::with_dir(dir.path());
        store.insert(sample_record()).unwrap();

        let err = store.insert(sample_record()).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(name) if name == "DeepACSA_2022"));
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_json_dir_snapshot_is_sorted() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::with_dir(dir.path());
        store.insert(record_with("Zeta_2020", &["Soleus"], &[])).unwrap();
        store.insert(record_with("Alpha_2021", &["Soleus"], &[])).unwrap();

        let names: Vec<_> = store.snapshot().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alpha_2021", "Zeta_2020"]);
    }

    #[test]
    fn test_json_dir_skips_bad_documents() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::with_dir(dir.path());
        store.insert(sample_record()).unwrap();

        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("partial.json"), r#"{"name": "Half_2020"}"#).unwrap();
        let mut bad_vocab = serde_json::to_value(record_with("Odd_2020", &["Bicep"], &[])).unwrap();
        bad_vocab["license"] = "MIT-ish".into();
        fs::write(dir.path().join("odd.json"), bad_vocab.to_string()).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = store.snapshot().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "DeepACSA_2022");
    }

    #[test]
    fn test_json_dir_names_sharing_a_slug() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::with_dir(dir.path());

        let first = store.insert(record_with("Deep.ACSA_2022", &["Soleus"], &[])).unwrap();
        let second = store.insert(record_with("Deep-ACSA_2022", &["Soleus"], &[])).unwrap();
        assert_eq!(first, "deep-acsa-2022");
        assert_eq!(second, "deep-acsa-2022-2");
        assert!(dir.path().join("deep-acsa-2022-2.json").exists());

        store.insert(record_with("DeepACSA_2022", &["Soleus"], &[])).unwrap();
        store.insert(record_with("deepacsa_2022", &["Soleus"], &[])).unwrap();

        let expected: BTreeSet<String> =
            ["Deep.ACSA_2022", "Deep-ACSA_2022", "DeepACSA_2022", "deepacsa_2022"]
                .into_iter()
                .map(String::from)
                .collect();
        assert_eq!(stored_names(&store), expected);

        let err = store.insert(record_with("Deep-ACSA_2022", &["Soleus"], &[])).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(name) if name == "Deep-ACSA_2022"));
        assert_eq!(store.snapshot().unwrap().len(), 4);
    }

    #[test]
    fn test_failed_write_leaves_no_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deepacsa-2022.json");

        let err = create_document(&path, |file| {
            file.write_all(br#"{"name": "DeepA"#)?;
            Err(io::Error::other("no space left on device"))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "no space left on device");
        assert!(!path.exists());

        let store = JsonDirStore::with_dir(dir.path());
        assert_eq!(store.insert(sample_record()).unwrap(), "deepacsa-2022");
        assert_eq!(store.snapshot().unwrap(), vec![sample_record()]);
    }

    #[test]
    fn test_unreadable_document_does_not_block_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("deepacsa-2022.json"), "").unwrap();

        let store = JsonDirStore::with_dir(dir.path());
        assert_eq!(store.insert(sample_record()).unwrap(), "deepacsa-2022-2");
        assert_eq!(store.snapshot().unwrap(), vec![sample_record()]);
    }

    #[test]
    fn test_memory_store_names_sharing_a_slug() {
        let store = MemoryStore::new();
        assert_eq!(store.insert(record_with("Deep.ACSA_2022", &["Soleus"], &[])).unwrap(), "deep-acsa-2022");
        assert_eq!(store.insert(record_with("Deep-ACSA_2022", &["Soleus"], &[])).unwrap(), "deep-acsa-2022-2");
        store.insert(record_with("DeepACSA_2022", &["Soleus"], &[])).unwrap();
        store.insert(record_with("deepacsa_2022", &["Soleus"], &[])).unwrap();
        assert_eq!(stored_names(&store).len(), 4);

        assert!(matches!(
            store.insert(record_with("deepacsa_2022", &["Soleus"], &[])),
            Err(StoreError::Duplicate(name)) if name == "deepacsa_2022"
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.insert(record_with("A_2020", &["Soleus"], &[])).unwrap();
        store.insert(record_with("B_2021", &["Soleus"], &[])).unwrap();
        assert!(matches!(
            store.insert(record_with("A_2020", &["Gastrocnemius Medialis"], &[])),
            Err(StoreError::Duplicate(_))
        ));

        let names: Vec<_> = store.snapshot().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A_2020", "B_2021"]);
    }
}
