//! Persistent store adapters for the cases and case-studies snapshots.
//!
//! [`JsonFileStore`] keeps each store in one JSON document on disk,
//! written via a temp file + rename so a crashed save never leaves a
//! half-written snapshot. [`MemoryStore`] backs tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use caselib_core::{
    defaults, CaseLibraryStore, CaseStudiesStore, CasesStore, Error, Result,
};

// =============================================================================
// JSON FILE STORE
// =============================================================================

/// File-backed store: one JSON snapshot per store.
pub struct JsonFileStore {
    cases_path: PathBuf,
    case_studies_path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over explicit snapshot paths.
    pub fn new(cases_path: impl Into<PathBuf>, case_studies_path: impl Into<PathBuf>) -> Self {
        Self {
            cases_path: cases_path.into(),
            case_studies_path: case_studies_path.into(),
        }
    }

    /// Create a store over the default snapshot paths.
    pub fn with_default_paths() -> Self {
        Self::new(defaults::CASES_PATH, defaults::CASE_STUDIES_PATH)
    }

    /// Missing files load as empty snapshots (first run); anything else
    /// unreadable or unparsable is a hard error.
    async fn load_json<T>(&self, path: &Path, empty: impl FnOnce() -> T) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Snapshot missing, starting empty");
                return Ok(empty());
            }
            Err(e) => {
                return Err(Error::Store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::StoreInconsistency(format!("malformed snapshot {}: {}", path.display(), e))
        })
    }

    async fn save_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Store(format!("failed to create {}: {}", parent.display(), e)))?;
            }
        }

        let json = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| Error::Store(format!("failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::Store(format!("failed to replace {}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = json.len(), "Snapshot saved");
        Ok(())
    }
}

#[async_trait]
impl CaseLibraryStore for JsonFileStore {
    async fn load_cases(&self) -> Result<CasesStore> {
        self.load_json(&self.cases_path, CasesStore::empty).await
    }

    async fn save_cases(&self, store: &CasesStore) -> Result<()> {
        self.save_json(&self.cases_path, &store.stamped()).await
    }

    async fn load_case_studies(&self) -> Result<CaseStudiesStore> {
        self.load_json(&self.case_studies_path, CaseStudiesStore::empty)
            .await
    }

    async fn save_case_studies(&self, store: &CaseStudiesStore) -> Result<()> {
        self.save_json(&self.case_studies_path, &store.stamped())
            .await
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    cases: Mutex<Option<CasesStore>>,
    case_studies: Mutex<Option<CaseStudiesStore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing cases snapshot.
    pub fn with_cases(self, cases: CasesStore) -> Self {
        *self.cases.lock().unwrap() = Some(cases);
        self
    }

    /// Current cases snapshot (empty if never saved).
    pub fn cases(&self) -> CasesStore {
        self.cases
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(CasesStore::empty)
    }

    /// Current case-studies snapshot (empty if never saved).
    pub fn case_studies(&self) -> CaseStudiesStore {
        self.case_studies
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(CaseStudiesStore::empty)
    }
}

#[async_trait]
impl CaseLibraryStore for MemoryStore {
    async fn load_cases(&self) -> Result<CasesStore> {
        Ok(self.cases())
    }

    async fn save_cases(&self, store: &CasesStore) -> Result<()> {
        *self.cases.lock().unwrap() = Some(store.stamped());
        Ok(())
    }

    async fn load_case_studies(&self) -> Result<CaseStudiesStore> {
        Ok(self.case_studies())
    }

    async fn save_case_studies(&self, store: &CaseStudiesStore) -> Result<()> {
        *self.case_studies.lock().unwrap() = Some(store.stamped());
        Ok(())
    }
}
