//! Process-wide dataset cache.
//!
//! The dataset is loaded on first use and then shared by reference for the
//! rest of the process. There is no invalidation: the sources are not
//! re-queried once loaded.

use std::future::Future;
use std::sync::Arc;

use landslide_viewer_pipeline::Dataset;
use tokio::sync::OnceCell;

use crate::SourceError;
use crate::config::AppConfig;

/// Lazily initialized, read-only dataset handle.
#[derive(Debug, Default)]
pub struct DatasetCache {
    cell: OnceCell<Arc<Dataset>>,
}

impl DatasetCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the cached dataset, loading it from `config` on first use.
    ///
    /// Concurrent first callers wait on a single load. A failed load leaves
    /// the cache empty so the next caller retries.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if loading fails.
    pub async fn get_or_load(&self, config: &AppConfig) -> Result<Arc<Dataset>, SourceError> {
        self.get_or_try_init(|| async { crate::load_dataset(config).await.map(Arc::new) })
            .await
    }

    /// Returns the cached dataset, initializing it with `init` on first use.
    ///
    /// # Errors
    ///
    /// Returns whatever `init` returns.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<Dataset>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<Dataset>, SourceError>>,
    {
        self.cell.get_or_try_init(init).await.map(Arc::clone)
    }

    /// The dataset, if already loaded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landslide_viewer_incident_models::{ColumnMapping, RecordTable};
    use landslide_viewer_spatial::BoundarySet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn empty_dataset() -> Arc<Dataset> {
        Arc::new(Dataset::new(
            &RecordTable::default(),
            ColumnMapping::default(),
            BoundarySet::new(Vec::new()),
        ))
    }

    #[tokio::test]
    async fn loads_once_and_shares() {
        let cache = DatasetCache::new();
        let loads = AtomicUsize::new(0);

        let first = cache
            .get_or_try_init(|| async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(empty_dataset())
            })
            .await
            .unwrap();
        let second = cache
            .get_or_try_init(|| async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(empty_dataset())
            })
            .await
            .unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = DatasetCache::new();

        let failed = cache
            .get_or_try_init(|| async {
                Err(SourceError::Format {
                    message: "warehouse unavailable".to_string(),
                })
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.get().is_none());

        let loaded = cache.get_or_try_init(|| async { Ok(empty_dataset()) }).await;
        assert!(loaded.is_ok());
        assert!(cache.get().is_some());
    }
}
