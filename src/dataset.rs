//! The dataset store.
//!
//! Holds the passenger records and the loading flag. The record set is
//! written exactly once, by the completion of a single asynchronous load,
//! and published as an immutable snapshot. Derived views are computed from
//! the current snapshot on every call.

use crate::analysis::{self, AgeBin, Chart, RecoveryOutcome, SexRate, SurvivalSplit, TierRate};
use crate::error::SourceError;
use crate::models::{Dataset, RawRow, Record};
use crate::source::RowSource;
use crate::storage::{self, Storage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Storage key of the session snapshot.
pub const SESSION_KEY: &str = "dashboard";

/// Owner of the loaded passenger records.
pub struct DatasetStore {
    state: Arc<watch::Sender<Arc<Dataset>>>,
    storage: Arc<dyn Storage>,
    load_started: AtomicBool,
}

impl DatasetStore {
    /// Create a store, restoring a finished load from session storage if one
    /// exists.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let restored = storage::restore::<Dataset>(storage.as_ref(), SESSION_KEY)
            .filter(|dataset| !dataset.is_loading);

        let already_loaded = restored.is_some();
        let dataset = match restored {
            Some(dataset) => {
                info!(
                    "Restored {} records from session storage",
                    dataset.records.len()
                );
                dataset
            }
            None => Dataset::default(),
        };

        let (state, _) = watch::channel(Arc::new(dataset));

        Self {
            state: Arc::new(state),
            storage,
            load_started: AtomicBool::new(already_loaded),
        }
    }

    /// Start the one-shot load.
    ///
    /// The fetch runs on a spawned task; its completion flips `is_loading`
    /// whether it succeeds or fails. Returns `None` without doing anything if
    /// a load was already started or the dataset was restored.
    pub fn load<S>(&self, source: S) -> Option<JoinHandle<()>>
    where
        S: RowSource + 'static,
    {
        if self.load_started.swap(true, Ordering::SeqCst) {
            warn!("Dataset already loaded; ignoring load request");
            return None;
        }

        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);

        Some(tokio::spawn(async move {
            let result = source.fetch().await;
            let dataset = complete_load(result);
            storage::persist(storage.as_ref(), SESSION_KEY, &dataset);
            state.send_replace(Arc::new(dataset));
        }))
    }

    /// True until the load has completed or failed.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.state.borrow())
    }

    /// Receiver notified once the load completes.
    #[allow(dead_code)] // Hook for reactive renderers
    pub fn subscribe(&self) -> watch::Receiver<Arc<Dataset>> {
        self.state.subscribe()
    }

    /// Wait until the dataset is no longer loading and return it.
    ///
    /// Never resolves if no load is ever started on a fresh store.
    pub async fn wait_ready(&self) -> Arc<Dataset> {
        let mut receiver = self.state.subscribe();
        let ready = match receiver.wait_for(|dataset| !dataset.is_loading).await {
            Ok(dataset) => Arc::clone(&dataset),
            Err(_) => self.snapshot(),
        };
        ready
    }

    pub fn survival_split(&self) -> SurvivalSplit {
        analysis::survival_split(&self.snapshot().records)
    }

    pub fn survival_rate_by_class_tier(&self) -> Vec<TierRate> {
        analysis::survival_rate_by_class_tier(&self.snapshot().records)
    }

    pub fn survival_rate_by_sex(&self) -> Vec<SexRate> {
        analysis::survival_rate_by_sex(&self.snapshot().records)
    }

    pub fn age_binned_outcome(&self) -> Vec<AgeBin> {
        analysis::age_binned_outcome(&self.snapshot().records)
    }

    pub fn recovery_outcome(&self) -> RecoveryOutcome {
        analysis::recovery_outcome(&self.snapshot().records)
    }

    /// Every chart with its display options.
    pub fn charts(&self) -> Vec<Chart> {
        analysis::dashboard_charts(&self.snapshot().records)
    }
}

/// Turn a fetch result into the final dataset state.
///
/// Failures are logged and produce an empty, loaded dataset.
fn complete_load(result: Result<Vec<RawRow>, SourceError>) -> Dataset {
    match result {
        Ok(rows) => {
            let total = rows.len();
            let records: Vec<Record> = rows.iter().filter_map(Record::from_row).collect();

            if records.len() < total {
                debug!("Dropped {} rows without an outcome", total - records.len());
            }
            info!("Loaded {} passenger records", records.len());

            Dataset::loaded(records)
        }
        Err(e) => {
            error!("Error loading dataset: {}", e);
            Dataset::loaded(Vec::new())
        }
    }
}
