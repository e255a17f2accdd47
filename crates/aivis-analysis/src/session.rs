use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::report::AnalysisReport;

/// Externally owned cache of finished runs, keyed by run id.
pub trait SessionStore: Send + Sync {
    fn save(&self, report: Arc<AnalysisReport>);

    fn get(&self, run_id: Uuid) -> Option<Arc<AnalysisReport>>;

    /// Most recently saved report.
    fn latest(&self) -> Option<Arc<AnalysisReport>>;
}

#[derive(Default)]
struct Inner {
    reports: HashMap<Uuid, Arc<AnalysisReport>>,
    latest: Option<Uuid>,
}

/// Process-lifetime store; nothing is persisted.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Inner>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read(|inner| inner.reports.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&guard)
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, report: Arc<AnalysisReport>) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.latest = Some(report.run_id);
        inner.reports.insert(report.run_id, report);
    }

    fn get(&self, run_id: Uuid) -> Option<Arc<AnalysisReport>> {
        self.read(|inner| inner.reports.get(&run_id).cloned())
    }

    fn latest(&self) -> Option<Arc<AnalysisReport>> {
        self.read(|inner| inner.latest.and_then(|id| inner.reports.get(&id).cloned()))
    }
}
