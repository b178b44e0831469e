//! Per-run state container

use crate::state::index::KnownIndex;
use crate::storage::PostRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// State owned by one crawl run
///
/// Built fresh at run start from the stored posts and dropped when the run
/// ends, so nothing leaks from one run into the next. The index sits behind
/// a single mutex; every mutation goes through [`RunContext::lock_index`].
#[derive(Debug, Clone)]
pub struct RunContext {
    index: Arc<Mutex<KnownIndex>>,
}

impl RunContext {
    pub fn new(known: HashMap<u64, PostRecord>) -> Self {
        Self {
            index: Arc::new(Mutex::new(KnownIndex::from_known(known))),
        }
    }

    /// Locks the index
    ///
    /// Admissions cannot panic halfway, so a poisoned lock still guards a
    /// consistent index and is recovered.
    pub fn lock_index(&self) -> MutexGuard<'_, KnownIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Posts admitted during this run, sorted by id
    pub fn take_fresh(&self) -> Vec<PostRecord> {
        self.lock_index().take_fresh()
    }

    pub fn known_len(&self) -> usize {
        self.lock_index().len()
    }
}
