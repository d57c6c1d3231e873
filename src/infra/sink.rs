//! Result sink that stores applied results.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{ResultSink, TargetId};

/// Records every applied result; clones share the same storage.
#[derive(Debug)]
pub struct RecordingSink<R> {
    applied: Arc<Mutex<Vec<(TargetId, R)>>>,
}

impl<R> Default for RecordingSink<R> {
    fn default() -> Self {
        Self {
            applied: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<R> Clone for RecordingSink<R> {
    fn clone(&self) -> Self {
        Self {
            applied: Arc::clone(&self.applied),
        }
    }
}

impl<R: Clone> RecordingSink<R> {
    /// Snapshot of applied results, oldest first.
    #[must_use]
    pub fn applied(&self) -> Vec<(TargetId, R)> {
        self.applied.lock().clone()
    }
}

impl<R> RecordingSink<R> {
    /// Targets that received a result, oldest first.
    #[must_use]
    pub fn targets(&self) -> Vec<TargetId> {
        self.applied.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Number of applied results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.applied.lock().len()
    }

    /// Whether nothing was applied yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.lock().is_empty()
    }
}

impl<R: Send> ResultSink<R> for RecordingSink<R> {
    fn apply(&mut self, target: TargetId, result: R) {
        self.applied.lock().push((target, result));
    }
}
