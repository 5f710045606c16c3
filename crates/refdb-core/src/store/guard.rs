use super::memory::MemoryState;
use crate::{
    error::InternalError,
    model::{RecordRef, StoredRecord},
};

///
/// DeleteApplyGuard
///
/// Apply-phase guard for an in-memory batch delete.
///
/// All fallible validation completes before the guard is opened; removal
/// itself is mechanical. If application unwinds before `finish`, the guard
/// puts every removed row back (reverse removal order) so no partial batch
/// is ever visible once the write lock is released.
///

pub(super) struct DeleteApplyGuard<'a> {
    state: &'a mut MemoryState,
    removed: Vec<StoredRecord>,
    finished: bool,
}

impl<'a> DeleteApplyGuard<'a> {
    pub(super) const fn new(state: &'a mut MemoryState) -> Self {
        Self {
            state,
            removed: Vec::new(),
            finished: false,
        }
    }

    pub(super) fn remove(&mut self, key: &RecordRef) -> Result<(), InternalError> {
        let stored = self.state.take(key).ok_or_else(|| {
            InternalError::store_invariant(format!(
                "prevalidated delete member vanished during apply: {key}"
            ))
        })?;
        self.removed.push(stored);

        Ok(())
    }

    pub(super) fn finish(mut self) -> Result<Vec<RecordRef>, InternalError> {
        if self.finished {
            return Err(InternalError::store_invariant(
                "delete apply guard invariant violated: finish called twice",
            ));
        }

        self.finished = true;
        let removed = std::mem::take(&mut self.removed);

        Ok(removed.into_iter().map(|stored| stored.record.key).collect())
    }

    fn rollback(&mut self) {
        while let Some(stored) = self.removed.pop() {
            self.state.restore(stored);
        }
    }
}

impl Drop for DeleteApplyGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback();
        }
    }
}
