//! Mutation bookkeeping

use crate::error::{Result, SqlError};

/// A row removed since the last commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedRow {
    /// Sheet the row was removed from
    pub sheet: String,
    /// Zero-based grid index the row had when it was removed
    ///
    /// Later rows move up by one after each deletion, so indices refer to
    /// the grid as it was at that moment.
    pub row: u32,
}

/// Pending mutations of a session
#[derive(Debug, Clone, Default)]
pub struct MutationTracker {
    deleted: Vec<DeletedRow>,
    dirty: bool,
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a row deletion and mark the session dirty
    pub fn record_deletion(&mut self, sheet: impl Into<String>, row: u32) {
        self.deleted.push(DeletedRow {
            sheet: sheet.into(),
            row,
        });
        self.dirty = true;
    }

    /// Whether there are mutations that have not been committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Deletions in the order they happened
    pub fn deleted_rows(&self) -> &[DeletedRow] {
        &self.deleted
    }

    /// Forget every pending mutation (after a successful commit)
    pub fn reset(&mut self) {
        self.deleted.clear();
        self.dirty = false;
    }
}

/// Row-level changes through a result set
///
/// Only deletion is implemented; the other operations report
/// [`SqlError::FeatureNotSupported`].
pub trait Mutable {
    /// Whether the result set accepts mutations
    fn is_updatable(&self) -> bool;

    /// Delete the row under the cursor
    fn delete_row(&mut self) -> Result<()>;

    fn insert_row(&mut self) -> Result<()> {
        Err(SqlError::unsupported("inserting rows"))
    }

    fn update_row(&mut self) -> Result<()> {
        Err(SqlError::unsupported("updating rows"))
    }

    fn move_to_insert_row(&mut self) -> Result<()> {
        Err(SqlError::unsupported("the insert row"))
    }
}
