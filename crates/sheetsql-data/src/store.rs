//! Storage collaborator traits
//!
//! A [`WorkbookStore`] knows where a workbook lives. It loads the whole grid
//! in one call and hands out a [`WorkbookWriter`] to replace it.

use std::cell::RefCell;
use std::rc::Rc;

use sheetsql_model::Workbook;

use crate::error::{DataError, Result};

/// Where a workbook is persisted, expressed in relational terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreLocation {
    /// Containing directory of the workbook
    pub catalog: Option<String>,
    /// File name of the workbook
    pub schema: Option<String>,
}

/// Source and destination of a workbook
pub trait WorkbookStore {
    /// Read the complete workbook
    fn load(&self) -> Result<Workbook>;

    /// Open a handle that replaces the persisted workbook
    fn open_writer(&self) -> Result<Box<dyn WorkbookWriter + '_>>;

    /// Catalog/schema names reported for this store
    fn location(&self) -> StoreLocation;

    /// Whether [`WorkbookStore::open_writer`] can succeed at all
    fn is_writable(&self) -> bool {
        true
    }
}

/// Write handle obtained from a [`WorkbookStore`]
///
/// `write` either leaves the destination untouched or replaces it as a
/// whole. `close` releases the handle and may fail on its own.
pub trait WorkbookWriter {
    /// Encode and persist the workbook
    fn write(&mut self, workbook: &Workbook) -> Result<()>;

    /// Release the handle
    fn close(self: Box<Self>) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    workbook: Workbook,
    writes: usize,
    write_failure: Option<String>,
    close_failure: Option<String>,
}

/// A workbook kept in memory
///
/// Clones share the same workbook, so a caller can keep one handle to
/// inspect what another handle's session committed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    /// Create a store holding a workbook
    pub fn new(workbook: Workbook) -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState {
                workbook,
                ..MemoryState::default()
            })),
        }
    }

    /// A copy of the currently stored workbook
    pub fn workbook(&self) -> Workbook {
        self.state.borrow().workbook.clone()
    }

    /// Number of completed writes
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Make every following write fail with the given message
    pub fn set_write_failure(&self, message: Option<&str>) {
        self.state.borrow_mut().write_failure = message.map(str::to_string);
    }

    /// Make every following close fail with the given message
    pub fn set_close_failure(&self, message: Option<&str>) {
        self.state.borrow_mut().close_failure = message.map(str::to_string);
    }
}

impl WorkbookStore for MemoryStore {
    fn load(&self) -> Result<Workbook> {
        Ok(self.workbook())
    }

    fn open_writer(&self) -> Result<Box<dyn WorkbookWriter + '_>> {
        Ok(Box::new(MemoryWriter { store: self }))
    }

    fn location(&self) -> StoreLocation {
        StoreLocation::default()
    }
}

struct MemoryWriter<'a> {
    store: &'a MemoryStore,
}

impl WorkbookWriter for MemoryWriter<'_> {
    fn write(&mut self, workbook: &Workbook) -> Result<()> {
        let mut state = self.store.state.borrow_mut();
        if let Some(message) = &state.write_failure {
            return Err(DataError::Other(message.clone()));
        }
        state.workbook = workbook.clone();
        state.writes += 1;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        match &self.store.state.borrow().close_failure {
            Some(message) => Err(DataError::Other(message.clone())),
            None => Ok(()),
        }
    }
}
