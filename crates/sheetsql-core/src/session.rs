//! Sessions
//!
//! A [`Session`] owns one loaded workbook and is the factory for result
//! sets. Mutations stay in memory until [`Session::commit`] writes the whole
//! workbook back through its store.

use std::path::Path;

use tracing::{debug, warn};

use sheetsql_data::{FileStore, StoreLocation, WorkbookStore};
use sheetsql_model::Workbook;

use crate::config::{ScrollMode, SessionConfig};
use crate::cursor::Cursor;
use crate::error::{Result, SqlError, Warning};
use crate::formula::{ExpressionEvaluator, FormulaEvaluator};
use crate::metadata::MetadataResolver;
use crate::mutation::MutationTracker;
use crate::query;
use crate::result_set::{Backing, ResultSet};
use crate::statement::PreparedQuery;

/// An open workbook
pub struct Session {
    store: Box<dyn WorkbookStore>,
    config: SessionConfig,
    location: StoreLocation,
    workbook: Workbook,
    evaluator: Box<dyn FormulaEvaluator>,
    tracker: MutationTracker,
    warnings: Vec<Warning>,
    writable: bool,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("location", &self.location)
            .field("sheets", &self.workbook.sheet_names())
            .field("dirty", &self.tracker.is_dirty())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Session {
    /// Load a workbook from a store
    pub fn open(store: Box<dyn WorkbookStore>, config: SessionConfig) -> Result<Self> {
        let workbook = store.load().map_err(SqlError::OpenFailure)?;
        let location = store.location();
        let writable = store.is_writable();
        if !config.read_only && !writable {
            debug!("Store cannot be written back, result sets will not be updatable");
        }
        debug!(
            "Opened workbook with {} sheets (read_only: {})",
            workbook.sheets.len(),
            config.read_only
        );

        Ok(Self {
            store,
            evaluator: Box::new(ExpressionEvaluator::new(config.formulas.mode)),
            config,
            location,
            workbook,
            tracker: MutationTracker::new(),
            warnings: Vec::new(),
            writable,
            closed: false,
        })
    }

    /// Open a workbook file, picking the format from its extension
    pub fn open_path(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self> {
        let store = FileStore::new(path).map_err(SqlError::OpenFailure)?;
        Self::open(Box::new(store), config)
    }

    /// Replace the formula evaluator
    pub fn with_evaluator(mut self, evaluator: Box<dyn FormulaEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(SqlError::SessionClosed)
        } else {
            Ok(())
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The workbook as currently held in memory
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Result<Vec<String>> {
        self.check_open()?;
        Ok(self.workbook.sheet_names())
    }

    /// The sheet name a query selects from
    pub fn native_sql(&self, sql: &str) -> Result<String> {
        self.check_open()?;
        query::sheet_name(sql)
    }

    /// Prepare a query using the configured scroll mode
    pub fn prepare(&self, sql: &str) -> Result<PreparedQuery> {
        self.check_open()?;
        PreparedQuery::new(sql, self.config.cursor.scroll)
    }

    /// Run a query with the configured scroll mode
    pub fn query(&mut self, sql: &str) -> Result<ResultSet<'_>> {
        let scroll = self.config.cursor.scroll;
        self.query_with(sql, scroll)
    }

    /// Run a query with an explicit scroll mode
    pub fn query_with(&mut self, sql: &str, scroll: ScrollMode) -> Result<ResultSet<'_>> {
        self.check_open()?;
        let sheet = query::sheet_name(sql)?;
        self.open_result_set(&sheet, scroll)
    }

    /// Run a prepared query
    pub fn execute(&mut self, query: &PreparedQuery) -> Result<ResultSet<'_>> {
        self.check_open()?;
        debug!(
            "Executing '{}' with {} bound parameters",
            query.sql(),
            query.parameters().len()
        );
        self.open_result_set(query.sheet_name(), query.scroll())
    }

    fn open_result_set(&mut self, sheet_name: &str, scroll: ScrollMode) -> Result<ResultSet<'_>> {
        let sheet = self
            .workbook
            .sheet(sheet_name)
            .ok_or_else(|| SqlError::SheetNotFound(sheet_name.to_string()))?;

        let updatable = !self.config.read_only && self.writable;
        let columns = MetadataResolver::new(self.location.clone(), !updatable).resolve(sheet)?;
        let cursor = Cursor::new(sheet.row_count(), scroll);
        let name = sheet.name.clone();
        debug!(
            "Opened result set on '{}': {} rows, {} columns, {:?}",
            name,
            cursor.row_count(),
            columns.len(),
            scroll
        );

        Ok(ResultSet::open(
            Backing {
                workbook: &mut self.workbook,
                tracker: &mut self.tracker,
                evaluator: self.evaluator.as_ref(),
            },
            name,
            columns,
            cursor,
            &self.config,
            updatable,
        ))
    }

    /// Write the workbook back if it has uncommitted mutations
    ///
    /// A failed write leaves the session dirty. A failure to release the
    /// writer after a successful write is recorded as a warning.
    pub fn commit(&mut self) -> Result<()> {
        self.check_open()?;
        if self.config.read_only {
            return Err(SqlError::unsupported("commit on a read-only session"));
        }
        if !self.tracker.is_dirty() {
            debug!("Nothing to commit");
            return Ok(());
        }

        let mut writer = self.store.open_writer().map_err(SqlError::CommitFailure)?;
        let written = writer.write(&self.workbook);
        let released = writer.close();

        match (written, released) {
            (Err(err), released) => {
                if let Err(close_err) = released {
                    warn!("Failed to release writer after failed commit: {}", close_err);
                }
                return Err(SqlError::CommitFailure(err));
            }
            (Ok(()), Err(close_err)) => {
                warn!("Commit written but writer release failed: {}", close_err);
                self.warnings.push(Warning::with_cause(
                    "failed to release the workbook after commit",
                    &close_err,
                ));
            }
            (Ok(()), Ok(())) => {}
        }

        debug!(
            "Committed {} row deletions",
            self.tracker.deleted_rows().len()
        );
        self.tracker.reset();
        Ok(())
    }

    /// Not supported: there is no transaction log
    pub fn rollback(&mut self) -> Result<()> {
        self.check_open()?;
        Err(SqlError::unsupported("rollback"))
    }

    pub fn set_savepoint(&mut self, _name: Option<&str>) -> Result<()> {
        self.check_open()?;
        Err(SqlError::unsupported("savepoints"))
    }

    pub fn release_savepoint(&mut self, _name: &str) -> Result<()> {
        self.check_open()?;
        Err(SqlError::unsupported("savepoints"))
    }

    pub fn prepare_call(&self, _sql: &str) -> Result<PreparedQuery> {
        self.check_open()?;
        Err(SqlError::unsupported("callable statements"))
    }

    /// Always false: changes are written only by [`Session::commit`]
    pub fn auto_commit(&self) -> bool {
        false
    }

    pub fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        self.check_open()?;
        if enabled {
            return Err(SqlError::unsupported("auto-commit"));
        }
        Ok(())
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub fn is_valid(&self) -> bool {
        !self.closed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Directory holding the workbook
    pub fn catalog(&self) -> Option<&str> {
        self.location.catalog.as_deref()
    }

    /// File name of the workbook
    pub fn schema(&self) -> Option<&str> {
        self.location.schema.as_deref()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    /// Close the session, discarding uncommitted mutations
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.tracker.is_dirty() {
            warn!(
                "Closing session with {} uncommitted row deletions",
                self.tracker.deleted_rows().len()
            );
        }
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Coercible;
    use crate::cursor::Navigable;
    use crate::mutation::Mutable;
    use sheetsql_data::{MemoryStore, WorkbookWriter};
    use sheetsql_model::{Cell, Row, Sheet};

    fn sample() -> Workbook {
        Workbook::new().with_sheet(
            Sheet::new("Sheet1")
                .with_row(Row::from_cells([Cell::text("a1"), Cell::text("b1")]))
                .with_row(Row::from_cells([Cell::text("a2"), Cell::text("b2")]))
                .with_row(Row::from_cells([Cell::text("a3"), Cell::text("b3")])),
        )
    }

    fn session(store: &MemoryStore, config: SessionConfig) -> Session {
        Session::open(Box::new(store.clone()), config).unwrap()
    }

    /// Memory store that refuses to be written back, like a CSV file
    struct LoadOnly(MemoryStore);

    impl WorkbookStore for LoadOnly {
        fn load(&self) -> sheetsql_data::Result<Workbook> {
            self.0.load()
        }

        fn open_writer(&self) -> sheetsql_data::Result<Box<dyn WorkbookWriter + '_>> {
            self.0.open_writer()
        }

        fn location(&self) -> StoreLocation {
            self.0.location()
        }

        fn is_writable(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_query_unknown_sheet() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default());
        assert!(matches!(
            session.query("SELECT * FROM Nope"),
            Err(SqlError::SheetNotFound(name)) if name == "Nope"
        ));
        assert!(matches!(
            session.query("SELECT *"),
            Err(SqlError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_sheet_lookup_ignores_case() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default());
        let rs = session.query("select * from sheet1").unwrap();
        assert_eq!(rs.sheet_name(), "Sheet1");
    }

    #[test]
    fn test_commit_on_read_only_session() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default());
        assert!(matches!(session.commit(), Err(SqlError::FeatureNotSupported(_))));
    }

    #[test]
    fn test_commit_without_changes_is_a_no_op() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default().mutable());
        session.commit().unwrap();
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_commit_writes_deletions() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default().mutable());
        {
            let mut rs = session.query("SELECT * FROM Sheet1").unwrap();
            rs.next().unwrap();
            rs.delete_row().unwrap();
        }
        assert!(session.is_dirty());
        session.commit().unwrap();
        assert!(!session.is_dirty());
        assert_eq!(store.write_count(), 1);

        let written = store.workbook();
        let sheet = written.sheet("Sheet1").unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.cell("A1".parse().unwrap()), Some(&Cell::text("a2")));
    }

    #[test]
    fn test_store_without_writer_is_not_updatable() {
        let store = MemoryStore::new(sample());
        let mut session =
            Session::open(Box::new(LoadOnly(store.clone())), SessionConfig::default().mutable())
                .unwrap();
        assert!(!session.is_read_only());
        {
            let mut rs = session.query("SELECT * FROM Sheet1").unwrap();
            assert!(!rs.is_updatable());
            assert!(!rs.metadata()[0].writable());
            rs.next().unwrap();
            assert!(matches!(rs.delete_row(), Err(SqlError::FeatureNotSupported(_))));
            assert_eq!(rs.row_count(), 3);
        }
        assert!(!session.is_dirty());
        session.commit().unwrap();
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_failed_write_keeps_session_dirty() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default().mutable());
        {
            let mut rs = session.query("SELECT * FROM Sheet1").unwrap();
            rs.next().unwrap();
            rs.delete_row().unwrap();
        }
        store.set_write_failure(Some("disk full"));
        assert!(matches!(session.commit(), Err(SqlError::CommitFailure(_))));
        assert!(session.is_dirty());

        store.set_write_failure(None);
        session.commit().unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_release_failure_becomes_warning() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default().mutable());
        {
            let mut rs = session.query("SELECT * FROM Sheet1").unwrap();
            rs.next().unwrap();
            rs.delete_row().unwrap();
        }
        store.set_close_failure(Some("handle lost"));
        session.commit().unwrap();
        assert!(!session.is_dirty());
        assert_eq!(store.write_count(), 1);
        assert_eq!(session.warnings().len(), 1);
        assert_eq!(session.warnings()[0].cause.as_deref(), Some("handle lost"));

        session.clear_warnings();
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_unsupported_operations() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default().mutable());
        assert!(matches!(session.rollback(), Err(SqlError::FeatureNotSupported(_))));
        assert!(matches!(
            session.set_savepoint(None),
            Err(SqlError::FeatureNotSupported(_))
        ));
        assert!(matches!(
            session.prepare_call("{call x()}"),
            Err(SqlError::FeatureNotSupported(_))
        ));
        assert!(!session.auto_commit());
        assert!(session.set_auto_commit(true).is_err());
        assert!(session.set_auto_commit(false).is_ok());
    }

    #[test]
    fn test_closed_session() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default());
        assert!(session.is_valid());
        session.close();
        assert!(!session.is_valid());
        assert!(matches!(
            session.query("SELECT * FROM Sheet1"),
            Err(SqlError::SessionClosed)
        ));
        assert!(matches!(session.commit(), Err(SqlError::SessionClosed)));
        session.close();
    }

    #[test]
    fn test_prepared_query() {
        let store = MemoryStore::new(sample());
        let mut session = session(&store, SessionConfig::default());
        let query = session
            .prepare("SELECT * FROM Sheet1")
            .unwrap()
            .with_scroll(ScrollMode::Scrollable);
        let mut rs = session.execute(&query).unwrap();
        assert!(rs.last().unwrap());
        assert_eq!(rs.get_string(2).unwrap().as_deref(), Some("b3"));
        assert!(rs.first().unwrap());
    }

    #[test]
    fn test_native_sql() {
        let store = MemoryStore::new(sample());
        let session = session(&store, SessionConfig::default());
        assert_eq!(session.native_sql("SELECT * FROM 'Sheet1'").unwrap(), "Sheet1");
        assert_eq!(session.sheet_names().unwrap(), vec!["Sheet1".to_string()]);
        assert!(session.is_read_only());
        assert_eq!(session.catalog(), None);
    }
}
