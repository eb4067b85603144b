//! Result sets
//!
//! A [`ResultSet`] is a cursor over the rows of one sheet. It borrows the
//! session's workbook for as long as it lives, so a session serves one
//! result set at a time.

use std::collections::HashMap;

use tracing::debug;

use sheetsql_model::{Cell, CellRef, Workbook};

use crate::coerce::{Coercible, FromCell, TypeCoercer};
use crate::config::{ScrollMode, SessionConfig};
use crate::cursor::{Cursor, Navigable};
use crate::error::{Result, SqlError};
use crate::formula::FormulaEvaluator;
use crate::metadata::{self, cell_sql_type, ColumnDescriptor};
use crate::mutation::{Mutable, MutationTracker};
use crate::value::SqlType;

/// Session state a result set works on
pub(crate) struct Backing<'s> {
    pub workbook: &'s mut Workbook,
    pub tracker: &'s mut MutationTracker,
    pub evaluator: &'s dyn FormulaEvaluator,
}

/// Rows of one sheet, read through a cursor
pub struct ResultSet<'s> {
    workbook: &'s mut Workbook,
    tracker: &'s mut MutationTracker,
    evaluator: &'s dyn FormulaEvaluator,
    sheet: String,
    columns: Vec<ColumnDescriptor>,
    cursor: Cursor,
    coercer: TypeCoercer,
    resolved: HashMap<CellRef, Cell>,
    extended_metadata: bool,
    updatable: bool,
    was_null: bool,
    closed: bool,
}

impl std::fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("sheet", &self.sheet)
            .field("columns", &self.columns.len())
            .field("cursor", &self.cursor)
            .field("updatable", &self.updatable)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<'s> ResultSet<'s> {
    pub(crate) fn open(
        backing: Backing<'s>,
        sheet: String,
        columns: Vec<ColumnDescriptor>,
        cursor: Cursor,
        config: &SessionConfig,
        updatable: bool,
    ) -> Self {
        let coercer = TypeCoercer::new(backing.workbook.date_system);
        Self {
            workbook: backing.workbook,
            tracker: backing.tracker,
            evaluator: backing.evaluator,
            sheet,
            columns,
            cursor,
            coercer,
            resolved: HashMap::new(),
            extended_metadata: config.extended_metadata,
            updatable,
            was_null: false,
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(SqlError::CursorClosed)
        } else {
            Ok(())
        }
    }

    fn check_column(&self, column: usize) -> Result<u32> {
        if column == 0 || column > self.columns.len() {
            return Err(SqlError::InvalidColumnIndex {
                index: column,
                count: self.columns.len(),
            });
        }
        u32::try_from(column - 1).map_err(|_| SqlError::InvalidColumnIndex {
            index: column,
            count: self.columns.len(),
        })
    }

    /// The cell under the cursor with formulas replaced by their value
    fn resolved_cell(&mut self, column: usize) -> Result<Cell> {
        self.check_open()?;
        let col = self.check_column(column)?;
        let row = self.cursor.current_row()?;
        let at = CellRef::new(row, col);

        if let Some(cell) = self.resolved.get(&at) {
            return Ok(cell.clone());
        }

        let sheet = self
            .workbook
            .sheet(&self.sheet)
            .ok_or_else(|| SqlError::SheetNotFound(self.sheet.clone()))?;
        let cell = match sheet.cell(at) {
            Some(Cell::Formula(formula)) => {
                let value = self.evaluator.resolve(&*self.workbook, &sheet.name, at, formula)?;
                self.resolved.insert(at, value.clone());
                value
            }
            Some(cell) => cell.clone(),
            None => Cell::Blank,
        };
        Ok(cell)
    }

    /// Name of the sheet being read
    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn scroll(&self) -> ScrollMode {
        self.cursor.scroll()
    }

    /// Rows remaining in the result set
    pub fn row_count(&self) -> u32 {
        self.cursor.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column descriptors in column order
    pub fn metadata(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Descriptor of a 1-based column
    pub fn column(&self, column: usize) -> Result<&ColumnDescriptor> {
        let index = self.check_column(column)?;
        Ok(&self.columns[index as usize])
    }

    /// Type of a column
    ///
    /// With extended metadata this is the type of the cell under the cursor;
    /// otherwise the static type from the descriptor.
    pub fn column_type(&mut self, column: usize) -> Result<SqlType> {
        self.check_open()?;
        let index = self.check_column(column)?;
        if !self.extended_metadata {
            return Ok(self.columns[index as usize].sql_type);
        }
        let cell = self.resolved_cell(column)?;
        Ok(cell_sql_type(&cell))
    }

    /// Close the result set; every later call fails with `CursorClosed`
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Navigable for ResultSet<'_> {
    fn absolute(&mut self, row: i64) -> Result<bool> {
        self.check_open()?;
        self.cursor.absolute(row)
    }

    fn relative(&mut self, rows: i64) -> Result<bool> {
        self.check_open()?;
        self.cursor.relative(rows)
    }

    fn before_first(&mut self) -> Result<()> {
        self.check_open()?;
        self.cursor.before_first()
    }

    fn after_last(&mut self) -> Result<()> {
        self.check_open()?;
        self.cursor.after_last()
    }

    fn last(&mut self) -> Result<bool> {
        self.check_open()?;
        self.cursor.last()
    }

    fn is_before_first(&self) -> Result<bool> {
        self.check_open()?;
        self.cursor.is_before_first()
    }

    fn is_after_last(&self) -> Result<bool> {
        self.check_open()?;
        self.cursor.is_after_last()
    }

    fn is_first(&self) -> Result<bool> {
        self.check_open()?;
        self.cursor.is_first()
    }

    fn is_last(&self) -> Result<bool> {
        self.check_open()?;
        self.cursor.is_last()
    }

    fn row(&self) -> Result<u32> {
        self.check_open()?;
        self.cursor.row()
    }

    fn row_deleted(&self) -> Result<bool> {
        self.check_open()?;
        self.cursor.row_deleted()
    }

    fn move_to_current_row(&mut self) -> Result<()> {
        self.check_open()?;
        self.cursor.move_to_current_row()
    }
}

impl Coercible for ResultSet<'_> {
    fn find_column(&self, label: &str) -> Result<usize> {
        self.check_open()?;
        metadata::find_column(label, self.columns.len())
    }

    fn was_null(&self) -> bool {
        self.was_null
    }

    fn read<T: FromCell>(&mut self, column: usize) -> Result<Option<T>> {
        self.was_null = false;
        let cell = self.resolved_cell(column)?;
        self.was_null = cell.is_blank();
        self.coercer.coerce(&cell)
    }

    fn read_object<T: FromCell>(&mut self, column: usize) -> Result<Option<T>> {
        self.was_null = false;
        let cell = self.resolved_cell(column)?;
        self.was_null = cell.is_blank();
        self.coercer.coerce_object(&cell)
    }
}

impl Mutable for ResultSet<'_> {
    fn is_updatable(&self) -> bool {
        self.updatable
    }

    fn delete_row(&mut self) -> Result<()> {
        self.check_open()?;
        if !self.updatable {
            return Err(SqlError::unsupported("deleting rows from a read-only result set"));
        }
        let row = self.cursor.current_row()?;
        let sheet = self
            .workbook
            .sheet_mut(&self.sheet)
            .ok_or_else(|| SqlError::SheetNotFound(self.sheet.clone()))?;
        sheet.remove_row(row);
        self.cursor.mark_deleted()?;
        self.tracker.record_deletion(self.sheet.clone(), row);
        self.resolved.clear();
        debug!(
            "Deleted row {} of sheet '{}', {} rows left",
            row + 1,
            self.sheet,
            self.cursor.row_count()
        );
        Ok(())
    }
}
