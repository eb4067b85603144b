//! Cursor state machine
//!
//! Positions are 1-based. Position 0 (or anything below 1) is before the
//! first row, `row_count + 1` is after the last row.

use crate::config::ScrollMode;
use crate::error::{Result, SqlError};

/// Row positioning shared by cursors and result sets
pub trait Navigable {
    /// Move to row `row`; negative values count back from the last row
    fn absolute(&mut self, row: i64) -> Result<bool>;

    /// Move `rows` rows from the current position
    fn relative(&mut self, rows: i64) -> Result<bool>;

    fn before_first(&mut self) -> Result<()>;

    fn after_last(&mut self) -> Result<()>;

    fn last(&mut self) -> Result<bool>;

    fn is_before_first(&self) -> Result<bool>;

    fn is_after_last(&self) -> Result<bool>;

    fn is_first(&self) -> Result<bool>;

    fn is_last(&self) -> Result<bool>;

    /// Current 1-based row, or 0 when not on a row
    fn row(&self) -> Result<u32>;

    /// Whether the row under the cursor was deleted and the cursor has not moved since
    fn row_deleted(&self) -> Result<bool>;

    /// Settle the cursor on the row it logically points at
    fn move_to_current_row(&mut self) -> Result<()>;

    fn next(&mut self) -> Result<bool> {
        self.relative(1)
    }

    fn previous(&mut self) -> Result<bool> {
        self.relative(-1)
    }

    fn first(&mut self) -> Result<bool> {
        self.absolute(1)
    }
}

/// Position of a cursor over a fixed number of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    position: i64,
    row_count: i64,
    scroll: ScrollMode,
    pending_adjustment: bool,
}

impl Cursor {
    /// Create a cursor before the first of `row_count` rows
    pub fn new(row_count: u32, scroll: ScrollMode) -> Self {
        Self {
            position: 0,
            row_count: i64::from(row_count),
            scroll,
            pending_adjustment: false,
        }
    }

    /// Raw position (0 before first, `row_count + 1` after last)
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Number of rows, reduced by deletions
    pub fn row_count(&self) -> u32 {
        u32::try_from(self.row_count).unwrap_or(0)
    }

    /// Scroll mode chosen at creation
    pub fn scroll(&self) -> ScrollMode {
        self.scroll
    }

    fn on_row(&self) -> bool {
        !self.pending_adjustment && self.position >= 1 && self.position <= self.row_count
    }

    /// Zero-based grid row under the cursor
    pub fn current_row(&self) -> Result<u32> {
        if self.pending_adjustment {
            return Err(SqlError::InvalidCursorPosition(
                "the current row has been deleted".to_string(),
            ));
        }
        if !self.on_row() {
            return Err(SqlError::InvalidCursorPosition(format!(
                "cursor is not on a row (position {} of {})",
                self.position, self.row_count
            )));
        }
        u32::try_from(self.position - 1)
            .map_err(|_| SqlError::InvalidCursorPosition(self.position.to_string()))
    }

    /// Record the deletion of the row under the cursor
    ///
    /// Returns the zero-based index of the deleted row. The row count drops
    /// by one and the next positioning call first steps back one row.
    pub fn mark_deleted(&mut self) -> Result<u32> {
        let row = self.current_row()?;
        self.row_count -= 1;
        self.pending_adjustment = true;
        Ok(row)
    }

    fn settle(&mut self) {
        if self.pending_adjustment {
            self.position -= 1;
            self.pending_adjustment = false;
        }
    }

    fn move_to(&mut self, target: i64) -> Result<bool> {
        if self.scroll == ScrollMode::ForwardOnly && target < self.position {
            return Err(SqlError::ForwardOnlyViolation {
                current: self.position,
                target,
            });
        }

        self.position = if target < 1 {
            0
        } else if target > self.row_count {
            self.row_count + 1
        } else {
            target
        };
        Ok(self.on_row())
    }
}

impl Navigable for Cursor {
    fn absolute(&mut self, row: i64) -> Result<bool> {
        self.settle();
        let target = match row {
            0 => return Err(SqlError::IllegalPosition(0)),
            n if n > 0 => n,
            n => self.row_count + n + 1,
        };
        self.move_to(target)
    }

    fn relative(&mut self, rows: i64) -> Result<bool> {
        self.settle();
        self.move_to(self.position.saturating_add(rows))
    }

    fn before_first(&mut self) -> Result<()> {
        self.settle();
        self.move_to(0).map(|_| ())
    }

    fn after_last(&mut self) -> Result<()> {
        self.settle();
        if self.row_count == 0 {
            return Ok(());
        }
        self.move_to(self.row_count + 1).map(|_| ())
    }

    fn last(&mut self) -> Result<bool> {
        if self.row_count == 0 {
            self.settle();
            return Ok(false);
        }
        self.absolute(self.row_count)
    }

    fn is_before_first(&self) -> Result<bool> {
        Ok(self.position < 1)
    }

    fn is_after_last(&self) -> Result<bool> {
        Ok(self.position > self.row_count)
    }

    fn is_first(&self) -> Result<bool> {
        Ok(self.on_row() && self.position == 1)
    }

    fn is_last(&self) -> Result<bool> {
        Ok(self.on_row() && self.position == self.row_count)
    }

    fn row(&self) -> Result<u32> {
        Ok(if self.on_row() {
            u32::try_from(self.position).unwrap_or(0)
        } else {
            0
        })
    }

    fn row_deleted(&self) -> Result<bool> {
        Ok(self.pending_adjustment)
    }

    fn move_to_current_row(&mut self) -> Result<()> {
        self.settle();
        Ok(())
    }
}
