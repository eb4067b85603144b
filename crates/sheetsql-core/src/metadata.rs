//! Column metadata
//!
//! Columns are named after their position (A, B, ..., AA, ...); the first
//! row of a sheet is data, never a header. How many columns a sheet has is
//! decided by one of two strategies:
//!
//! - **Bounding box**: the sheet declares its used range, and the column
//!   count is the rightmost declared column plus one.
//! - **Scan**: otherwise every stored row is visited and the widest row wins.

use serde::Serialize;
use tracing::debug;

use sheetsql_data::StoreLocation;
use sheetsql_model::{column_index, column_name, Cell, Sheet};

use crate::error::{Result, SqlError};
use crate::value::SqlType;

/// How the column count of a sheet is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStrategy {
    /// The sheet declares its used range
    BoundingBox,
    /// The stored rows are scanned
    Scan,
}

impl ColumnStrategy {
    /// Strategy that applies to a sheet
    pub fn for_sheet(sheet: &Sheet) -> Self {
        if sheet.dimension().is_some() {
            ColumnStrategy::BoundingBox
        } else {
            ColumnStrategy::Scan
        }
    }
}

/// Description of one result set column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    /// 1-based position
    pub index: usize,
    /// Positional letter name
    pub name: String,
    /// Display label (same as the name)
    pub label: String,
    /// Directory holding the workbook
    pub catalog: Option<String>,
    /// File name of the workbook
    pub schema: Option<String>,
    /// Sheet name
    pub table: String,
    /// Static type; row-sensitive types come from the result set
    pub sql_type: SqlType,
    pub nullable: bool,
    pub auto_increment: bool,
    pub searchable: bool,
    pub read_only: bool,
}

impl ColumnDescriptor {
    pub fn writable(&self) -> bool {
        !self.read_only
    }

    /// Name of the Rust type the object accessor returns for this column
    pub fn host_type(&self) -> &'static str {
        self.sql_type.host_type()
    }
}

/// Relational type of a resolved cell
pub fn cell_sql_type(cell: &Cell) -> SqlType {
    match cell {
        Cell::Boolean(_) => SqlType::Boolean,
        Cell::Numeric {
            date_formatted: true,
            ..
        } => SqlType::Timestamp,
        Cell::Numeric { .. } => SqlType::Numeric,
        Cell::Text(_) => SqlType::Varchar,
        Cell::Blank => SqlType::Null,
        Cell::Error(_) => SqlType::Datalink,
        Cell::Formula(_) => SqlType::Other,
    }
}

/// Builds column descriptors for sheets of one workbook
#[derive(Debug, Clone, Default)]
pub struct MetadataResolver {
    location: StoreLocation,
    read_only: bool,
}

impl MetadataResolver {
    pub fn new(location: StoreLocation, read_only: bool) -> Self {
        Self {
            location,
            read_only,
        }
    }

    /// Number of columns of a sheet
    pub fn column_count(sheet: &Sheet) -> Result<usize> {
        let count = match ColumnStrategy::for_sheet(sheet) {
            ColumnStrategy::BoundingBox => sheet
                .dimension()
                .map(|range| range.end.col as usize + 1)
                .unwrap_or(0),
            ColumnStrategy::Scan => {
                // A last row index of 0 may mean "no rows"; row_count() tells apart.
                let rows = sheet.row_count();
                sheet
                    .rows()
                    .take_while(|(index, _)| *index < rows)
                    .map(|(_, row)| row.last_cell_num() as usize)
                    .max()
                    .unwrap_or(0)
            }
        };

        if count == 0 {
            return Err(SqlError::AmbiguousSchema(sheet.name.clone()));
        }
        Ok(count)
    }

    /// Describe every column of a sheet
    pub fn resolve(&self, sheet: &Sheet) -> Result<Vec<ColumnDescriptor>> {
        let count = Self::column_count(sheet)?;
        debug!(
            "Resolved {} columns for sheet '{}' ({:?})",
            count,
            sheet.name,
            ColumnStrategy::for_sheet(sheet)
        );

        Ok((0..count)
            .map(|i| {
                let name = column_name(i as u32);
                ColumnDescriptor {
                    index: i + 1,
                    label: name.clone(),
                    name,
                    catalog: self.location.catalog.clone(),
                    schema: self.location.schema.clone(),
                    table: sheet.name.clone(),
                    sql_type: SqlType::Other,
                    nullable: true,
                    auto_increment: false,
                    searchable: false,
                    read_only: self.read_only,
                }
            })
            .collect())
    }
}

/// 1-based index of a positional column label among `count` columns
pub fn find_column(label: &str, count: usize) -> Result<usize> {
    let index = column_index(label.trim())
        .map_err(|_| SqlError::InvalidColumnLabel(label.to_string()))? as usize;
    if index >= count {
        return Err(SqlError::InvalidColumnLabel(label.to_string()));
    }
    Ok(index + 1)
}
