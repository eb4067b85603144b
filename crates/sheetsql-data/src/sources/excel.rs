//! Excel/ODS workbook reader using calamine.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, CellErrorType, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use sheetsql_model::{
    datetime_to_serial, Cell, CellRef, DateSystem, ErrorCode, Formula, Sheet, Workbook,
};

use crate::error::{DataError, Result};
use crate::xlsx::{PackageFacts, XlsxPackage};

/// Workbook reader for `.xlsx`, `.xlsm`, `.xls` and `.ods` files
#[derive(Debug, Clone)]
pub struct ExcelSource {
    /// Path to the workbook
    path: PathBuf,
}

impl ExcelSource {
    /// Create a new Excel source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Whether the file is an OOXML package that declares sheet dimensions
    fn is_ooxml(&self) -> bool {
        matches!(
            self.path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .as_deref(),
            Some("xlsx") | Some("xlsm")
        )
    }

    /// Read every sheet into the grid model
    pub fn load(&self) -> Result<Workbook> {
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", self.path.display(), e)))?;

        let facts = if self.is_ooxml() {
            PackageFacts::read(&XlsxPackage::open(&self.path)?)?
        } else {
            PackageFacts::default()
        };

        let mut result = Workbook {
            sheets: Vec::new(),
            date_system: facts.date_system,
        };

        for name in workbook.sheet_names() {
            let values = workbook
                .worksheet_range(&name)
                .map_err(|e| DataError::SheetNotFound(format!("{}: {}", name, e)))?;
            // Not every format carries formulas; treat a failure as "no formulas".
            let formulas = match workbook.worksheet_formula(&name) {
                Ok(range) => Some(range),
                Err(e) => {
                    debug!(sheet = %name, error = %e, "no formulas read");
                    None
                }
            };

            let mut sheet = build_sheet(&name, &values, formulas.as_ref(), facts.date_system);
            if let Some(dimension) = facts.dimensions.get(&name) {
                sheet.set_dimension(Some(*dimension));
            }
            debug!(
                sheet = %name,
                rows = sheet.row_count(),
                dimension = ?sheet.dimension(),
                "loaded sheet"
            );
            result.add_sheet(sheet);
        }

        Ok(result)
    }
}

fn build_sheet(
    name: &str,
    values: &Range<Data>,
    formulas: Option<&Range<String>>,
    date_system: DateSystem,
) -> Sheet {
    let mut sheet = Sheet::new(name);

    if let Some((row0, col0)) = values.start() {
        for (row, col, data) in values.used_cells() {
            let cell = data_to_cell(data, date_system);
            if !cell.is_blank() {
                sheet.set_cell(CellRef::new(row0 + row as u32, col0 + col as u32), cell);
            }
        }
    }

    if let Some(formulas) = formulas {
        if let Some((row0, col0)) = formulas.start() {
            for (row, col, expression) in formulas.used_cells() {
                if expression.is_empty() {
                    continue;
                }
                let at = CellRef::new(row0 + row as u32, col0 + col as u32);
                let mut formula = Formula::new(expression.as_str());
                if let Some(cached) = values
                    .get_value((at.row, at.col))
                    .map(|data| data_to_cell(data, date_system))
                    .filter(|cell| !cell.is_blank())
                {
                    formula = formula.with_cached(cached);
                }
                sheet.set_cell(at, Cell::Formula(formula));
            }
        }
    }

    sheet
}

/// Convert a calamine value to a grid cell
fn data_to_cell(data: &Data, date_system: DateSystem) -> Cell {
    match data {
        Data::Empty => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::number(*i as f64),
        Data::Float(f) => Cell::number(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::Error(e) => Cell::Error(error_code(e)),
        Data::DateTime(dt) if dt.is_duration() => Cell::number(dt.as_f64()),
        Data::DateTime(dt) => Cell::date_serial(dt.as_f64()),
        Data::DateTimeIso(s) => match parse_iso_datetime(s) {
            Some(value) => Cell::date_serial(datetime_to_serial(value, date_system)),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn error_code(e: &CellErrorType) -> ErrorCode {
    match e {
        CellErrorType::Div0 => ErrorCode::Div0,
        CellErrorType::NA => ErrorCode::NA,
        CellErrorType::Name => ErrorCode::Name,
        CellErrorType::Null => ErrorCode::Null,
        CellErrorType::Num => ErrorCode::Num,
        CellErrorType::Ref => ErrorCode::Ref,
        CellErrorType::Value => ErrorCode::Value,
        CellErrorType::GettingData => ErrorCode::GettingData,
    }
}

/// Parse the ISO 8601 date/date-time strings produced for ODS cells
fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
