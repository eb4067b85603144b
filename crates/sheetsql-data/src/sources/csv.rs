//! CSV data source.
//!
//! A delimited file holds exactly one sheet, named after the file stem.

use std::io::{Read, Write};

use sheetsql_model::{Cell, Row, Sheet, Workbook};

use crate::error::{DataError, Result};

/// Options for CSV parsing and writing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether to trim whitespace from fields
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: false,
        }
    }
}

impl CsvOptions {
    /// Create options for tab-separated values (TSV)
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }
}

/// Infer a typed cell from a CSV field
///
/// Empty fields are gaps, `TRUE`/`FALSE` are booleans and finite numbers
/// are numeric; everything else stays text.
pub fn infer_cell(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::Blank;
    }
    if field.eq_ignore_ascii_case("true") {
        return Cell::Boolean(true);
    }
    if field.eq_ignore_ascii_case("false") {
        return Cell::Boolean(false);
    }
    let looks_numeric = field
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if looks_numeric {
        if let Ok(value) = field.parse::<f64>() {
            if value.is_finite() {
                return Cell::number(value);
            }
        }
    }
    Cell::Text(field.to_string())
}

/// Render a cell as a CSV field
pub fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Blank => String::new(),
        Cell::Boolean(true) => "TRUE".to_string(),
        Cell::Boolean(false) => "FALSE".to_string(),
        Cell::Numeric { value, .. } => value.to_string(),
        Cell::Text(s) => s.clone(),
        Cell::Error(code) => code.as_str().to_string(),
        Cell::Formula(formula) => match formula.cached_value() {
            Some(cached) => render_cell(cached),
            None => format!("={}", formula.expression),
        },
    }
}

/// Read one sheet from CSV data
pub fn read_sheet<R: Read>(name: &str, reader: R, options: &CsvOptions) -> Result<Sheet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .has_headers(false)
        .trim(if options.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .flexible(true)
        .from_reader(reader);

    let mut sheet = Sheet::new(name);
    for record in csv_reader.records() {
        let record = record?;
        sheet.push_row(Row::from_cells(record.iter().map(infer_cell)));
    }

    Ok(sheet)
}

/// Write a single-sheet workbook as CSV
pub fn write_workbook<W: Write>(
    workbook: &Workbook,
    writer: W,
    options: &CsvOptions,
) -> Result<()> {
    let sheet = match workbook.sheets.as_slice() {
        [] => None,
        [sheet] => Some(sheet),
        _ => {
            return Err(DataError::Unsupported(format!(
                "CSV holds one sheet, workbook has {}",
                workbook.sheets.len()
            )))
        }
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .flexible(true)
        .from_writer(writer);

    if let Some(sheet) = sheet {
        for index in 0..sheet.row_count() {
            let fields: Vec<String> = match sheet.row(index) {
                Some(row) => (0..row.last_cell_num())
                    .map(|col| row.get(col).map(render_cell).unwrap_or_default())
                    .collect(),
                None => Vec::new(),
            };
            if fields.is_empty() {
                // A lone empty field keeps the line from being skipped on read
                csv_writer.write_record([""])?;
            } else {
                csv_writer.write_record(&fields)?;
            }
        }
    }

    csv_writer.flush()?;
    Ok(())
}
