//! XLSX encoding
//!
//! Produces a minimal SpreadsheetML package: one worksheet part per sheet,
//! inline strings instead of a shared string table, and a single date
//! style so date-formatted numbers keep their meaning.

use std::fmt::Write as _;
use std::io::{Seek, Write};

use sheetsql_model::{Cell, CellRange, CellRef, DateSystem, Sheet, Workbook};

use crate::error::Result;
use crate::xlsx::package::XlsxPackage;
use crate::xlsx::parts::{WORKBOOK_PART, WORKBOOK_RELS_PART};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const TYPE_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const TYPE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Style index of the date-time cell format in the generated styles part
const DATE_STYLE: u32 = 1;

/// Encode a workbook as XLSX into any seekable writer
pub fn write_workbook<W: Write + Seek>(workbook: &Workbook, writer: W) -> Result<()> {
    build_package(workbook).write_to(writer)
}

/// Build the package parts for a workbook
pub fn build_package(workbook: &Workbook) -> XlsxPackage {
    let mut package = XlsxPackage::new();
    let sheet_count = workbook.sheets.len();

    package.set_string("[Content_Types].xml", content_types_xml(sheet_count));
    package.set_string("_rels/.rels", root_rels_xml());
    package.set_string(WORKBOOK_PART, workbook_xml(workbook));
    package.set_string(WORKBOOK_RELS_PART, workbook_rels_xml(sheet_count));
    package.set_string("xl/styles.xml", styles_xml());

    for (i, sheet) in workbook.sheets.iter().enumerate() {
        package.set_string(format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(sheet));
    }

    package
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
"#,
    );
    for i in 1..=sheet_count {
        let _ = writeln!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        );
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="xl/workbook.xml"/></Relationships>"#,
        PACKAGE_RELS_NS, TYPE_OFFICE_DOCUMENT
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}">"#,
        SPREADSHEET_NS, RELATIONSHIPS_NS
    );
    if workbook.date_system == DateSystem::V1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
        PACKAGE_RELS_NS
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}" Target="worksheets/sheet{}.xml"/>"#,
            i, TYPE_WORKSHEET, i
        );
    }
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{}" Target="styles.xml"/>"#,
        sheet_count + 1,
        TYPE_STYLES
    );
    xml.push_str("</Relationships>");
    xml
}

fn styles_xml() -> String {
    // xf 1 uses built-in number format 22 (m/d/yy h:mm)
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="{}">
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#,
        SPREADSHEET_NS
    )
}

fn sheet_xml(sheet: &Sheet) -> String {
    let dimension = sheet
        .dimension()
        .or_else(|| sheet.used_range())
        .unwrap_or_else(|| CellRange::new(CellRef::new(0, 0), CellRef::new(0, 0)));

    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}"><dimension ref="{}"/><sheetData>"#,
        SPREADSHEET_NS, RELATIONSHIPS_NS, dimension
    );

    for (row_index, row) in sheet.rows() {
        let _ = write!(xml, r#"<row r="{}">"#, row_index as u64 + 1);
        for (&col, cell) in &row.cells {
            write_cell(&mut xml, CellRef::new(row_index, col), cell);
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_cell(xml: &mut String, at: CellRef, cell: &Cell) {
    match cell {
        Cell::Blank => {}
        Cell::Boolean(b) => {
            let _ = write!(xml, r#"<c r="{}" t="b"><v>{}</v></c>"#, at, u8::from(*b));
        }
        Cell::Numeric {
            value,
            date_formatted,
        } => {
            if *date_formatted {
                let _ = write!(xml, r#"<c r="{}" s="{}"><v>{}</v></c>"#, at, DATE_STYLE, value);
            } else {
                let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, at, value);
            }
        }
        Cell::Text(s) => {
            let _ = write!(
                xml,
                r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                at,
                escape_xml(s)
            );
        }
        Cell::Error(code) => {
            let _ = write!(xml, r#"<c r="{}" t="e"><v>{}</v></c>"#, at, escape_xml(code.as_str()));
        }
        Cell::Formula(formula) => {
            let f = escape_xml(&formula.expression);
            match formula.cached_value() {
                Some(Cell::Boolean(b)) => {
                    let _ = write!(
                        xml,
                        r#"<c r="{}" t="b"><f>{}</f><v>{}</v></c>"#,
                        at,
                        f,
                        u8::from(*b)
                    );
                }
                Some(Cell::Numeric {
                    value,
                    date_formatted,
                }) => {
                    let style = if *date_formatted {
                        format!(r#" s="{}""#, DATE_STYLE)
                    } else {
                        String::new()
                    };
                    let _ = write!(
                        xml,
                        r#"<c r="{}"{}><f>{}</f><v>{}</v></c>"#,
                        at, style, f, value
                    );
                }
                Some(Cell::Text(s)) => {
                    let _ = write!(
                        xml,
                        r#"<c r="{}" t="str"><f>{}</f><v>{}</v></c>"#,
                        at,
                        f,
                        escape_xml(s)
                    );
                }
                Some(Cell::Error(code)) => {
                    let _ = write!(
                        xml,
                        r#"<c r="{}" t="e"><f>{}</f><v>{}</v></c>"#,
                        at,
                        f,
                        escape_xml(code.as_str())
                    );
                }
                Some(Cell::Blank) | Some(Cell::Formula(_)) | None => {
                    let _ = write!(xml, r#"<c r="{}"><f>{}</f></c>"#, at, f);
                }
            }
        }
    }
}

/// Escape special XML characters
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
