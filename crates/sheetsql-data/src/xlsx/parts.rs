//! Parsers for the few XLSX parts calamine does not expose
//!
//! calamine hides the declared used range (`<dimension ref="A1:C10"/>`)
//! and the date system flag, so both are read straight from the package.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use sheetsql_model::{CellRange, DateSystem};

use crate::error::Result;
use crate::xlsx::package::{resolve_target, XlsxPackage};

/// Path of the workbook part
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
/// Path of the workbook relationships part
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// A `<sheet>` entry of `xl/workbook.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Sheet name
    pub name: String,
    /// Relationship id pointing at the worksheet part
    pub rel_id: String,
}

/// Contents of `xl/workbook.xml` relevant for loading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookPart {
    /// Sheets in tab order
    pub sheets: Vec<SheetEntry>,
    /// Date system declared by `<workbookPr date1904="..."/>`
    pub date_system: DateSystem,
}

fn is_true(value: &str) -> bool {
    matches!(value, "1" | "true" | "on")
}

impl WorkbookPart {
    /// Parse workbook XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut part = WorkbookPart::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                    b"workbookPr" => {
                        for attr in e.attributes().filter_map(|a| a.ok()) {
                            if attr.key.local_name().as_ref() == b"date1904" {
                                let value = attr.unescape_value().ok().unwrap_or_default();
                                if is_true(&value) {
                                    part.date_system = DateSystem::V1904;
                                }
                            }
                        }
                    }
                    b"sheet" => {
                        let mut name = None;
                        let mut rel_id = None;
                        for attr in e.attributes().filter_map(|a| a.ok()) {
                            let value = attr.unescape_value().ok().map(|s| s.to_string());
                            match attr.key.as_ref() {
                                b"name" => name = value,
                                key if key.ends_with(b":id") => rel_id = value,
                                _ => {}
                            }
                        }
                        if let (Some(name), Some(rel_id)) = (name, rel_id) {
                            part.sheets.push(SheetEntry { name, rel_id });
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(part)
    }
}

/// Parse a relationships part into an id-to-target map
pub fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut map = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        match attr.key.as_ref() {
                            b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                            b"Target" => {
                                target = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        map.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

/// Read the `<dimension ref>` of a worksheet part
///
/// Stops at `<sheetData>`, since the element always precedes the cells.
pub fn parse_dimension(xml: &[u8]) -> Result<Option<CellRange>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                b"dimension" => {
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        if attr.key.as_ref() == b"ref" {
                            let value = attr.unescape_value().ok().unwrap_or_default();
                            return Ok(CellRange::parse(&value).ok());
                        }
                    }
                    return Ok(None);
                }
                b"sheetData" => return Ok(None),
                _ => {}
            },
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Package-level facts calamine does not report
#[derive(Debug, Clone, Default)]
pub struct PackageFacts {
    /// Declared used range per sheet name
    pub dimensions: HashMap<String, CellRange>,
    /// Date system of the workbook
    pub date_system: DateSystem,
}

impl PackageFacts {
    /// Collect dimensions and the date system from an unpacked package
    pub fn read(package: &XlsxPackage) -> Result<Self> {
        let workbook = WorkbookPart::parse(package.require(WORKBOOK_PART)?)?;
        let rels = match package.get(WORKBOOK_RELS_PART) {
            Some(xml) => parse_relationships(xml)?,
            None => HashMap::new(),
        };

        let mut dimensions = HashMap::new();
        for sheet in &workbook.sheets {
            let Some(target) = rels.get(&sheet.rel_id) else {
                continue;
            };
            let path = resolve_target(WORKBOOK_PART, target);
            let Some(xml) = package.get(&path) else {
                continue;
            };
            if let Some(range) = parse_dimension(xml)? {
                debug!(sheet = %sheet.name, dimension = %range, "declared dimension");
                dimensions.insert(sheet.name.clone(), range);
            }
        }

        Ok(Self {
            dimensions,
            date_system: workbook.date_system,
        })
    }
}
