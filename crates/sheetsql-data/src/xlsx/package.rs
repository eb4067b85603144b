//! XLSX package handling
//!
//! XLSX files are ZIP archives of XML parts.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use crate::error::{DataError, Result};

/// An unpacked XLSX package
#[derive(Debug, Default)]
pub struct XlsxPackage {
    /// All parts in the package, keyed by path
    parts: HashMap<String, Vec<u8>>,
}

impl XlsxPackage {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and unpack an XLSX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            parts.insert(name, contents);
        }

        Ok(Self { parts })
    }

    /// Get a part's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(|v| v.as_slice())
    }

    /// Get a part that must be present
    pub fn require(&self, path: &str) -> Result<&[u8]> {
        self.get(path)
            .ok_or_else(|| DataError::WorkbookOpen(format!("missing package part {}", path)))
    }

    /// Check if a part exists
    pub fn contains(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// Set a part from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.parts.insert(path.into(), contents.into().into_bytes());
    }

    /// Write the package to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated);

        // Sorted for deterministic output
        let mut paths: Vec<_> = self.parts.keys().collect();
        paths.sort();

        for path in paths {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(&self.parts[path])?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Resolve a relationship target against the directory of its source part
///
/// `xl/workbook.xml` + `worksheets/sheet1.xml` gives `xl/worksheets/sheet1.xml`;
/// absolute targets (`/xl/...`) are taken from the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rfind('/') {
        Some(pos) => source_part[..pos].split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_package_roundtrip() {
        let mut package = XlsxPackage::new();
        package.set_string("xl/workbook.xml", "<workbook/>");
        package.set_string("[Content_Types].xml", "<Types/>");

        let mut buffer = Cursor::new(Vec::new());
        package.write_to(&mut buffer).unwrap();
        buffer.set_position(0);

        let reopened = XlsxPackage::from_reader(buffer).unwrap();
        assert!(reopened.contains("[Content_Types].xml"));
        assert_eq!(reopened.get("xl/workbook.xml"), Some(&b"<workbook/>"[..]));
        assert!(reopened.require("xl/styles.xml").is_err());
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../drawings/d1.xml"),
            "xl/drawings/d1.xml"
        );
    }
}
