//! Workbooks persisted as files
//!
//! The format is chosen from the file extension. Writes go to a temporary
//! file in the destination directory which then atomically replaces the
//! original, so a failed write never leaves a half-written workbook.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use sheetsql_model::Workbook;

use crate::error::{DataError, Result};
use crate::sources::csv::{self, CsvOptions};
use crate::sources::ExcelSource;
use crate::store::{StoreLocation, WorkbookStore, WorkbookWriter};
use crate::xlsx;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Office Open XML workbook (`.xlsx`, `.xlsm`)
    Xlsx,
    /// Legacy BIFF workbook (`.xls`), read only
    Xls,
    /// OpenDocument spreadsheet (`.ods`), read only
    Ods,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
}

impl FileFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(FileFormat::Xlsx),
            "xls" => Some(FileFormat::Xls),
            "ods" => Some(FileFormat::Ods),
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    /// Whether workbooks of this format can be written back
    pub fn is_writable(self) -> bool {
        !matches!(self, FileFormat::Xls | FileFormat::Ods)
    }

    fn csv_options(self) -> CsvOptions {
        match self {
            FileFormat::Tsv => CsvOptions::tsv(),
            _ => CsvOptions::default(),
        }
    }
}

/// A workbook stored in a single file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    format: FileFormat,
}

impl FileStore {
    /// Create a store for a path, detecting the format from its extension
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).ok_or_else(|| {
            DataError::Unsupported(format!("unknown workbook format: {}", path.display()))
        })?;
        Ok(Self::with_format(path, format))
    }

    /// Create a store with an explicit format
    pub fn with_format(path: impl AsRef<Path>, format: FileFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }

    /// The workbook path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The detected format
    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn sheet_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string())
    }
}

impl WorkbookStore for FileStore {
    fn load(&self) -> Result<Workbook> {
        debug!(path = %self.path.display(), format = ?self.format, "loading workbook");
        match self.format {
            FileFormat::Xlsx | FileFormat::Xls | FileFormat::Ods => {
                ExcelSource::new(&self.path)?.load()
            }
            FileFormat::Csv | FileFormat::Tsv => {
                if !self.path.exists() {
                    return Err(DataError::FileNotFound(self.path.display().to_string()));
                }
                let file = File::open(&self.path)?;
                let sheet = csv::read_sheet(&self.sheet_name(), file, &self.format.csv_options())?;
                Ok(Workbook::new().with_sheet(sheet))
            }
        }
    }

    fn open_writer(&self) -> Result<Box<dyn WorkbookWriter + '_>> {
        if !self.format.is_writable() {
            return Err(DataError::Unsupported(format!(
                "{:?} workbooks are read only",
                self.format
            )));
        }
        Ok(Box::new(FileWriter {
            store: self,
            persisted: None,
        }))
    }

    fn location(&self) -> StoreLocation {
        StoreLocation {
            catalog: self
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.display().to_string()),
            schema: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        }
    }

    fn is_writable(&self) -> bool {
        self.format.is_writable()
    }
}

/// Write handle for a [`FileStore`]
struct FileWriter<'a> {
    store: &'a FileStore,
    /// The replaced file, kept open until `close`
    persisted: Option<File>,
}

impl WorkbookWriter for FileWriter<'_> {
    fn write(&mut self, workbook: &Workbook) -> Result<()> {
        let path = &self.store.path;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir)?;
        match self.store.format {
            FileFormat::Xlsx => xlsx::write_workbook(workbook, temp.as_file_mut())?,
            FileFormat::Csv | FileFormat::Tsv => {
                csv::write_workbook(workbook, temp.as_file_mut(), &self.store.format.csv_options())?
            }
            FileFormat::Xls | FileFormat::Ods => {
                return Err(DataError::Unsupported(format!(
                    "{:?} workbooks are read only",
                    self.store.format
                )))
            }
        }
        temp.as_file_mut().flush()?;

        let file = temp.persist(path)?;
        debug!(path = %path.display(), "workbook replaced");
        self.persisted = Some(file);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        if let Some(file) = self.persisted {
            file.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.XLSX")), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_path(Path::new("a.xlsm")), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_path(Path::new("a.xls")), Some(FileFormat::Xls));
        assert_eq!(FileFormat::from_path(Path::new("a.ods")), Some(FileFormat::Ods));
        assert_eq!(FileFormat::from_path(Path::new("a.csv")), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_path(Path::new("a.tsv")), Some(FileFormat::Tsv));
        assert_eq!(FileFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_location() {
        let store = FileStore::new("/data/reports/q1.xlsx").unwrap();
        let location = store.location();
        assert_eq!(location.catalog.as_deref(), Some("/data/reports"));
        assert_eq!(location.schema.as_deref(), Some("q1.xlsx"));

        let relative = FileStore::new("q1.csv").unwrap();
        assert_eq!(relative.location().catalog, None);
    }

    #[test]
    fn test_legacy_formats_are_read_only() {
        let store = FileStore::new("old.xls").unwrap();
        assert!(!store.is_writable());
        assert!(matches!(store.open_writer(), Err(DataError::Unsupported(_))));
    }
}
