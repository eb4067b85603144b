//! Integration tests for sheetsql-data

use std::path::Path;

use tempfile::TempDir;

use sheetsql_data::{DataError, FileStore, WorkbookStore};
use sheetsql_model::{Cell, CellRange, CellRef, DateSystem, ErrorCode, Row, Sheet, Workbook};

fn sample_workbook() -> Workbook {
    let people = Sheet::new("People")
        .with_row(Row::from_cells(["Name", "Age"]))
        .with_row(Row::from_cells([Cell::text("Alice"), Cell::number(30.0)]))
        .with_row(Row::from_cells([Cell::text("Bob"), Cell::number(25.5)]));

    let mut mixed = Sheet::new("Mixed");
    mixed.set_cell(CellRef::new(0, 0), true);
    mixed.set_cell(CellRef::new(0, 1), Cell::date_serial(45306.5));
    mixed.set_cell(CellRef::new(0, 2), ErrorCode::NA);
    mixed.set_cell(
        CellRef::new(1, 0),
        Cell::formula_with_result("SUM(1,2)", Cell::number(3.0)),
    );
    mixed.set_cell(CellRef::new(1, 1), Cell::formula("A1"));
    mixed.set_cell(CellRef::new(3, 3), "far");

    Workbook::new()
        .with_sheet(people)
        .with_sheet(mixed)
        .with_sheet(Sheet::new("Empty"))
}

fn write_with(store: &FileStore, workbook: &Workbook) {
    let mut writer = store.open_writer().expect("Failed to open writer");
    writer.write(workbook).expect("Failed to write workbook");
    writer.close().expect("Failed to close writer");
}

fn xlsx_store(dir: &Path) -> FileStore {
    let store = FileStore::new(dir.join("book.xlsx")).unwrap();
    write_with(&store, &sample_workbook());
    store
}

#[test]
fn test_xlsx_roundtrip_sheet_names() {
    let dir = TempDir::new().unwrap();
    let store = xlsx_store(dir.path());

    let loaded = store.load().expect("Failed to load workbook");
    assert_eq!(loaded.sheet_names(), vec!["People", "Mixed", "Empty"]);
    assert_eq!(loaded.date_system, DateSystem::V1900);
}

#[test]
fn test_xlsx_roundtrip_values() {
    let dir = TempDir::new().unwrap();
    let store = xlsx_store(dir.path());
    let loaded = store.load().unwrap();

    let people = loaded.sheet("People").unwrap();
    assert_eq!(people.row_count(), 3);
    assert_eq!(people.cell(CellRef::new(0, 0)), Some(&Cell::text("Name")));
    assert_eq!(people.cell(CellRef::new(1, 1)), Some(&Cell::number(30.0)));
    assert_eq!(people.cell(CellRef::new(2, 1)), Some(&Cell::number(25.5)));
}

#[test]
fn test_xlsx_roundtrip_typed_cells() {
    let dir = TempDir::new().unwrap();
    let store = xlsx_store(dir.path());
    let loaded = store.load().unwrap();
    let mixed = loaded.sheet("Mixed").unwrap();

    assert_eq!(mixed.cell(CellRef::new(0, 0)), Some(&Cell::Boolean(true)));
    assert_eq!(mixed.cell(CellRef::new(0, 1)), Some(&Cell::date_serial(45306.5)));
    assert_eq!(mixed.cell(CellRef::new(0, 2)), Some(&Cell::Error(ErrorCode::NA)));
    assert_eq!(mixed.cell(CellRef::new(3, 3)), Some(&Cell::text("far")));
    assert!(mixed.row(2).is_none());
}

#[test]
fn test_xlsx_roundtrip_formulas() {
    let dir = TempDir::new().unwrap();
    let store = xlsx_store(dir.path());
    let loaded = store.load().unwrap();
    let mixed = loaded.sheet("Mixed").unwrap();

    match mixed.cell(CellRef::new(1, 0)) {
        Some(Cell::Formula(f)) => {
            assert_eq!(f.expression, "SUM(1,2)");
            assert_eq!(f.cached_value(), Some(&Cell::number(3.0)));
        }
        other => panic!("expected formula, got {:?}", other),
    }
    match mixed.cell(CellRef::new(1, 1)) {
        Some(Cell::Formula(f)) => {
            assert_eq!(f.expression, "A1");
            assert!(f.cached_value().is_none());
        }
        other => panic!("expected formula, got {:?}", other),
    }
}

#[test]
fn test_xlsx_declared_dimension() {
    let dir = TempDir::new().unwrap();
    let store = xlsx_store(dir.path());
    let loaded = store.load().unwrap();

    assert_eq!(
        loaded.sheet("People").unwrap().dimension(),
        Some(CellRange::parse("A1:B3").unwrap())
    );
    assert_eq!(
        loaded.sheet("Mixed").unwrap().dimension(),
        Some(CellRange::parse("A1:D4").unwrap())
    );

    let empty = loaded.sheet("Empty").unwrap();
    assert_eq!(empty.dimension(), Some(CellRange::parse("A1").unwrap()));
    assert_eq!(empty.physical_row_count(), 0);
}

#[test]
fn test_xlsx_1904_date_system() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("mac.xlsx")).unwrap();
    let workbook = Workbook {
        sheets: vec![Sheet::new("S").with_row(Row::from_cells([Cell::date_serial(1.0)]))],
        date_system: DateSystem::V1904,
    };
    write_with(&store, &workbook);

    let loaded = store.load().unwrap();
    assert_eq!(loaded.date_system, DateSystem::V1904);
}

#[test]
fn test_xlsx_rewrite_replaces_file() {
    let dir = TempDir::new().unwrap();
    let store = xlsx_store(dir.path());

    let mut workbook = store.load().unwrap();
    workbook.sheet_mut("People").unwrap().remove_row(1);
    write_with(&store, &workbook);

    let reloaded = store.load().unwrap();
    let people = reloaded.sheet("People").unwrap();
    assert_eq!(people.row_count(), 2);
    assert_eq!(people.cell(CellRef::new(1, 0)), Some(&Cell::text("Bob")));
    assert_eq!(people.dimension(), Some(CellRange::parse("A1:B2").unwrap()));

    // Only the workbook itself remains; the temporary file was renamed over it.
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn test_csv_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "Name,Age,Active\nAlice,30,TRUE\nBob,,false\n").unwrap();

    let store = FileStore::new(&path).unwrap();
    let workbook = store.load().unwrap();
    assert_eq!(workbook.sheet_names(), vec!["people"]);

    let sheet = &workbook.sheets[0];
    assert_eq!(sheet.row_count(), 3);
    assert!(sheet.dimension().is_none());
    assert_eq!(sheet.cell(CellRef::new(1, 1)), Some(&Cell::number(30.0)));
    assert_eq!(sheet.cell(CellRef::new(2, 2)), Some(&Cell::Boolean(false)));
    assert!(sheet.cell(CellRef::new(2, 1)).is_none());

    write_with(&store, &workbook);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "Name,Age,Active\nAlice,30,TRUE\nBob,,FALSE\n");
}

#[test]
fn test_tsv_uses_tabs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.tsv");
    std::fs::write(&path, "a\tb\n1\t2\n").unwrap();

    let workbook = FileStore::new(&path).unwrap().load().unwrap();
    assert_eq!(workbook.sheets[0].row(0).unwrap().last_cell_num(), 2);
}

#[test]
fn test_missing_files() {
    let dir = TempDir::new().unwrap();
    for name in ["missing.xlsx", "missing.csv"] {
        let store = FileStore::new(dir.path().join(name)).unwrap();
        assert!(matches!(store.load(), Err(DataError::FileNotFound(_))));
    }
}

#[test]
fn test_unknown_extension() {
    assert!(matches!(
        FileStore::new("notes.txt"),
        Err(DataError::Unsupported(_))
    ));
}
