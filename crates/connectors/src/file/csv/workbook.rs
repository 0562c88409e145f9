use crate::file::csv::error::FileError;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use model::{
    core::value::CellValue,
    records::{sheet::Sheet, table::Table},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// How a workbook is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookLayout {
    /// A single `.csv` file holding one sheet named after the file stem.
    SingleFile,
    /// A directory of `.csv` files, one sheet per file, ordered by file name.
    Directory,
}

/// Read-only view over a CSV workbook.
///
/// Opening only discovers sheet names; cell data is parsed on demand and
/// every call to [`CsvWorkbook::load_table`] yields a fresh working copy.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
    layout: WorkbookLayout,
    sheets: Vec<(String, PathBuf)>,
}

impl CsvWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let root = path.as_ref().to_path_buf();

        if !root.exists() {
            return Err(FileError::NotFound(root.display().to_string()));
        }

        if root.is_dir() {
            let mut sheets = Vec::new();
            for entry in fs::read_dir(&root)? {
                let path = entry?.path();
                if path.is_file() && has_csv_extension(&path) {
                    sheets.push((sheet_name(&path)?, path));
                }
            }
            if sheets.is_empty() {
                return Err(FileError::InvalidFormat(format!(
                    "no .csv sheets found in {}",
                    root.display()
                )));
            }
            sheets.sort_by(|a, b| a.1.cmp(&b.1));

            return Ok(CsvWorkbook {
                root,
                layout: WorkbookLayout::Directory,
                sheets,
            });
        }

        if !has_csv_extension(&root) {
            return Err(FileError::InvalidFormat(format!(
                "expected a .csv file or a directory of .csv files: {}",
                root.display()
            )));
        }

        let name = sheet_name(&root)?;
        Ok(CsvWorkbook {
            sheets: vec![(name, root.clone())],
            root,
            layout: WorkbookLayout::SingleFile,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> WorkbookLayout {
        self.layout
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn read_sheet(&self, name: &str) -> Result<Sheet, FileError> {
        let (name, path) = self
            .sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .ok_or_else(|| FileError::UnknownSheet(name.to_string()))?;
        read_sheet_file(name, path)
    }

    /// Parses every sheet into an owned table.
    pub fn load_table(&self) -> Result<Table, FileError> {
        let sheets = self
            .sheets
            .iter()
            .map(|(name, path)| read_sheet_file(name, path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table::new(sheets))
    }
}

pub fn read_sheet_file(name: &str, path: &Path) -> Result<Sheet, FileError> {
    let bytes = fs::read(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    // The reader drops blank lines; they are restored as empty rows so that
    // row ordinals match the file.
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut record = StringRecord::new();
    let mut consumed = 0;
    while reader.read_record(&mut record)? {
        let end = usize::try_from(reader.position().byte())
            .unwrap_or(bytes.len())
            .min(bytes.len());
        let skipped = leading_blank_lines(&bytes[consumed.min(end)..end]);
        rows.extend(std::iter::repeat_with(Vec::new).take(skipped));
        rows.push(record.iter().map(CellValue::parse).collect());
        consumed = record_end(&bytes, end);
    }

    debug!(sheet = %name, rows = rows.len(), "Loaded sheet");
    Ok(Sheet::new(name, rows))
}

/// Offset just past a record's terminator. A `\r\n` terminator is only
/// half consumed when the record is handed out.
fn record_end(bytes: &[u8], end: usize) -> usize {
    if end > 0 && bytes[end - 1] == b'\r' && bytes.get(end) == Some(&b'\n') {
        end + 1
    } else {
        end
    }
}

/// Counts the empty lines at the start of `segment`, `\r\n` counting once.
fn leading_blank_lines(segment: &[u8]) -> usize {
    let mut count = 0;
    for (idx, byte) in segment.iter().enumerate() {
        match byte {
            b'\n' => count += 1,
            b'\r' if segment.get(idx + 1) != Some(&b'\n') => count += 1,
            b'\r' => {}
            _ => break,
        }
    }
    count
}

/// Writes `table` to `path`.
///
/// A path ending in `.csv` receives the table's single sheet; any other path
/// is treated as a directory and receives one `<sheet>.csv` per sheet.
pub fn write_table(table: &Table, path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();

    if has_csv_extension(path) {
        let [sheet] = table.sheets() else {
            return Err(FileError::InvalidFormat(format!(
                "cannot write {} sheets into the single file {}",
                table.len(),
                path.display()
            )));
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        return write_sheet_file(sheet, path);
    }

    fs::create_dir_all(path)?;
    for sheet in table.sheets() {
        let file = path.join(format!("{}.csv", file_safe(sheet.name())));
        write_sheet_file(sheet, &file)?;
    }
    Ok(())
}

pub fn write_sheet_file(sheet: &Sheet, path: &Path) -> Result<(), FileError> {
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

    for row in sheet.rows() {
        // A single empty field keeps the line; a bare blank line would not
        // survive most readers.
        if row.is_empty() {
            writer.write_record([""])?;
        } else {
            writer.write_record(row.iter().map(CellValue::render))?;
        }
    }

    writer.flush()?;
    debug!(sheet = %sheet.name(), path = %path.display(), "Wrote sheet");
    Ok(())
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn sheet_name(path: &Path) -> Result<String, FileError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| FileError::InvalidFormat(format!("invalid file name: {}", path.display())))
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::identifiers::{Column, RowId};

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_open_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Backlinks.csv");
        write(&file, "a,b\n1,https://a.test\n");

        let workbook = CsvWorkbook::open(&file).unwrap();
        assert_eq!(workbook.layout(), WorkbookLayout::SingleFile);
        assert_eq!(workbook.sheet_names(), vec!["Backlinks"]);

        let sheet = workbook.read_sheet("Backlinks").unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(
            sheet.cell(RowId::new(2), Column::new(2).unwrap()),
            &CellValue::from("https://a.test")
        );
        assert_eq!(
            sheet.cell(RowId::new(2), Column::new(1).unwrap()),
            &CellValue::Number(1.0)
        );
    }

    #[test]
    fn test_open_directory_orders_sheets_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b.csv"), "x\n");
        write(&dir.path().join("a.CSV"), "y\n");
        write(&dir.path().join("notes.txt"), "ignored\n");

        let workbook = CsvWorkbook::open(dir.path()).unwrap();
        assert_eq!(workbook.layout(), WorkbookLayout::Directory);
        assert_eq!(workbook.sheet_names(), vec!["a", "b"]);
        assert_eq!(workbook.load_table().unwrap().len(), 2);
    }

    #[test]
    fn test_open_rejects_missing_and_non_csv_inputs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CsvWorkbook::open(dir.path().join("missing.csv")),
            Err(FileError::NotFound(_))
        ));

        let txt = dir.path().join("data.xlsx");
        write(&txt, "binary");
        assert!(matches!(
            CsvWorkbook::open(&txt),
            Err(FileError::InvalidFormat(_))
        ));

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            CsvWorkbook::open(empty.path()),
            Err(FileError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unknown_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("s.csv");
        write(&file, "x\n");
        let workbook = CsvWorkbook::open(&file).unwrap();
        assert!(matches!(
            workbook.read_sheet("nope"),
            Err(FileError::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_write_table_preserves_rows_and_untouched_cells() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        write(&input, "title,,\n,,\n007,https://a.test,#N/A\n");

        let mut table = CsvWorkbook::open(&input).unwrap().load_table().unwrap();
        table.sheets_mut()[0].set_cell(RowId::new(3), Column::new(4).unwrap(), true.into());

        let output = dir.path().join("out.csv");
        write_table(&table, &output).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "title,,\n,,\n007,https://a.test,#N/A,TRUE\n");
    }

    #[test]
    fn test_write_table_keeps_empty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::new(vec![Sheet::new(
            "s",
            vec![vec![CellValue::from("a")], vec![], vec![CellValue::from("b")]],
        )]);
        let output = dir.path().join("s.csv");
        write_table(&table, &output).unwrap();

        let sheet = read_sheet_file("s", &output).unwrap();
        assert_eq!(sheet.row_count(), 3);
    }

    #[test]
    fn test_write_table_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::new(vec![Sheet::empty("one"), Sheet::empty("two")]);
        let out = dir.path().join("result");

        write_table(&table, &out).unwrap();
        assert!(out.join("one.csv").exists());
        assert!(out.join("two.csv").exists());

        assert!(matches!(
            write_table(&table, dir.path().join("single.csv")),
            Err(FileError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_blank_lines_keep_row_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Backlinks.csv");
        write(&input, "Report\n\n,Referring Page URL\n,https://a.test\n");

        let sheet = read_sheet_file("Backlinks", &input).unwrap();
        assert_eq!(sheet.row_count(), 4);
        assert!(sheet.rows()[1].is_empty());
        assert_eq!(
            sheet.cell(RowId::new(3), Column::new(2).unwrap()),
            &CellValue::from("Referring Page URL")
        );
        assert_eq!(
            sheet.cell(RowId::new(4), Column::new(2).unwrap()),
            &CellValue::from("https://a.test")
        );
    }

    #[test]
    fn test_round_trip_keeps_blank_rows_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        write(&input, "\nReport\n\n\n,Referring Page URL\n,https://a.test\n");

        let mut table = CsvWorkbook::open(&input).unwrap().load_table().unwrap();
        table.sheets_mut()[0].set_cell(RowId::new(6), Column::new(4).unwrap(), true.into());
        let output = dir.path().join("out.csv");
        write_table(&table, &output).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(
            content,
            "\"\"\nReport\n\"\"\n\"\"\n,Referring Page URL\n,https://a.test,,TRUE\n"
        );

        let reread = read_sheet_file("out", &output).unwrap();
        assert_eq!(reread.row_count(), 6);
        assert_eq!(
            reread.cell(RowId::new(5), Column::new(2).unwrap()),
            &CellValue::from("Referring Page URL")
        );
        assert_eq!(
            reread.cell(RowId::new(6), Column::new(4).unwrap()),
            &CellValue::Bool(true)
        );
    }

    #[test]
    fn test_blank_lines_with_crlf_and_quoted_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("s.csv");
        write(&input, "a\r\n\r\n\"multi\nline\",x\r\n\r\n\r\nb\r\n");

        let sheet = read_sheet_file("s", &input).unwrap();
        assert_eq!(sheet.row_count(), 6);
        assert_eq!(sheet.cell(RowId::new(1), Column::new(1).unwrap()), &CellValue::from("a"));
        assert!(sheet.rows()[1].is_empty());
        assert_eq!(
            sheet.cell(RowId::new(3), Column::new(1).unwrap()),
            &CellValue::from("multi\nline")
        );
        assert!(sheet.rows()[3].is_empty());
        assert!(sheet.rows()[4].is_empty());
        assert_eq!(sheet.cell(RowId::new(6), Column::new(1).unwrap()), &CellValue::from("b"));
    }
}
