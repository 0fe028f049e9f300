use super::base::{RecordSink, StorageError};
use crate::model::{ListingRecord, RowTag};
use log::debug;
use rust_xlsxwriter::{Color, Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Empresas";

/// Header text and width of each output column.
pub const COLUMNS: [(&str, f64); 7] = [
    ("Empresa buscada", 30.0),
    ("Nombre", 30.0),
    ("Dirección", 40.0),
    ("Teléfono", 20.0),
    ("Web", 30.0),
    ("Maps URL", 40.0),
    ("Categoría", 30.0),
];

const NOT_FOUND_FILL: u32 = 0xFFCCCC;
const RELATED_FILL: u32 = 0xCCE5FF;

/// Spreadsheet sink. The workbook is rebuilt and rewritten on every flush.
pub struct XlsxSink {
    path: PathBuf,
    rows: Vec<(ListingRecord, RowTag)>,
}

impl XlsxSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            rows: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build(&self) -> Result<Workbook, StorageError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let not_found = Format::new().set_background_color(Color::RGB(NOT_FOUND_FILL));
        let related = Format::new().set_background_color(Color::RGB(RELATED_FILL));

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        for (col, (title, width)) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            sheet.set_column_width(col, *width)?;
            sheet.write_string_with_format(0, col, *title, &header)?;
        }

        for (index, (record, tag)) in self.rows.iter().enumerate() {
            let row = index as u32 + 1;
            let fill = match tag {
                RowTag::PrimaryOk => None,
                RowTag::PrimaryNotFound => Some(&not_found),
                RowTag::Related => Some(&related),
            };

            for (col, value) in record.cells().iter().enumerate() {
                let col = col as u16;
                match (fill, value.is_empty()) {
                    (Some(format), true) => {
                        sheet.write_blank(row, col, format)?;
                    }
                    (Some(format), false) => {
                        sheet.write_string_with_format(row, col, *value, format)?;
                    }
                    (None, true) => {}
                    (None, false) => {
                        sheet.write_string(row, col, *value)?;
                    }
                }
            }
        }

        Ok(workbook)
    }
}

impl RecordSink for XlsxSink {
    fn append(&mut self, record: &ListingRecord, tag: RowTag) -> Result<(), StorageError> {
        self.rows.push((record.clone(), tag));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        let mut workbook = self.build()?;
        let staging = self.path.with_extension("xlsx.partial");
        workbook.save(&staging)?;
        fs::rename(&staging, &self.path)?;
        debug!("Wrote {} rows to {}", self.rows.len(), self.path.display());
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
