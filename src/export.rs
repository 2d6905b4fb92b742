use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::db;
use crate::error::SinkError;
use crate::table::Table;

/// Writes a cleaned table to a single file with a leading 1-based `id` column.
pub trait TableSink {
    fn write(&self, table: &Table, path: &Path) -> Result<(), SinkError>;
}

pub struct XlsxSink;

impl TableSink for XlsxSink {
    fn write(&self, table: &Table, path: &Path) -> Result<(), SinkError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let bold = Format::new().set_bold();

        sheet.write_string_with_format(0, 0, "id", &bold)?;
        for (c, name) in table.columns().iter().enumerate() {
            sheet.write_string_with_format(0, c as u16 + 1, name, &bold)?;
        }
        for (r, row) in table.rows().iter().enumerate() {
            let line = r as u32 + 1;
            sheet.write_number(line, 0, line as f64)?;
            for (c, cell) in row.iter().enumerate() {
                sheet.write_string(line, c as u16 + 1, cell)?;
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

pub struct SqliteSink;

impl TableSink for SqliteSink {
    fn write(&self, table: &Table, path: &Path) -> Result<(), SinkError> {
        let conn = db::connect(path)?;
        db::save_table(&conn, table)?;
        Ok(())
    }
}

/// Pick a sink from the output file extension.
pub fn sink_for(path: &Path) -> Result<Box<dyn TableSink>, SinkError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("xlsx") => Ok(Box::new(XlsxSink)),
        Some("sqlite") | Some("db") => Ok(Box::new(SqliteSink)),
        _ => Err(SinkError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Write `table` to `path` through `sink`, creating parent directories as needed.
pub fn export(sink: &dyn TableSink, table: &Table, path: &Path) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    sink.write(table, path)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
