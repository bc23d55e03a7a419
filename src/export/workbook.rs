//! xlsx writing and the two-step save

use super::{CellValue, ExportSheet};
use crate::{ReportError, Result};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

fn xlsx_error(err: XlsxError) -> ReportError {
    ReportError::Export(err.to_string())
}

/// Write the sheet into a new workbook. Every cell is left and vertically
/// centre aligned.
pub fn write_workbook(sheet: &ExportSheet) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let aligned = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.sheet_name).map_err(xlsx_error)?;

    for (col, (header, width)) in sheet.headers.iter().zip(&sheet.widths).enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, header, &aligned)
            .map_err(xlsx_error)?;
        worksheet
            .set_column_width(col, *width)
            .map_err(xlsx_error)?;
    }

    for (index, cells) in sheet.rows.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, &aligned),
                CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, &aligned),
            };
            written.map_err(xlsx_error)?;
        }
    }

    let legend_row = sheet.legend_row();
    worksheet
        .write_string_with_format(legend_row, 0, "Legend:", &aligned)
        .map_err(xlsx_error)?;
    for (offset, line) in sheet.legend.iter().enumerate() {
        worksheet
            .write_string_with_format(legend_row + 1 + offset as u32, 0, line, &aligned)
            .map_err(xlsx_error)?;
    }

    Ok(workbook)
}

/// Save to `primary_dir`; if that fails, serialize to memory and write the
/// bytes into `fallback_dir`. Both failing yields one combined error.
pub fn save_with_fallback(
    workbook: &mut Workbook,
    file_name: &str,
    primary_dir: &Path,
    fallback_dir: &Path,
) -> Result<PathBuf> {
    let primary = primary_dir.join(file_name);
    let first = match workbook.save(&primary) {
        Ok(()) => return Ok(primary),
        Err(err) => err.to_string(),
    };
    warn!(path = %primary.display(), error = %first, "primary save failed, trying fallback");

    let fallback = fallback_dir.join(file_name);
    let second = workbook
        .save_to_buffer()
        .map_err(|e| e.to_string())
        .and_then(|bytes| fs::write(&fallback, bytes).map_err(|e| e.to_string()));

    match second {
        Ok(()) => Ok(fallback),
        Err(second) => Err(ReportError::Export(format!(
            "could not save {} ({}); fallback {} also failed ({})",
            primary.display(),
            first,
            fallback.display(),
            second
        ))),
    }
}
