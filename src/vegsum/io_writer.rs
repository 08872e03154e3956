// Primitives for writing the summarized workbook.

use calamine::{DataType, Range};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::vegsum::io_excel::SheetData;
use crate::vegsum::*;

/// The number of columns in an xlsx worksheet.
const MAX_COLUMNS: u32 = 16_384;

pub const SUMMARY_SHEET: &str = "Summary";

/// The path of the summarized copy: `survey.xlsx` -> `survey_summarized.xlsx`.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{}_summarized.{}", stem, ext.to_string_lossy()),
        None => format!("{}_summarized", stem),
    };
    input.with_file_name(file_name)
}

/// The name of the summary sheet, which must not clash with an existing sheet.
/// Sheet names are compared without case, as in Excel.
pub fn summary_sheet_name(existing: &[String]) -> String {
    let taken = |name: &str| existing.iter().any(|e| e.eq_ignore_ascii_case(name));
    if !taken(SUMMARY_SHEET) {
        return SUMMARY_SHEET.to_string();
    }
    let mut idx = 1;
    while taken(&format!("{}{}", SUMMARY_SHEET, idx)) {
        idx += 1;
    }
    format!("{}{}", SUMMARY_SHEET, idx)
}

fn copy_cells(
    worksheet: &mut Worksheet,
    range: &Range<DataType>,
    date_format: &Format,
) -> SummaryResult<usize> {
    let (start_row, start_col) = match range.start() {
        Some(x) => x,
        None => return Ok(0),
    };
    let mut count = 0;
    for (row_idx, row) in range.rows().enumerate() {
        let r = start_row + row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = (start_col + col_idx as u32) as u16;
            match cell {
                DataType::Empty => continue,
                DataType::String(s) => {
                    worksheet.write_string(r, c, s).context(WritingExcelSnafu {})?;
                }
                DataType::Float(f) => {
                    worksheet.write_number(r, c, *f).context(WritingExcelSnafu {})?;
                }
                DataType::Int(i) => {
                    worksheet
                        .write_number(r, c, *i as f64)
                        .context(WritingExcelSnafu {})?;
                }
                DataType::Bool(b) => {
                    worksheet.write_boolean(r, c, *b).context(WritingExcelSnafu {})?;
                }
                DataType::DateTime(serial) => {
                    worksheet
                        .write_number_with_format(r, c, *serial, date_format)
                        .context(WritingExcelSnafu {})?;
                }
                other => {
                    // Cell errors are kept as text.
                    worksheet
                        .write_string(r, c, format!("{:?}", other))
                        .context(WritingExcelSnafu {})?;
                }
            }
            count += 1;
        }
    }
    Ok(count)
}

/// Writes the summary table. Returns the number of species that did not fit in the
/// sheet.
fn write_summary(worksheet: &mut Worksheet, table: &SummaryTable) -> SummaryResult<usize> {
    // Header
    let mut dropped = 0;
    for (col, title) in table.header().iter().enumerate() {
        if col as u32 >= MAX_COLUMNS {
            warn!("Failed to write header for {}!", title);
            dropped += 1;
            continue;
        }
        worksheet
            .write_string(0, col as u16, title)
            .context(WritingExcelSnafu {})?;
    }
    if dropped > 0 {
        warn!(
            "{} species are beyond the last column of the sheet and are not summarized",
            dropped
        );
    }

    // Key columns
    let key_columns = table
        .site_column()
        .into_iter()
        .zip(table.variable_column())
        .zip(table.phenology_column());
    for (idx, ((site, variable), phenology)) in key_columns.enumerate() {
        let r = (idx + 1) as u32;
        worksheet
            .write_string(r, 0, site)
            .context(WritingExcelSnafu {})?;
        worksheet
            .write_string(r, 1, variable)
            .context(WritingExcelSnafu {})?;
        worksheet
            .write_number(r, 2, phenology as f64)
            .context(WritingExcelSnafu {})?;
    }

    let first_species_col = SummaryTable::KEY_COLUMNS.len() as u32;
    for (idx, row) in table.rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, value) in row.values.iter().enumerate() {
            let c = first_species_col + col as u32;
            if c >= MAX_COLUMNS {
                break;
            }
            // Blank cells are not written.
            if let Some(v) = value {
                worksheet
                    .write_number(r, c as u16, *v)
                    .context(WritingExcelSnafu {})?;
            }
        }
    }
    Ok(dropped)
}

/// Writes all the sheets of the input, followed by the summary, and saves the workbook.
/// Returns the name of the summary sheet.
pub fn write_workbook(
    path: &Path,
    sheets: &[SheetData],
    table: &SummaryTable,
) -> SummaryResult<String> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for sheet in sheets.iter() {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .context(WritingExcelSnafu {})?;
        let count = copy_cells(worksheet, &sheet.range, &date_format)?;
        debug!("write_workbook: copied {} cells of {:?}", count, sheet.name);
    }

    let existing: Vec<String> = sheets.iter().map(|s| s.name.clone()).collect();
    let sheet_name = summary_sheet_name(&existing);
    let worksheet = workbook
        .add_worksheet()
        .set_name(&sheet_name)
        .context(WritingExcelSnafu {})?;
    let dropped = write_summary(worksheet, table)?;
    debug!("write_workbook: {} species not written", dropped);

    workbook.save(path).context(WritingExcelSnafu {})?;
    Ok(sheet_name)
}
