// Primitives for reading the survey workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};

use crate::vegsum::*;

/// A sheet of the input workbook, held in memory.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub range: Range<DataType>,
}

impl SheetData {
    /// The content of a cell, using absolute 0-based positions.
    /// None if the cell is outside of the used range.
    pub fn cell(&self, row: u32, col: u32) -> Option<&DataType> {
        self.range.get_value((row, col))
    }

    /// The index of the last used row.
    pub fn last_row(&self) -> Option<u32> {
        self.range.end().map(|(row, _)| row)
    }
}

/// Opens the workbook and reads all its sheets, in order.
pub fn read_workbook(path: &Path) -> SummaryResult<Vec<SheetData>> {
    let path_s = path.display().to_string();
    ensure!(path.is_file(), InputNotFoundSnafu { path: path_s });
    info!("Attempting to open data file {:?}", path_s);
    let mut workbook: Xlsx<_> =
        open_workbook(path).context(OpeningExcelSnafu { path: path_s.clone() })?;
    info!("File loaded!");

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    info!("The following sheets are in this workbook: {:?}", sheet_names);
    ensure!(!sheet_names.is_empty(), EmptyExcelSnafu {});

    let mut res: Vec<SheetData> = Vec::new();
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .context(MissingSheetSnafu { sheet: name.clone() })?
            .context(ReadingSheetSnafu { sheet: name.clone() })?;
        debug!(
            "read_workbook: sheet {:?} start {:?} end {:?}",
            name,
            range.start(),
            range.end()
        );
        res.push(SheetData { name, range });
    }
    Ok(res)
}

fn wrong_cell(sheet: &SheetData, row: u32, col: u32, content: String) -> Box<SummaryError> {
    Box::new(SummaryError::WrongCellType {
        sheet: sheet.name.clone(),
        cell: cell_name(row, col),
        content,
    })
}

/// Reads a measurement. Empty cells and blank strings are absent measurements.
pub fn read_measure(sheet: &SheetData, row: u32, col: u32) -> SummaryResult<Option<f64>> {
    match sheet.cell(row, col) {
        None | Some(DataType::Empty) => Ok(None),
        Some(DataType::Float(f)) => Ok(Some(*f)),
        Some(DataType::Int(i)) => Ok(Some(*i as f64)),
        Some(DataType::String(s)) if s.trim().is_empty() => Ok(None),
        Some(DataType::String(s)) => match s.trim().parse::<f64>() {
            Ok(x) => Ok(Some(x)),
            Err(_) => Err(wrong_cell(sheet, row, col, format!("{:?}", s))),
        },
        Some(cell) => Err(wrong_cell(sheet, row, col, format!("{:?}", cell))),
    }
}

/// Reads a text cell. Numbers are rendered as text, empty cells and blank strings are
/// absent.
pub fn read_text(sheet: &SheetData, row: u32, col: u32) -> SummaryResult<Option<String>> {
    match sheet.cell(row, col) {
        None | Some(DataType::Empty) => Ok(None),
        Some(DataType::String(s)) if s.trim().is_empty() => Ok(None),
        Some(DataType::String(s)) => Ok(Some(s.clone())),
        Some(DataType::Float(f)) => Ok(Some(f.to_string())),
        Some(DataType::Int(i)) => Ok(Some(i.to_string())),
        Some(cell) => Err(wrong_cell(sheet, row, col, format!("{:?}", cell))),
    }
}

/// The serial of 9999-12-31, the last date Excel can represent.
const MAX_SERIAL: f64 = 2_958_465.0;

/// Converts a serial date of the 1900 date system to a date and time.
///
/// Excel counts a fictitious 1900-02-29 (serial 60). Serials before it are one day
/// ahead of the serials after it, and the fictitious day itself has no date.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= MAX_SERIAL + 1.0 {
        return None;
    }
    let epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else if serial < 61.0 {
        return None;
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let ms = (serial * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(chrono::Duration::try_milliseconds(ms)?)
}

const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d",
    "%m/%d/%Y",
];

fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATE_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Reads a date, either stored as a date or as text.
pub fn read_date(sheet: &SheetData, row: u32, col: u32) -> Option<NaiveDateTime> {
    match sheet.cell(row, col) {
        Some(DataType::DateTime(serial)) | Some(DataType::Float(serial)) => {
            excel_serial_to_datetime(*serial)
        }
        Some(DataType::Int(i)) => excel_serial_to_datetime(*i as f64),
        Some(DataType::String(s)) => parse_date_string(s),
        _ => None,
    }
}
