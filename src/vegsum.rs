use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use veg_survey::*;

use crate::vegsum::ingest::{ingest_sheet, SheetLayout};
use crate::vegsum::io_excel::read_workbook;
use crate::vegsum::io_writer::{output_path, write_workbook};

mod ingest;
mod io_excel;
mod io_writer;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SummaryError {
    #[snafu(display("Failed to find file {path}. Did you specify the correct file path?"))]
    InputNotFound { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook does not contain any sheet"))]
    EmptyExcel {},
    #[snafu(display("Sheet {sheet} is listed in the workbook but could not be found"))]
    MissingSheet { sheet: String },
    #[snafu(display("Error reading sheet {sheet}"))]
    ReadingSheet {
        source: calamine::XlsxError,
        sheet: String,
    },
    #[snafu(display("Sheet {sheet}: missing or unreadable {what} in cell {cell}"))]
    MissingHeader {
        sheet: String,
        what: String,
        cell: String,
    },
    #[snafu(display("Sheet {sheet}: could not understand cell {cell}: {content}"))]
    WrongCellType {
        sheet: String,
        cell: String,
        content: String,
    },
    #[snafu(display("No survey could be read from {path}"))]
    NoSurveys { path: String },
    #[snafu(display("Error writing the summary workbook"))]
    WritingExcel { source: rust_xlsxwriter::XlsxError },
}

pub type SummaryResult<T> = Result<T, Box<SummaryError>>;

/// Converts a 0-based (row, column) position to the usual spreadsheet notation (B2, AA10).
pub fn cell_name(row: u32, col: u32) -> String {
    let mut letters = String::new();
    let mut n = col;
    loop {
        letters.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    format!("{}{}", letters, row + 1)
}

/// Reads all the surveys of a workbook, and writes a copy of it with a summary sheet
/// appended.
pub fn summarize_workbook(
    input: &Path,
    output: &Path,
    layout: &SheetLayout,
    rules: &SummaryRules,
) -> SummaryResult<SummaryTable> {
    let sheets = read_workbook(input)?;

    let mut registry = SurveyRegistry::new();
    for sheet in sheets.iter() {
        match ingest_sheet(sheet, layout, &mut registry) {
            Ok(id) => {
                debug!("summarize_workbook: sheet {:?} -> {:?}", sheet.name, id);
            }
            Err(e) => {
                warn!("Skipping sheet {:?}: {}", sheet.name, e);
            }
        }
    }
    ensure!(
        !registry.is_empty(),
        NoSurveysSnafu {
            path: input.display().to_string()
        }
    );
    debug!("summarize_workbook: survey dates {:?}", registry.survey_dates());

    info!("Summarizing data...");
    let table = build_summary(&registry, rules);
    if !table.anomalies.is_empty() {
        warn!(
            "{} problem(s) found while filling the summary",
            table.anomalies.len()
        );
    }

    let sheet_name = write_workbook(output, &sheets, &table)?;
    info!(
        "Saved summary file to {} (sheet {:?})",
        output.display(),
        sheet_name
    );
    Ok(table)
}

/// Summarizes the given data file with the default layout and rules.
pub fn run_summary(data: &str) -> SummaryResult<PathBuf> {
    let input = Path::new(data);
    let output = output_path(input);
    summarize_workbook(input, &output, &SheetLayout::DEFAULT, &SummaryRules::default())?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, DataType, Reader, Xlsx};
    use rust_xlsxwriter::{Format, Workbook};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // (site, date, [(species, dnf, df, fu)])
    type SheetSpec<'a> = (&'a str, &'a str, Vec<(&'a str, f64, Option<f64>, f64)>);

    fn write_input(path: &Path, sheets: &[SheetSpec]) {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        for (idx, (site, date, species)) in sheets.iter().enumerate() {
            let ws = workbook
                .add_worksheet()
                .set_name(format!("Survey {}", idx + 1))
                .unwrap();
            ws.write_string(0, 0, "Vegetation survey").unwrap();
            ws.write_string(1, 0, "Site").unwrap();
            ws.write_string(1, 1, *site).unwrap();
            ws.write_string(1, 2, "Date").unwrap();
            if let Some(serial) = date.strip_prefix("serial:") {
                let serial: f64 = serial.parse().unwrap();
                ws.write_number_with_format(1, 3, serial, &date_format)
                    .unwrap();
            } else {
                ws.write_string(1, 3, *date).unwrap();
            }
            ws.write_string(2, 0, "Species").unwrap();
            ws.write_string(2, 1, "DNF").unwrap();
            ws.write_string(2, 2, "DF").unwrap();
            ws.write_string(2, 3, "FU").unwrap();
            for (row, (name, dnf, df, fu)) in species.iter().enumerate() {
                let row = (row + 3) as u32;
                ws.write_string(row, 0, *name).unwrap();
                ws.write_number(row, 1, *dnf).unwrap();
                if let Some(df) = df {
                    ws.write_number(row, 2, *df).unwrap();
                }
                ws.write_number(row, 3, *fu).unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    fn read_sheet(path: &Path, name: &str) -> calamine::Range<DataType> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        workbook.worksheet_range(name).unwrap().unwrap()
    }

    fn float(range: &calamine::Range<DataType>, row: u32, col: u32) -> Option<f64> {
        match range.get_value((row, col)) {
            Some(DataType::Float(f)) => Some(*f),
            Some(DataType::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    fn string(range: &calamine::Range<DataType>, row: u32, col: u32) -> Option<String> {
        match range.get_value((row, col)) {
            Some(DataType::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    #[test]
    fn cell_names() {
        assert_eq!(cell_name(1, 1), "B2");
        assert_eq!(cell_name(1, 3), "D2");
        assert_eq!(cell_name(9, 26), "AA10");
    }

    #[test]
    fn missing_input() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("nothing.xlsx");
        let output = dir.path().join("nothing_summarized.xlsx");
        let res = summarize_workbook(
            &input,
            &output,
            &SheetLayout::DEFAULT,
            &SummaryRules::default(),
        );
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SummaryError::InputNotFound { .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn end_to_end() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("survey.xlsx");
        // 43891 is 2020-03-01, 43831 is 2020-01-01.
        write_input(
            &input,
            &[
                (
                    "North",
                    "serial:43891",
                    vec![("Lupine", 1.0, Some(2.0), 3.0), ("Aster", 4.0, None, 0.0)],
                ),
                ("South", "2020-02-01", vec![("Grass", 0.0, None, 5.0)]),
                ("North", "serial:43831", vec![("Lupine", 7.0, Some(8.0), 9.0)]),
                // No site name: skipped.
                ("", "2020-02-01", vec![("Grass", 1.0, None, 1.0)]),
            ],
        );
        let output = output_path(&input);
        assert_eq!(output, dir.path().join("survey_summarized.xlsx"));

        let table = summarize_workbook(
            &input,
            &output,
            &SheetLayout::DEFAULT,
            &SummaryRules::default(),
        )
        .unwrap();
        assert_eq!(table.rows.len(), 2 * 3 * 2);
        assert_eq!(table.species, vec!["Aster", "Grass", "Lupine"]);

        let mut workbook: Xlsx<_> = open_workbook(&output).unwrap();
        let names = workbook.sheet_names().to_vec();
        assert_eq!(
            names,
            vec!["Survey 1", "Survey 2", "Survey 3", "Survey 4", "Summary"]
        );

        // The original sheets are copied.
        let first = read_sheet(&output, "Survey 1");
        assert_eq!(string(&first, 1, 1), Some("North".to_string()));
        assert_eq!(float(&first, 3, 3), Some(3.0));

        let summary = read_sheet(&output, "Summary");
        let header: Vec<Option<String>> = (0..6).map(|c| string(&summary, 0, c)).collect();
        assert_eq!(
            header,
            vec![
                Some("Site".to_string()),
                Some("Variable".to_string()),
                Some("Phenology".to_string()),
                Some("Aster".to_string()),
                Some("Grass".to_string()),
                Some("Lupine".to_string()),
            ]
        );
        // Rows: DF/1 North, DF/1 South, DF/2 North, DF/2 South, DNF/1 North, ...
        assert_eq!(string(&summary, 1, 0), Some("North".to_string()));
        assert_eq!(string(&summary, 1, 1), Some("DF".to_string()));
        assert_eq!(float(&summary, 1, 2), Some(1.0));
        // North phenology 1 is the January survey.
        assert_eq!(float(&summary, 1, 5), Some(8.0));
        assert_eq!(float(&summary, 1, 3), None);
        // North phenology 2 is the March survey. The missing DF counts as zero.
        assert_eq!(string(&summary, 3, 0), Some("North".to_string()));
        assert_eq!(float(&summary, 3, 2), Some(2.0));
        assert_eq!(float(&summary, 3, 3), Some(0.0));
        assert_eq!(float(&summary, 3, 5), Some(2.0));
        // South, FU, phenology 1
        assert_eq!(string(&summary, 10, 0), Some("South".to_string()));
        assert_eq!(string(&summary, 10, 1), Some("FU".to_string()));
        assert_eq!(float(&summary, 10, 2), Some(1.0));
        assert_eq!(float(&summary, 10, 4), Some(5.0));
        // 12 rows + header
        assert_eq!(summary.height(), 13);
    }

    #[test]
    fn no_survey() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.xlsx");
        write_input(&input, &[("", "", vec![])]);
        let output = output_path(&input);
        let res = summarize_workbook(
            &input,
            &output,
            &SheetLayout::DEFAULT,
            &SummaryRules::default(),
        );
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SummaryError::NoSurveys { .. })
        ));
        assert!(!output.exists());
    }
}
