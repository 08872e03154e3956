use chrono::NaiveDateTime;

use crate::vegsum::io_excel::{read_date, read_measure, read_text, SheetData};
use crate::vegsum::*;

/// Where the information is located in a survey sheet. Positions are 0-based.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetLayout {
    pub site_cell: (u32, u32),
    pub date_cell: (u32, u32),
    /// The number of rows before the first species.
    pub header_rows: u32,
    /// The column of the species name. The three measurements follow it.
    pub species_column: u32,
}

impl SheetLayout {
    /// Site in B2, date in D2, species from row 4 in columns A to D.
    pub const DEFAULT: SheetLayout = SheetLayout {
        site_cell: (1, 1),
        date_cell: (1, 3),
        header_rows: 3,
        species_column: 0,
    };
}

/// The content of one survey sheet.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedSurvey {
    pub site: String,
    pub date: NaiveDateTime,
    pub species: Vec<SpeciesRecord>,
}

pub fn read_site_name(sheet: &SheetData, layout: &SheetLayout) -> SummaryResult<String> {
    let (row, col) = layout.site_cell;
    let site = read_text(sheet, row, col)?;
    site.context(MissingHeaderSnafu {
        sheet: sheet.name.clone(),
        what: "site name",
        cell: cell_name(row, col),
    })
    .map_err(Box::new)
}

pub fn read_survey_date(sheet: &SheetData, layout: &SheetLayout) -> SummaryResult<NaiveDateTime> {
    let (row, col) = layout.date_cell;
    read_date(sheet, row, col)
        .context(MissingHeaderSnafu {
            sheet: sheet.name.clone(),
            what: "survey date",
            cell: cell_name(row, col),
        })
        .map_err(Box::new)
}

/// A measurement that cannot be read is absent, and counts as zero.
fn measure_or_absent(sheet: &SheetData, row: u32, col: u32) -> Option<f64> {
    match read_measure(sheet, row, col) {
        Ok(x) => x,
        Err(e) => {
            warn!("{}, counted as zero", e);
            None
        }
    }
}

/// Reads one species per row, after the header rows and up to the last used row.
pub fn read_species(sheet: &SheetData, layout: &SheetLayout) -> Vec<SpeciesRecord> {
    let mut res: Vec<SpeciesRecord> = Vec::new();
    let last_row = match sheet.last_row() {
        Some(x) => x,
        None => return res,
    };
    let col = layout.species_column;
    for row in layout.header_rows..=last_row {
        // Rows without a readable name are kept, with an empty identifier.
        let name = match read_text(sheet, row, col) {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                warn!("{}, species name left empty", e);
                String::new()
            }
        };
        let dnf = measure_or_absent(sheet, row, col + 1);
        let df = measure_or_absent(sheet, row, col + 2);
        let fu = measure_or_absent(sheet, row, col + 3);
        let sp = SpeciesRecord::new(&name, dnf, df, fu);
        debug!("read_species: {:?}: {:?}", sheet.name, sp);
        res.push(sp);
    }
    res
}

pub fn read_survey(sheet: &SheetData, layout: &SheetLayout) -> SummaryResult<ParsedSurvey> {
    let site = read_site_name(sheet, layout)?;
    let date = read_survey_date(sheet, layout)?;
    info!("Working on site: {} ({})", site, date.format("%Y-%m-%d"));
    let species = read_species(sheet, layout);
    Ok(ParsedSurvey {
        site,
        date,
        species,
    })
}

/// Reads a sheet and registers its survey.
/// Nothing is registered if the sheet cannot be read.
pub fn ingest_sheet(
    sheet: &SheetData,
    layout: &SheetLayout,
    registry: &mut SurveyRegistry,
) -> SummaryResult<SurveyId> {
    let survey = read_survey(sheet, layout)?;
    Ok(registry.register(&survey.site, survey.date, survey.species))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{DataType, Range};
    use chrono::NaiveDate;

    fn sheet(
        name: &str,
        site: Option<&str>,
        date: Option<f64>,
        rows: &[[DataType; 4]],
    ) -> SheetData {
        let mut range = Range::new((0, 0), (2 + rows.len() as u32, 3));
        range.set_value((0, 0), DataType::String("Survey".to_string()));
        if let Some(s) = site {
            range.set_value((1, 1), DataType::String(s.to_string()));
        }
        if let Some(d) = date {
            range.set_value((1, 3), DataType::DateTime(d));
        }
        for (idx, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                range.set_value((3 + idx as u32, col as u32), value.clone());
            }
        }
        SheetData {
            name: name.to_string(),
            range,
        }
    }

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    #[test]
    fn reads_a_survey() {
        let sh = sheet(
            "North 1",
            Some("North"),
            Some(43891.0),
            &[
                [s("Grass"), DataType::Empty, DataType::Empty, DataType::Int(5)],
                [s("Lupine"), DataType::Float(1.5), DataType::Float(2.0), s("12")],
                [DataType::Empty, DataType::Empty, DataType::Empty, DataType::Empty],
            ],
        );
        let survey = read_survey(&sh, &SheetLayout::DEFAULT).unwrap();
        assert_eq!(survey.site, "North");
        assert_eq!(
            survey.date,
            NaiveDate::from_ymd_opt(2020, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(
            survey.species,
            vec![
                SpeciesRecord::new("Grass", None, None, Some(5.0)),
                SpeciesRecord::new("Lupine", Some(1.5), Some(2.0), Some(12.0)),
                SpeciesRecord::new("", None, None, None),
            ]
        );
    }

    #[test]
    fn missing_headers() {
        let no_site = sheet("Notes", None, Some(43891.0), &[]);
        assert!(matches!(
            read_survey(&no_site, &SheetLayout::DEFAULT).map_err(|e| *e),
            Err(SummaryError::MissingHeader { cell, .. }) if cell == "B2"
        ));
        let no_date = sheet("Notes", Some("North"), None, &[]);
        assert!(matches!(
            read_survey(&no_date, &SheetLayout::DEFAULT).map_err(|e| *e),
            Err(SummaryError::MissingHeader { cell, .. }) if cell == "D2"
        ));
    }

    #[test]
    fn registers_in_the_registry() {
        let mut registry = SurveyRegistry::new();
        let later = sheet("b", Some("A"), Some(43891.0), &[]);
        let earlier = sheet("a", Some("A"), Some(43831.0), &[]);
        let bad = sheet("c", None, Some(43800.0), &[]);
        let later_id = ingest_sheet(&later, &SheetLayout::DEFAULT, &mut registry).unwrap();
        let earlier_id = ingest_sheet(&earlier, &SheetLayout::DEFAULT, &mut registry).unwrap();
        assert!(ingest_sheet(&bad, &SheetLayout::DEFAULT, &mut registry).is_err());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(earlier_id).unwrap().phenology(), 1);
        assert_eq!(registry.get(later_id).unwrap().phenology(), 2);
    }

    #[test]
    fn unreadable_measurements_keep_the_survey() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut registry = SurveyRegistry::new();
        let january = sheet(
            "a",
            Some("A"),
            Some(43831.0),
            &[[s("Lupine"), DataType::Float(1.0), DataType::Empty, DataType::Empty]],
        );
        let march = sheet(
            "b",
            Some("A"),
            Some(43891.0),
            &[
                [s("Lupine"), s("T"), DataType::Float(2.0), DataType::Empty],
                [
                    s("Aster"),
                    DataType::Float(3.0),
                    DataType::Error(calamine::CellErrorType::Div0),
                    DataType::Bool(true),
                ],
                [DataType::Bool(false), DataType::Float(4.0), DataType::Empty, DataType::Empty],
            ],
        );
        let jan_id = ingest_sheet(&january, &SheetLayout::DEFAULT, &mut registry).unwrap();
        let mar_id = ingest_sheet(&march, &SheetLayout::DEFAULT, &mut registry).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find("A", 1).len(), 1);
        assert_eq!(registry.find("A", 2).len(), 1);
        assert_eq!(registry.get(jan_id).unwrap().phenology(), 1);

        let mar = registry.get(mar_id).unwrap();
        assert_eq!(mar.phenology(), 2);
        assert_eq!(
            mar.species(),
            &[
                SpeciesRecord::new("Lupine", None, Some(2.0), None),
                SpeciesRecord::new("Aster", Some(3.0), None, None),
                SpeciesRecord::new("", Some(4.0), None, None),
            ]
        );
    }
}
