/*!

This is the long-form manual for `veg_survey` and `vegsum`.

## Input format

The input is an Excel (.xlsx) workbook with one sheet per survey. A site that was
surveyed twice has two sheets. The order of the sheets does not matter.

Each sheet follows the same layout:

| Row | A             | B                      | C                  | D                  |
|-----|---------------|------------------------|--------------------|--------------------|
| 1   | (free)        | (free)                 | (free)             | (free)             |
| 2   | (free)        | **site name**          | (free)             | **survey date**    |
| 3   | (free)        | (free)                 | (free)             | (free)             |
| 4.. | species name  | non-flowering density  | flowering density  | floral units       |

Empty measurement cells count as zero. A measurement that is not a number (a trace mark
such as `T`, or a formula error) is reported with a warning and also counts as zero.
A sheet with no site name or no readable date is skipped with a warning.

## Phenology

The surveys of a site are numbered by date, starting at 1. This number is called the
phenology of the survey. Two surveys of the same site on the same date are numbered in
the order of their sheets.

## Output

`vegsum -d survey.xlsx` writes `survey_summarized.xlsx` next to the input. It contains
all the original sheets (values only) followed by a `Summary` sheet:

| Site  | Variable | Phenology | Aster | Lupine |
|-------|----------|-----------|-------|--------|
| North | DF       | 1         | 0     | 2      |
| South | DF       | 1         |       | 4      |
| North | DF       | 2         | 1     |        |
| ...   | ...      | ...       | ...   | ...    |

A blank cell means that the species was not recorded in that survey. Only the first
two phenologies of each site are summarized.

## Summary rules

The shape of the summary is controlled by [`SummaryRules`](crate::SummaryRules). The
command line tool uses the defaults: the three variables and two phenologies. Library
users can read the rules from a JSON document, in which every field is optional:

```
use veg_survey::{SummaryRules, Variable};

let rules = SummaryRules::from_json_str(r#"{"variables": ["DF", "FU"], "maxPhenology": 3}"#)
    .unwrap();
assert_eq!(rules.variables, vec![Variable::FloweringDensity, Variable::FloweringUnits]);
assert_eq!(rules.max_phenology, 3);
```

Set the `RUST_LOG` environment variable to `debug` for a detailed trace, or to `warn`
to only see the problems found in the data.
*/
