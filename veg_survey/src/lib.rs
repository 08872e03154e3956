/*!
Phenology numbering and summary tables for repeated vegetation surveys.

A site is surveyed several times during a season. Each survey records, for every
species observed, its non-flowering density (DNF), its flowering density (DF) and its
number of floral units (FU). This crate:

- keeps all the surveys of a run in a [`SurveyRegistry`], which numbers the surveys of
  each site by date as they get registered (the "phenology" of a survey),
- lays out and fills a [`SummaryTable`] with one row per site, variable and phenology,
  and one column per species. Its shape is set by [`SummaryRules`], which can be read
  from JSON.

```
use chrono::NaiveDate;
use veg_survey::{build_summary, SpeciesRecord, SummaryRules, SurveyRegistry, Variable};

let mut registry = SurveyRegistry::new();
let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
registry.register("North", date, vec![SpeciesRecord::new("Lupine", None, Some(2.0), None)]);

let table = build_summary(&registry, &SummaryRules::default());
assert_eq!(table.value("North", Variable::FloweringDensity, 1, "Lupine"), Some(2.0));
```

The input format of the command line tool is described in the [`manual`].
*/

mod config;
pub mod manual;
mod registry;
mod summary;

pub use crate::config::*;
pub use crate::registry::*;
pub use crate::summary::*;
