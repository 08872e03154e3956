use log::{debug, info, warn};

use crate::config::{SummaryRules, Variable};
use crate::registry::SurveyRegistry;

/// The key of a row of the summary table.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RowKey {
    pub site: String,
    pub variable: Variable,
    pub phenology: u32,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SummaryRow {
    pub key: RowKey,
    /// One value per species column. None for a blank cell.
    pub values: Vec<Option<f64>>,
}

/// Unexpected data found while filling the summary table.
///
/// None of these stop the summary: the corresponding cells are left blank.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SummaryAnomaly {
    NoMatchingSurvey {
        site: String,
        phenology: u32,
    },
    MultipleSurveys {
        site: String,
        phenology: u32,
        count: usize,
    },
    MultipleSpecies {
        site: String,
        phenology: u32,
        species: String,
        count: usize,
    },
}

/// The summary: one row per (site, variable, phenology), one column per species.
#[derive(PartialEq, Debug, Clone)]
pub struct SummaryTable {
    pub species: Vec<String>,
    pub rows: Vec<SummaryRow>,
    pub anomalies: Vec<SummaryAnomaly>,
}

impl SummaryTable {
    pub const KEY_COLUMNS: [&'static str; 3] = ["Site", "Variable", "Phenology"];

    /// The first row of the summary sheet.
    pub fn header(&self) -> Vec<String> {
        SummaryTable::KEY_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(self.species.iter().cloned())
            .collect()
    }

    pub fn site_column(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.site.as_str()).collect()
    }

    pub fn variable_column(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.variable.label()).collect()
    }

    pub fn phenology_column(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.key.phenology).collect()
    }

    /// The value of a cell, if it was filled.
    pub fn value(
        &self,
        site: &str,
        variable: Variable,
        phenology: u32,
        species: &str,
    ) -> Option<f64> {
        let col = self.species.iter().position(|s| s == species)?;
        self.rows
            .iter()
            .find(|r| r.key.site == site && r.key.variable == variable && r.key.phenology == phenology)
            .and_then(|r| r.values[col])
    }
}

/// The keys of all the rows of the summary, in order.
///
/// Variables are in alphabetical order of their labels. For each variable, the phenologies
/// go from 1 to the ceiling, and for each phenology, all the sites are listed in the given
/// order.
pub fn row_keys(sites: &[String], rules: &SummaryRules) -> Vec<RowKey> {
    let mut variables: Vec<Variable> = rules.variables.clone();
    variables.sort_by_key(|v| v.label());
    variables.dedup();

    let mut res: Vec<RowKey> = Vec::new();
    for variable in variables.iter() {
        for phenology in 1..=rules.max_phenology {
            for site in sites.iter() {
                res.push(RowKey {
                    site: site.clone(),
                    variable: *variable,
                    phenology,
                });
            }
        }
    }
    debug_assert_eq!(
        res.len(),
        sites.len() * variables.len() * (rules.max_phenology as usize)
    );
    res
}

/// Builds the summary table from all the registered surveys.
pub fn build_summary(registry: &SurveyRegistry, rules: &SummaryRules) -> SummaryTable {
    let sites = registry.sites();
    let species = registry.species_names();
    info!(
        "build_summary: {} sites, {} species, ceiling {}",
        sites.len(),
        species.len(),
        rules.max_phenology
    );
    if registry.max_phenology() > rules.max_phenology {
        for (site, count) in registry.sites_above(rules.max_phenology) {
            warn!(
                "Site {:?} has {} surveys but only the first {} phenologies are summarized",
                site, count, rules.max_phenology
            );
        }
    }

    let mut anomalies: Vec<SummaryAnomaly> = Vec::new();
    let mut rows: Vec<SummaryRow> = Vec::new();
    for key in row_keys(&sites, rules) {
        let mut values: Vec<Option<f64>> = vec![None; species.len()];
        let surveys = registry.find(&key.site, key.phenology);
        match surveys.as_slice() {
            [survey] => {
                for (col, name) in species.iter().enumerate() {
                    match survey.find_species(name).as_slice() {
                        [sp] => {
                            values[col] = Some(sp.value(key.variable));
                        }
                        // Not all the surveys have all the species.
                        [] => {}
                        matches => {
                            warn!(
                                "Unexpected number of matching species! Expected 1, got {}: {:?} in site {:?} phenology {}",
                                matches.len(),
                                name,
                                key.site,
                                key.phenology
                            );
                            anomalies.push(SummaryAnomaly::MultipleSpecies {
                                site: key.site.clone(),
                                phenology: key.phenology,
                                species: name.clone(),
                                count: matches.len(),
                            });
                        }
                    }
                }
            }
            [] => {
                warn!(
                    "No matching survey found for site {:?} phenology {}",
                    key.site, key.phenology
                );
                anomalies.push(SummaryAnomaly::NoMatchingSurvey {
                    site: key.site.clone(),
                    phenology: key.phenology,
                });
            }
            matches => {
                warn!(
                    "Unexpected number of matching surveys! Expected 1, got {} for site {:?} phenology {}",
                    matches.len(),
                    key.site,
                    key.phenology
                );
                anomalies.push(SummaryAnomaly::MultipleSurveys {
                    site: key.site.clone(),
                    phenology: key.phenology,
                    count: matches.len(),
                });
            }
        }
        debug!("build_summary: {:?} -> {:?}", key, values);
        rows.push(SummaryRow { key, values });
    }

    SummaryTable {
        species,
        rows,
        anomalies,
    }
}
