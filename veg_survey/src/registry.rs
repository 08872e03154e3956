use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use log::debug;

use crate::config::SpeciesRecord;

/// Handle to a survey stored in a registry.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct SurveyId(usize);

/// One visit to a site: the species observed on a given date.
#[derive(PartialEq, Debug, Clone)]
pub struct Survey {
    site: String,
    date: NaiveDateTime,
    species: Vec<SpeciesRecord>,
    // Only updated by the registry that owns this survey.
    phenology: u32,
}

impl Survey {
    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    /// The species, in the order of the rows of the sheet.
    pub fn species(&self) -> &[SpeciesRecord] {
        &self.species
    }

    /// The 1-based rank of this survey among the surveys of the same site, by date.
    pub fn phenology(&self) -> u32 {
        self.phenology
    }

    /// All the records with the given species identifier.
    pub fn find_species(&self, name: &str) -> Vec<&SpeciesRecord> {
        self.species.iter().filter(|sp| sp.name() == name).collect()
    }
}

/// All the surveys known for one conversion run.
///
/// The registry owns the surveys and keeps their phenology numbers up to date as new
/// surveys get registered, in any order.
#[derive(Debug, Clone, Default)]
pub struct SurveyRegistry {
    surveys: Vec<Survey>,
    dates: BTreeSet<NaiveDateTime>,
}

impl SurveyRegistry {
    pub fn new() -> SurveyRegistry {
        SurveyRegistry::default()
    }

    /// Registers a new survey and returns its handle.
    ///
    /// The new survey is ranked after all the surveys of the same site with an earlier or
    /// equal date. The surveys of the same site with a later date move down by one.
    pub fn register(
        &mut self,
        site: &str,
        date: NaiveDateTime,
        species: Vec<SpeciesRecord>,
    ) -> SurveyId {
        let mut preceding: u32 = 0;
        for survey in self.surveys.iter_mut().filter(|s| s.site == site) {
            if survey.date > date {
                survey.phenology += 1;
            } else {
                preceding += 1;
            }
        }
        let phenology = preceding + 1;
        debug!(
            "register: site {:?} date {} -> phenology {}",
            site, date, phenology
        );

        self.dates.insert(date);
        self.surveys.push(Survey {
            site: site.to_string(),
            date,
            species,
            phenology,
        });
        SurveyId(self.surveys.len() - 1)
    }

    pub fn get(&self, id: SurveyId) -> Option<&Survey> {
        self.surveys.get(id.0)
    }

    /// The surveys, in registration order.
    pub fn surveys(&self) -> &[Survey] {
        &self.surveys
    }

    pub fn len(&self) -> usize {
        self.surveys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surveys.is_empty()
    }

    pub fn surveys_at_site(&self, site: &str) -> Vec<&Survey> {
        self.surveys.iter().filter(|s| s.site == site).collect()
    }

    /// All the surveys of a site that have the given phenology number.
    ///
    /// Under normal conditions, there is at most one.
    pub fn find(&self, site: &str, phenology: u32) -> Vec<&Survey> {
        self.surveys
            .iter()
            .filter(|s| s.site == site && s.phenology == phenology)
            .collect()
    }

    /// The distinct site names, sorted.
    pub fn sites(&self) -> Vec<String> {
        let sites: BTreeSet<&str> = self.surveys.iter().map(|s| s.site.as_str()).collect();
        sites.into_iter().map(|s| s.to_string()).collect()
    }

    /// The distinct species identifiers across all surveys, sorted.
    /// Empty identifiers (blank name cells) are not included.
    pub fn species_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .surveys
            .iter()
            .flat_map(|s| s.species.iter())
            .map(|sp| sp.name())
            .filter(|name| !name.is_empty())
            .collect();
        names.into_iter().map(|s| s.to_string()).collect()
    }

    /// All the distinct dates at which any site was surveyed, sorted.
    pub fn survey_dates(&self) -> Vec<NaiveDateTime> {
        self.dates.iter().cloned().collect()
    }

    /// The number of surveys of the most surveyed site.
    pub fn max_phenology(&self) -> u32 {
        self.surveys.iter().map(|s| s.phenology).max().unwrap_or(0)
    }

    /// The sites that have more surveys than the given ceiling, with their count.
    pub fn sites_above(&self, ceiling: u32) -> Vec<(String, u32)> {
        let res: Vec<(String, u32)> = self
            .sites()
            .into_iter()
            .map(|site| {
                let count = self.surveys_at_site(&site).len() as u32;
                (site, count)
            })
            .filter(|(_, count)| *count > ceiling)
            .collect();
        debug!("sites_above: {} site(s) above {}", res.len(), ceiling);
        res
    }
}
