// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The measured quantities of a species in a survey.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Density of the individuals that are not flowering (DNF).
    #[serde(rename = "DNF")]
    NonFloweringDensity,
    /// Density of the flowering individuals (DF).
    #[serde(rename = "DF")]
    FloweringDensity,
    /// Number of floral units (FU).
    #[serde(rename = "FU")]
    FloweringUnits,
}

impl Variable {
    /// The variables in the order in which they are recorded on a survey sheet.
    pub const ALL: [Variable; 3] = [
        Variable::NonFloweringDensity,
        Variable::FloweringDensity,
        Variable::FloweringUnits,
    ];

    /// The short label used in the summary sheet.
    pub fn label(&self) -> &'static str {
        match self {
            Variable::NonFloweringDensity => "DNF",
            Variable::FloweringDensity => "DF",
            Variable::FloweringUnits => "FU",
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The measurements of one species during one survey.
///
/// Missing measurements are recorded as zero, never as an absent value.
#[derive(PartialEq, Debug, Clone)]
pub struct SpeciesRecord {
    name: String,
    non_flowering_density: f64,
    flowering_density: f64,
    flowering_units: f64,
}

impl SpeciesRecord {
    pub fn new(
        name: &str,
        non_flowering_density: Option<f64>,
        flowering_density: Option<f64>,
        flowering_units: Option<f64>,
    ) -> SpeciesRecord {
        SpeciesRecord {
            name: name.to_string(),
            non_flowering_density: non_flowering_density.unwrap_or(0.0),
            flowering_density: flowering_density.unwrap_or(0.0),
            flowering_units: flowering_units.unwrap_or(0.0),
        }
    }

    /// The species identifier. It is empty when the name cell was blank.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn non_flowering_density(&self) -> f64 {
        self.non_flowering_density
    }

    pub fn flowering_density(&self) -> f64 {
        self.flowering_density
    }

    pub fn flowering_units(&self) -> f64 {
        self.flowering_units
    }

    /// The measurement selected by a summary variable.
    pub fn value(&self, variable: Variable) -> f64 {
        match variable {
            Variable::NonFloweringDensity => self.non_flowering_density,
            Variable::FloweringDensity => self.flowering_density,
            Variable::FloweringUnits => self.flowering_units,
        }
    }
}

// ******** Errors *********

/// Errors raised when reading summary rules.
#[derive(Debug)]
pub enum RulesError {
    Parsing(serde_json::Error),
    EmptyVariables,
    InvalidCeiling(u32),
}

impl Error for RulesError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RulesError::Parsing(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for RulesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulesError::Parsing(e) => write!(f, "Could not parse the summary rules: {}", e),
            RulesError::EmptyVariables => write!(f, "At least one variable must be summarized"),
            RulesError::InvalidCeiling(x) => {
                write!(f, "The phenology ceiling must be at least 1, got {}", x)
            }
        }
    }
}

// ********* Configuration **********

/// The rules that control the shape of the summary table.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRules {
    /// The variables summarized for each site and phenology.
    #[serde(default = "default_variables")]
    pub variables: Vec<Variable>,
    /// The number of phenologies that get a row in the summary.
    ///
    /// This is a fixed ceiling: it is not derived from the surveys. Sites with more
    /// surveys than this are only partially summarized.
    #[serde(rename = "maxPhenology", default = "default_max_phenology")]
    pub max_phenology: u32,
}

fn default_variables() -> Vec<Variable> {
    Variable::ALL.to_vec()
}

fn default_max_phenology() -> u32 {
    SummaryRules::DEFAULT_MAX_PHENOLOGY
}

impl SummaryRules {
    pub const DEFAULT_MAX_PHENOLOGY: u32 = 2;

    pub fn new() -> SummaryRules {
        SummaryRules {
            variables: default_variables(),
            max_phenology: SummaryRules::DEFAULT_MAX_PHENOLOGY,
        }
    }

    /// Reads the rules from a JSON document such as `{"maxPhenology": 3}`.
    /// Missing fields take their default values.
    pub fn from_json_str(s: &str) -> Result<SummaryRules, RulesError> {
        let rules: SummaryRules = serde_json::from_str(s).map_err(RulesError::Parsing)?;
        rules.validated()
    }

    pub fn with_max_phenology(self, max_phenology: u32) -> Result<SummaryRules, RulesError> {
        SummaryRules {
            max_phenology,
            ..self
        }
        .validated()
    }

    fn validated(self) -> Result<SummaryRules, RulesError> {
        if self.variables.is_empty() {
            return Err(RulesError::EmptyVariables);
        }
        if self.max_phenology == 0 {
            return Err(RulesError::InvalidCeiling(self.max_phenology));
        }
        Ok(self)
    }
}

impl Default for SummaryRules {
    fn default() -> Self {
        SummaryRules::new()
    }
}
