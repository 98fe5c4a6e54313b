use std::{collections::BTreeSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{Dataset, StudentRecord, View},
    grade::Grade,
};

/// Inclusive bounds on a student's average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageRange {
    pub min: f64,
    pub max: f64,
}

impl AverageRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// An undefined (`NaN`) average is never inside a range.
    pub fn contains(&self, average: f64) -> bool {
        if average.is_nan() {
            return false;
        }
        self.min <= average && average <= self.max
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

/// The three filter controls, combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    /// Case-insensitive name substring; empty matches everyone.
    pub search: String,
    /// `None` disables the range check, so undefined averages pass.
    pub average_range: Option<AverageRange>,
    /// Accepted grades; empty accepts every grade.
    pub grades: BTreeSet<Grade>,
}

impl FilterSet {
    /// The controls' initial state: the observed average bounds and every grade present.
    pub fn defaults_for(dataset: &Dataset) -> Self {
        let facets = Facets::from_dataset(dataset);
        Self {
            search: String::new(),
            average_range: facets.average_range,
            grades: facets.grades.into_iter().collect(),
        }
    }

    pub fn matches(&self, record: &StudentRecord) -> bool {
        if !self.search.is_empty() && !name_matches(&record.name, &self.search) {
            return false;
        }
        if let Some(range) = &self.average_range
            && !range.contains(record.average)
        {
            return false;
        }
        self.grades.is_empty() || self.grades.contains(&record.grade)
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        if let Some(range) = &self.average_range
            && range.is_inverted()
        {
            warn!(
                "Average range {}..={} is inverted; no rows can match",
                range.min, range.max
            );
        }
        let indices = dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        debug!(
            "Filter search={:?} range={:?} grades=[{}] kept {} of {} row(s)",
            self.search,
            self.average_range,
            self.grades.iter().join(", "),
            indices.len(),
            dataset.len()
        );
        dataset.view_of(indices)
    }
}

pub fn name_matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(&needle.to_lowercase())
}

/// Filter settings as written in a YAML preset or given on the command line.
/// Absent fields fall back to the dataset defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterPreset {
    pub search: Option<String>,
    pub min_average: Option<f64>,
    pub max_average: Option<f64>,
    pub grades: Vec<Grade>,
}

impl FilterPreset {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening filter preset {path:?}"))?;
        let preset = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing filter preset {path:?}"))?;
        Ok(preset)
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: FilterPreset) -> FilterPreset {
        FilterPreset {
            search: overrides.search.or(self.search),
            min_average: overrides.min_average.or(self.min_average),
            max_average: overrides.max_average.or(self.max_average),
            grades: if overrides.grades.is_empty() {
                self.grades
            } else {
                overrides.grades
            },
        }
    }

    pub fn resolve(&self, dataset: &Dataset) -> FilterSet {
        let defaults = FilterSet::defaults_for(dataset);
        let average_range = match (self.min_average, self.max_average, defaults.average_range) {
            (None, None, observed) => observed,
            (min, max, observed) => Some(AverageRange::new(
                min.or(observed.map(|r| r.min)).unwrap_or(f64::NEG_INFINITY),
                max.or(observed.map(|r| r.max)).unwrap_or(f64::INFINITY),
            )),
        };
        FilterSet {
            search: self.search.clone().unwrap_or_default(),
            average_range,
            grades: if self.grades.is_empty() {
                defaults.grades
            } else {
                self.grades.iter().copied().collect()
            },
        }
    }
}

/// Bounds and choices for the filter controls, derived from a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facets {
    /// Observed min/max over finite averages; `None` when no average is defined.
    pub average_range: Option<AverageRange>,
    /// Distinct grades in first-appearance order.
    pub grades: Vec<Grade>,
    /// Distinct student names in first-appearance order.
    pub students: Vec<String>,
}

impl Facets {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let records = dataset.records();
        let average_range = records
            .iter()
            .map(|record| record.average)
            .filter(|average| average.is_finite())
            .minmax_by(f64::total_cmp)
            .into_option()
            .map(|(min, max)| AverageRange::new(min, max));
        Self {
            average_range,
            grades: records.iter().map(|record| record.grade).unique().collect(),
            students: records
                .iter()
                .map(|record| record.name.clone())
                .unique()
                .collect(),
        }
    }
}
