use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest average (inclusive) that earns an "A".
pub const GRADE_A_MIN: f64 = 15.0;
/// Lowest average (inclusive) that earns a "B".
pub const GRADE_B_MIN: f64 = 12.0;
/// Lowest average (inclusive) that earns a "C". Anything below fails.
pub const GRADE_C_MIN: f64 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Grade {
    A,
    B,
    C,
    Fail,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::A, Grade::B, Grade::C, Grade::Fail];

    /// Buckets an average. A `NaN` average fails every threshold and lands in `Fail`.
    pub fn from_average(average: f64) -> Self {
        if average >= GRADE_A_MIN {
            Grade::A
        } else if average >= GRADE_B_MIN {
            Grade::B
        } else if average >= GRADE_C_MIN {
            Grade::C
        } else {
            Grade::Fail
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::Fail => "Fail",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown grade '{0}' (expected A, B, C, or Fail)")]
pub struct ParseGradeError(String);

impl FromStr for Grade {
    type Err = ParseGradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Grade::ALL
            .into_iter()
            .find(|grade| grade.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseGradeError(trimmed.to_string()))
    }
}

impl TryFrom<String> for Grade {
    type Error = ParseGradeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
