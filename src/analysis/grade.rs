use serde::Serialize;

/// Average/median marks over the state distribution, the context a district
/// is graded against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarksStats {
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub count: usize,
}

/// Five ordinal performance bands. The serialized identifiers and the
/// display classes are fixed; downstream renderers match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Average,
    Poor,
    VeryPoor,
}

impl Grade {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Excellent => "grade-badge excellent",
            Self::Good => "grade-badge good",
            Self::Average => "grade-badge average",
            Self::Poor => "grade-badge poor",
            Self::VeryPoor => "grade-badge very-poor",
        }
    }
}

/// Display class for an optionally-gradable value; ungradable values get
/// the bare badge class.
pub fn css_class_or_plain(grade: Option<Grade>) -> &'static str {
    match grade {
        Some(grade) => grade.css_class(),
        None => "grade-badge",
    }
}

/// Classifies `value` into a band.
///
/// Relative mode applies when the state distribution provides a non-zero
/// average and median: at least 25% above average is excellent, above
/// average good, above median average, at least 70% of the median poor,
/// anything below very poor. Otherwise the band comes from the percentage
/// of `max_value` (90/70/50/30 cut-offs). `None` when the inputs cannot be
/// graded at all (non-finite value, or a zero/non-finite ceiling).
pub fn grade(value: f64, max_value: f64, state_stats: Option<&MarksStats>) -> Option<Grade> {
    if !value.is_finite() || !max_value.is_finite() || max_value == 0.0 {
        return None;
    }

    if let Some(stats) = state_stats {
        if let (Some(average), Some(median)) = (stats.average, stats.median) {
            if average != 0.0 && median != 0.0 {
                return Some(if value >= average * 1.25 {
                    Grade::Excellent
                } else if value >= average {
                    Grade::Good
                } else if value >= median {
                    Grade::Average
                } else if value >= median * 0.7 {
                    Grade::Poor
                } else {
                    Grade::VeryPoor
                });
            }
        }
    }

    let percentage = value / max_value * 100.0;
    Some(if percentage >= 90.0 {
        Grade::Excellent
    } else if percentage >= 70.0 {
        Grade::Good
    } else if percentage >= 50.0 {
        Grade::Average
    } else if percentage >= 30.0 {
        Grade::Poor
    } else {
        Grade::VeryPoor
    })
}
