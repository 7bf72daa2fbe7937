use super::domain::{CategoryDetail, WorkCategory};
use super::round2;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A day-over-day numeric change. Whole-number changes stay integer-typed;
/// fractional ones are rounded to 2 decimals. Serializes as a bare number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    Whole(i64),
    Fraction(f64),
}

impl Change {
    pub fn from_f64(change: f64) -> Option<Self> {
        if !change.is_finite() {
            return None;
        }
        if change.fract() == 0.0 && change.abs() < i64::MAX as f64 {
            Some(Self::Whole(change as i64))
        } else {
            Some(Self::Fraction(round2(change)))
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Change::Whole(value) => *value == 0,
            Change::Fraction(value) => *value == 0.0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Change::Whole(value) => *value as f64,
            Change::Fraction(value) => *value,
        }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Change::Whole(value) => serializer.serialize_i64(*value),
            Change::Fraction(value) => serializer.serialize_f64(*value),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Whole(value) => write!(f, "{value:+}"),
            Change::Fraction(value) => write!(f, "{value:+.2}"),
        }
    }
}

/// `current - previous`. `None` when either side is missing or unusable:
/// "unknown" must stay distinguishable from "no change".
pub fn value_delta(current: Option<f64>, previous: Option<f64>) -> Option<Change> {
    let current = current.filter(|v| v.is_finite())?;
    let previous = previous.filter(|v| v.is_finite())?;
    Change::from_f64(current - previous)
}

/// `previous - current`: a positive result means the rank number dropped,
/// i.e. the entity improved.
pub fn rank_delta(current: Option<u32>, previous: Option<u32>) -> Option<i64> {
    Some(previous? as i64 - current? as i64)
}

/// Per-category day-over-day movement for the old works breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChange {
    pub completed_change: i64,
    pub marks_change: f64,
}

/// Sparse diff across the fixed category set: a category appears in the
/// output only when its completed count or marks actually moved, keeping
/// the payload proportional to the change volume.
pub fn category_deltas(
    current: &BTreeMap<WorkCategory, CategoryDetail>,
    previous: &BTreeMap<WorkCategory, CategoryDetail>,
) -> BTreeMap<WorkCategory, CategoryChange> {
    let mut changes = BTreeMap::new();
    let fallback = CategoryDetail::default();
    for category in WorkCategory::ordered() {
        let now = current.get(&category).unwrap_or(&fallback);
        let before = previous.get(&category).unwrap_or(&fallback);
        let completed_change = now.completed - before.completed;
        let marks_change = round2(now.marks - before.marks);
        if completed_change != 0 || marks_change != 0.0 {
            changes.insert(
                category,
                CategoryChange {
                    completed_change,
                    marks_change,
                },
            );
        }
    }
    changes
}
