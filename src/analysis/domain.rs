use super::access::{is_unbounded, try_f64, try_i64};
use super::round2;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// The five tracked program categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    FarmPonds,
    DugwellRecharge,
    AmritSarovar,
    OldWorks,
    MyBharat,
}

impl Component {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::FarmPonds,
            Self::DugwellRecharge,
            Self::AmritSarovar,
            Self::OldWorks,
            Self::MyBharat,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FarmPonds => "Farm Ponds",
            Self::DugwellRecharge => "Dugwell Recharge",
            Self::AmritSarovar => "Amrit Sarovar",
            Self::OldWorks => "Old Works (NRM)",
            Self::MyBharat => "MyBharat (Jaldoot)",
        }
    }

    /// Stable identifier used in CLI arguments and request payloads.
    pub const fn key(self) -> &'static str {
        match self {
            Self::FarmPonds => "farm_ponds",
            Self::DugwellRecharge => "dugwell",
            Self::AmritSarovar => "amrit_sarovar",
            Self::OldWorks => "old_works",
            Self::MyBharat => "mybharat",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|component| component.key() == raw.trim())
    }

    /// Component-specific score ceiling.
    pub const fn max_marks(self) -> f64 {
        match self {
            Self::FarmPonds => 30.0,
            Self::DugwellRecharge => 20.0,
            Self::AmritSarovar => 20.0,
            Self::OldWorks => 20.0,
            Self::MyBharat => 10.0,
        }
    }

    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::FarmPonds => "/report_jsm/farm-ponds-marks",
            Self::DugwellRecharge => "/report_jsm/dugwell-marks",
            Self::AmritSarovar => "/report_jsm/amritsarovar-stats",
            Self::OldWorks => "/report_jsm/performance-marks",
            Self::MyBharat => "/report_jsm/mybharat/gender-stats",
        }
    }

    /// Which raw keys correspond to the canonical record fields. The old
    /// works component derives its score from two marks fields and has no
    /// flat field map; it is handled by its own analyzer.
    pub const fn field_map(self) -> Option<FieldMap> {
        match self {
            Self::FarmPonds => Some(FieldMap {
                results_key: "results",
                name_key: "name",
                score_key: "marks",
                count_key: "actual_count",
                target_key: "target",
                achievement_key: "achievement_percentage",
                uses_date: true,
                has_blocks: true,
            }),
            Self::DugwellRecharge => Some(FieldMap {
                results_key: "results",
                name_key: "name",
                score_key: "marks",
                count_key: "actual_count",
                target_key: "target",
                achievement_key: "achievement_percentage",
                uses_date: true,
                has_blocks: true,
            }),
            Self::AmritSarovar => Some(FieldMap {
                results_key: "details",
                name_key: "name",
                score_key: "marks",
                count_key: "actual_count",
                target_key: "target",
                achievement_key: "achievement_percentage",
                // the amrit sarovar endpoint ignores the date parameter
                uses_date: false,
                has_blocks: false,
            }),
            Self::OldWorks => None,
            Self::MyBharat => Some(FieldMap {
                results_key: "districts_data",
                name_key: "district",
                score_key: "marks",
                count_key: "total_count",
                target_key: "target",
                achievement_key: "achievement_percent",
                uses_date: true,
                has_blocks: false,
            }),
        }
    }
}

/// Per-component upstream schema, passed to the generic analyzer instead of
/// duplicating the aggregation logic per component.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub results_key: &'static str,
    pub name_key: &'static str,
    pub score_key: &'static str,
    pub count_key: &'static str,
    pub target_key: &'static str,
    pub achievement_key: &'static str,
    pub uses_date: bool,
    pub has_blocks: bool,
}

/// A target count, kept distinct from zero when upstream did not report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Count(i64),
    NotAvailable,
}

impl Target {
    pub fn from_raw(value: Option<&Value>) -> Self {
        match try_i64(value) {
            Some(count) => Self::Count(count),
            None => Self::NotAvailable,
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Target::Count(count) => serializer.serialize_i64(*count),
            Target::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Count achieved over target, as a percentage. Upstream encodes a
/// near-zero target as an unbounded ratio ("inf"), which stays a distinct
/// marker rather than collapsing into "not available".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Achievement {
    Percent(f64),
    Unbounded,
    NotAvailable,
}

impl Achievement {
    pub fn from_raw(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::NotAvailable;
        };
        if is_unbounded(value) {
            return Self::Unbounded;
        }
        match try_f64(Some(value)) {
            Some(percent) => Self::Percent(round2(percent)),
            None => Self::NotAvailable,
        }
    }
}

impl Serialize for Achievement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Achievement::Percent(percent) => serializer.serialize_f64(*percent),
            Achievement::Unbounded => serializer.serialize_str("Inf"),
            Achievement::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Canonical snapshot of one entity's performance in one component on one
/// date. Identity is the trimmed, upper-cased name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRecord {
    pub name: String,
    pub count: i64,
    pub score: f64,
    pub target: Target,
    pub achievement_percentage: Achievement,
}

/// The fixed NRM work categories tracked by the old works component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkCategory {
    TalabNirman,
    CheckStopDam,
    RechargePit,
    KoopNirman,
    PercolationTalab,
    KhetTalab,
    OtherNrmWork,
}

impl WorkCategory {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::TalabNirman,
            Self::CheckStopDam,
            Self::RechargePit,
            Self::KoopNirman,
            Self::PercolationTalab,
            Self::KhetTalab,
            Self::OtherNrmWork,
        ]
    }

    /// Upstream key and display label; the API uses these exact strings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TalabNirman => "Talab Nirman",
            Self::CheckStopDam => "Check_Stop Dam",
            Self::RechargePit => "Recharge Pit",
            Self::KoopNirman => "Koop Nirman",
            Self::PercolationTalab => "Percolation Talab",
            Self::KhetTalab => "Khet Talab",
            Self::OtherNrmWork => "Other NRM Work",
        }
    }
}

impl Serialize for WorkCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Per-category detail inside an old works record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetail {
    pub target: Target,
    pub completed: i64,
    pub achievement_percentage: Achievement,
    pub marks: f64,
}

impl Default for CategoryDetail {
    fn default() -> Self {
        Self {
            target: Target::NotAvailable,
            completed: 0,
            achievement_percentage: Achievement::NotAvailable,
            marks: 0.0,
        }
    }
}

/// Payment-side progress for the old works component, amounts in lakhs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialProgress {
    pub baseline_pending_lakhs: f64,
    pub current_pending_lakhs: f64,
    pub reduction_percentage: f64,
    pub marks: f64,
}

/// Snapshot of one entity in the old works (NRM) component.
///
/// `relevant_work_count` counts works inside the scoring period;
/// `total_work_completed` sums completions across the tracked categories.
/// The two overlap but are not the same number and both feed the narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OldWorksRecord {
    pub name: String,
    pub overall_score: f64,
    pub relevant_work_count: i64,
    pub total_work_completed: i64,
    pub target_achievement_marks: f64,
    pub payment_marks: f64,
    pub financial_progress: FinancialProgress,
    pub work_types: BTreeMap<WorkCategory, CategoryDetail>,
}
