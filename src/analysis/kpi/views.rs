//! Serializable result shapes for the cross-component district KPI
//! analysis. Stable keys throughout, as with the component views.

use crate::analysis::delta::Change;
use crate::analysis::grade::{Grade, MarksStats};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct KpiAnalysis {
    pub district_name: String,
    pub report_date: NaiveDate,
    pub previous_report_date: NaiveDate,
    pub kpis: KpiSet,
    pub state_context: StateContext,
    pub fetch_errors: FetchErrors,
    pub notes: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiSet {
    pub rank: RankKpi,
    pub total_marks: MarksKpi,
    pub farm_ponds_completed: CountKpi,
    pub dugwell_recharge_completed: CountKpi,
    pub amrit_sarovar_completed: CountKpi,
    pub old_work_completed: CountKpi,
    pub mybharat_completed: CountKpi,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankKpi {
    pub current: Option<u32>,
    pub previous: Option<u32>,
    pub change: Option<i64>,
    pub total_districts_ranked_today: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarksKpi {
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub change: Option<Change>,
    /// Band relative to the state total-marks distribution; display class
    /// included for the renderer.
    pub grade: Option<Grade>,
    pub grade_class: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountKpi {
    pub current: Option<i64>,
    pub previous: Option<i64>,
    pub change: Option<Change>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateContext {
    pub report_date: NaiveDate,
    pub total_marks_stats: TotalMarksStats,
    pub component_stats: ComponentStatsSet,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TotalMarksStats {
    pub top_performer: Option<PerformerSummary>,
    pub bottom_performer: Option<PerformerSummary>,
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub count_valid_districts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformerSummary {
    pub name: String,
    pub score: f64,
}

/// Per-component marks distributions for the current date; these feed the
/// relative grading downstream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentStatsSet {
    pub performance_target: MarksStats,
    pub performance_payment: MarksStats,
    pub farm_ponds: MarksStats,
    pub dugwell: MarksStats,
    pub amrit_sarovar: MarksStats,
    pub mybharat: MarksStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchErrors {
    pub current: Option<String>,
    pub previous: Option<String>,
}
