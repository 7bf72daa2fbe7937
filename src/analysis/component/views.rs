//! Serializable result shapes for a per-component analysis. Every field is
//! present in every run; data that could not be obtained is `null` or an
//! empty collection so renderers can rely on key presence.

use crate::analysis::delta::Change;
use crate::analysis::domain::ComponentRecord;
use crate::analysis::stats::StatsSummary;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentAnalysis {
    pub component: &'static str,
    pub max_marks: f64,
    pub selected_district: String,
    pub report_date: NaiveDate,
    pub previous_report_date: NaiveDate,
    pub explanation: String,
    pub selected_district_comparison: DistrictComparison,
    pub state_level_summary_today: StateSummary,
    pub block_level_comparison: Vec<BlockComparison>,
    pub state_statistics_today: StateStatistics,
    pub selected_district_position_vs_state: PositionVsState,
    pub current_analysis_error: Option<String>,
    pub previous_analysis_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictComparison {
    pub current_data: Option<ComponentRecord>,
    pub previous_data: Option<ComponentRecord>,
    pub change: Option<DistrictChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictChange {
    pub score_change: Change,
    pub count_change: Change,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StateSummary {
    pub by_score: PerformerPair,
    pub by_count: PerformerPair,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformerPair {
    pub top_performer: Option<ComponentRecord>,
    pub bottom_performer: Option<ComponentRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateStatistics {
    pub districts_reporting: usize,
    pub score: StatsSummary,
    pub count: StatsSummary,
    pub calculation_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionVsState {
    pub score_comparison: Option<String>,
    pub count_comparison: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockComparison {
    pub name: String,
    pub count_today: i64,
    pub count_previous: Option<i64>,
    pub top_panchayats: Vec<PanchayatCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanchayatCount {
    pub name: String,
    pub count: i64,
}
