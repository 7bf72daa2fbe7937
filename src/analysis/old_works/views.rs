//! Serializable result shapes for the old works (NRM) analysis. As with
//! the per-component views, every key is present on every run.

use crate::analysis::delta::{CategoryChange, Change};
use crate::analysis::domain::{CategoryDetail, FinancialProgress, OldWorksRecord, WorkCategory};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct OldWorksAnalysis {
    pub component: &'static str,
    pub max_marks: f64,
    pub selected_district: String,
    pub report_date: NaiveDate,
    pub previous_report_date: NaiveDate,
    pub explanation: String,
    pub selected_district_comparison: OldWorksComparison,
    pub state_level_summary_today: OldWorksStateSummary,
    pub block_level_comparison: Vec<OldWorksBlockComparison>,
    pub state_category_leaders_today: BTreeMap<WorkCategory, CategoryLeader>,
    pub state_context: OldWorksStateContext,
    pub current_analysis_error: Option<String>,
    pub previous_analysis_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OldWorksComparison {
    pub current_data: Option<OldWorksRecord>,
    pub previous_data: Option<OldWorksRecord>,
    pub change: Option<OldWorksChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OldWorksChange {
    pub score_change: Change,
    pub count_change: Change,
    pub total_work_completed_change: Change,
    pub payment_marks_change: Change,
    pub individual_work_type_changes: BTreeMap<WorkCategory, CategoryChange>,
}

/// State-level performer entry: the full record minus the per-category
/// breakdown, which would dwarf the rest of the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OldWorksSummaryRecord {
    pub name: String,
    pub overall_score: f64,
    pub relevant_work_count: i64,
    pub total_work_completed: i64,
    pub target_achievement_marks: f64,
    pub payment_marks: f64,
    pub financial_progress: FinancialProgress,
}

impl OldWorksSummaryRecord {
    pub fn from_record(record: &OldWorksRecord) -> Self {
        Self {
            name: record.name.clone(),
            overall_score: record.overall_score,
            relevant_work_count: record.relevant_work_count,
            total_work_completed: record.total_work_completed,
            target_achievement_marks: record.target_achievement_marks,
            payment_marks: record.payment_marks,
            financial_progress: record.financial_progress.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OldWorksStateSummary {
    pub by_score: OldWorksPerformerPair,
    pub by_count: OldWorksPerformerPair,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OldWorksPerformerPair {
    pub top_performer: Option<OldWorksSummaryRecord>,
    pub bottom_performer: Option<OldWorksSummaryRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLeader {
    pub name: Option<String>,
    pub category_details: Option<CategoryDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OldWorksBlockComparison {
    pub name: String,
    pub completed_works_by_type_till_today: BTreeMap<WorkCategory, i64>,
    pub completed_works_change_by_type: BTreeMap<WorkCategory, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OldWorksStateContext {
    pub financial_stats: FinancialStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialStats {
    pub median_reduction: f64,
    pub mean_reduction: f64,
    pub count_districts_calculated: usize,
}
