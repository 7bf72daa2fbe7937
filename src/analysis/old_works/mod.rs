mod narrative;
pub mod views;

use super::access::{convert_i64, safe_get};
use super::delta::{category_deltas, value_delta, Change};
use super::domain::{Component, OldWorksRecord, WorkCategory};
use super::extrema::find_extrema;
use super::normalize::{normalize_entity_name, normalize_old_works};
use super::stats::summarize;
use super::AnalysisError;
use crate::source::ReportSource;
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};
use views::{
    CategoryLeader, FinancialStats, OldWorksAnalysis, OldWorksBlockComparison, OldWorksChange,
    OldWorksComparison, OldWorksPerformerPair, OldWorksStateContext, OldWorksStateSummary,
    OldWorksSummaryRecord,
};

const BLOCKS_ENDPOINT: &str = "/report_jsm/blocks";

/// Aggregator for the old works (NRM) component. Unlike the standard
/// components it needs the district's block list up front; that list is the
/// one prerequisite whose absence fails the whole analysis.
pub struct OldWorksAnalyzer<'a> {
    source: &'a dyn ReportSource,
}

struct OldWorksSnapshot {
    state_records: Vec<OldWorksRecord>,
    district_record: Option<OldWorksRecord>,
    block_counts: BTreeMap<String, BTreeMap<WorkCategory, i64>>,
    fetch_error: Option<String>,
}

impl<'a> OldWorksAnalyzer<'a> {
    pub fn new(source: &'a dyn ReportSource) -> Self {
        Self { source }
    }

    pub fn analyze(
        &self,
        district: &str,
        report_date: NaiveDate,
    ) -> Result<OldWorksAnalysis, AnalysisError> {
        let district = district.trim();
        let district_upper = district.to_uppercase();
        let previous_date = report_date - Duration::days(1);
        let component = Component::OldWorks;

        info!(district, %report_date, "running old works analysis");

        let block_list = self.fetch_block_list(district);
        if block_list.is_empty() {
            warn!(district, "block list unavailable, aborting old works analysis");
            return Err(AnalysisError::BlockListUnavailable(district.to_string()));
        }

        let current = self.snapshot(district, &district_upper, report_date, &block_list);
        let previous = self.snapshot(district, &district_upper, previous_date, &block_list);

        let change = match (&current.district_record, &previous.district_record) {
            (Some(now), Some(before)) => Some(OldWorksChange {
                score_change: value_delta(Some(now.overall_score), Some(before.overall_score))
                    .unwrap_or(Change::Whole(0)),
                count_change: Change::Whole(now.relevant_work_count - before.relevant_work_count),
                total_work_completed_change: Change::Whole(
                    now.total_work_completed - before.total_work_completed,
                ),
                payment_marks_change: value_delta(
                    Some(now.payment_marks),
                    Some(before.payment_marks),
                )
                .unwrap_or(Change::Whole(0)),
                individual_work_type_changes: category_deltas(&now.work_types, &before.work_types),
            }),
            _ => None,
        };

        let state_summary = state_summary(&current.state_records);
        let category_leaders = category_leaders(&current.state_records);
        let financial_stats = financial_stats(&current.state_records);
        let blocks = block_comparison(&block_list, &current, &previous);

        let mut analysis = OldWorksAnalysis {
            component: component.label(),
            max_marks: component.max_marks(),
            selected_district: district.to_string(),
            report_date,
            previous_report_date: previous_date,
            explanation: String::new(),
            selected_district_comparison: OldWorksComparison {
                current_data: current.district_record.clone(),
                previous_data: previous.district_record.clone(),
                change,
            },
            state_level_summary_today: state_summary,
            block_level_comparison: blocks,
            state_category_leaders_today: category_leaders,
            state_context: OldWorksStateContext { financial_stats },
            current_analysis_error: current.fetch_error,
            previous_analysis_error: previous.fetch_error,
        };

        analysis.explanation = narrative::compose(&analysis);
        Ok(analysis)
    }

    fn fetch_block_list(&self, district: &str) -> Vec<String> {
        let params = [("district", district.to_string())];
        match self
            .source
            .fetch(BLOCKS_ENDPOINT, &params)
            .as_ref()
            .and_then(|payload| safe_get(payload, &["blocks"]))
            .and_then(|blocks| blocks.as_array())
        {
            Some(blocks) => blocks
                .iter()
                .filter_map(|entry| entry.as_str())
                .filter_map(|name| {
                    let trimmed = name.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                })
                .collect(),
            None => Vec::new(),
        }
    }

    fn snapshot(
        &self,
        district: &str,
        district_upper: &str,
        date: NaiveDate,
        block_list: &[String],
    ) -> OldWorksSnapshot {
        let mut fetch_errors: Vec<String> = Vec::new();
        let date_param = date.format("%Y-%m-%d").to_string();
        let endpoint = Component::OldWorks.endpoint();

        let state_params = [("date", date_param.clone())];
        let state_records = match self
            .source
            .fetch(endpoint, &state_params)
            .as_ref()
            .and_then(|payload| safe_get(payload, &["results"]))
            .and_then(|results| results.as_array())
        {
            Some(results) if !results.is_empty() => results
                .iter()
                .filter_map(normalize_old_works)
                .collect::<Vec<_>>(),
            _ => {
                let message = format!(
                    "Could not fetch state-level Old Works (NRM) performance data for {date}."
                );
                warn!("{message}");
                fetch_errors.push(message);
                Vec::new()
            }
        };

        let district_record = state_records
            .iter()
            .find(|record| record.name == district_upper)
            .cloned();

        let block_params = [
            ("district", district.to_string()),
            ("date", date_param.clone()),
        ];
        let block_counts = match self
            .source
            .fetch(endpoint, &block_params)
            .as_ref()
            .and_then(|payload| safe_get(payload, &["results"]))
            .and_then(|results| results.as_array())
            .filter(|results| !results.is_empty())
        {
            Some(results) => block_category_counts(results, block_list),
            None => {
                let message = format!(
                    "Could not fetch block-level performance data for {district} on {date}."
                );
                warn!("{message}");
                fetch_errors.push(message);
                BTreeMap::new()
            }
        };

        OldWorksSnapshot {
            state_records,
            district_record,
            block_counts,
            fetch_error: (!fetch_errors.is_empty()).then(|| fetch_errors.join("; ")),
        }
    }
}

/// Completed counts per category for every block the district lists. A
/// block absent from the payload still appears, with all-zero counts.
fn block_category_counts(
    results: &[Value],
    block_list: &[String],
) -> BTreeMap<String, BTreeMap<WorkCategory, i64>> {
    let by_name: BTreeMap<String, &Value> = results
        .iter()
        .filter_map(|raw| {
            let name = safe_get(raw, &["name"])?.as_str()?;
            Some((normalize_entity_name(name)?, raw))
        })
        .collect();

    block_list
        .iter()
        .map(|block_name| {
            let raw = normalize_entity_name(block_name)
                .and_then(|normalized| by_name.get(&normalized).copied());
            let counts = WorkCategory::ordered()
                .into_iter()
                .map(|category| {
                    let completed = raw
                        .map(|raw| {
                            convert_i64(
                                safe_get(raw, &["categories", category.label(), "completed"]),
                                0,
                            )
                        })
                        .unwrap_or(0);
                    (category, completed)
                })
                .collect();
            (block_name.clone(), counts)
        })
        .collect()
}

fn state_summary(state_records: &[OldWorksRecord]) -> OldWorksStateSummary {
    let by_score = find_extrema(
        state_records,
        |record| record.name.as_str(),
        |record| Some(record.overall_score),
        true,
    );
    let by_count = find_extrema(
        state_records,
        |record| record.name.as_str(),
        |record| Some(record.total_work_completed as f64),
        true,
    );

    OldWorksStateSummary {
        by_score: OldWorksPerformerPair {
            top_performer: by_score.top.map(OldWorksSummaryRecord::from_record),
            bottom_performer: by_score.bottom.map(OldWorksSummaryRecord::from_record),
        },
        by_count: OldWorksPerformerPair {
            top_performer: by_count.top.map(OldWorksSummaryRecord::from_record),
            bottom_performer: by_count.bottom.map(OldWorksSummaryRecord::from_record),
        },
    }
}

/// Per-category leader by marks; ties resolve lexicographically by name.
fn category_leaders(state_records: &[OldWorksRecord]) -> BTreeMap<WorkCategory, CategoryLeader> {
    WorkCategory::ordered()
        .into_iter()
        .map(|category| {
            let mut leader: Option<&OldWorksRecord> = None;
            let mut best_marks = -1.0f64;
            for record in state_records {
                let Some(detail) = record.work_types.get(&category) else {
                    continue;
                };
                let better = detail.marks > best_marks
                    || (detail.marks == best_marks
                        && leader.is_some_and(|current| record.name < current.name));
                if better {
                    best_marks = detail.marks;
                    leader = Some(record);
                }
            }
            let leader_view = match leader {
                Some(record) => CategoryLeader {
                    name: Some(record.name.clone()),
                    category_details: record.work_types.get(&category).cloned(),
                },
                None => CategoryLeader {
                    name: None,
                    category_details: None,
                },
            };
            (category, leader_view)
        })
        .collect()
}

fn financial_stats(state_records: &[OldWorksRecord]) -> FinancialStats {
    let reductions: Vec<f64> = state_records
        .iter()
        .map(|record| record.financial_progress.reduction_percentage)
        .collect();
    let summary = summarize(&reductions);

    FinancialStats {
        median_reduction: summary.median.unwrap_or(0.0),
        mean_reduction: summary.mean.unwrap_or(0.0),
        count_districts_calculated: summary.count,
    }
}

fn block_comparison(
    block_list: &[String],
    current: &OldWorksSnapshot,
    previous: &OldWorksSnapshot,
) -> Vec<OldWorksBlockComparison> {
    let mut blocks: Vec<OldWorksBlockComparison> = block_list
        .iter()
        .map(|block_name| {
            let today = current
                .block_counts
                .get(block_name)
                .cloned()
                .unwrap_or_default();
            let yesterday = previous
                .block_counts
                .get(block_name)
                .cloned()
                .unwrap_or_default();

            let completed_works_change_by_type = WorkCategory::ordered()
                .into_iter()
                .filter_map(|category| {
                    let change = today.get(&category).copied().unwrap_or(0)
                        - yesterday.get(&category).copied().unwrap_or(0);
                    (change != 0).then_some((category, change))
                })
                .collect();

            OldWorksBlockComparison {
                name: block_name.clone(),
                completed_works_by_type_till_today: today,
                completed_works_change_by_type,
            }
        })
        .collect();

    blocks.sort_by(|a, b| a.name.cmp(&b.name));
    blocks
}
