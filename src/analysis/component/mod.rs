mod narrative;
pub mod views;

use super::access::safe_get;
use super::delta::value_delta;
use super::domain::{Component, ComponentRecord, FieldMap};
use super::extrema::find_extrema;
use super::normalize::normalize_record;
use super::stats::{summarize, StatsSummary};
use crate::source::ReportSource;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use tracing::{info, warn};
use views::{
    BlockComparison, ComponentAnalysis, DistrictChange, DistrictComparison, PanchayatCount,
    PerformerPair, PositionVsState, StateStatistics, StateSummary,
};

/// Two-phase aggregator for one of the standard program components:
/// fetch state/block/panchayat records for the report date and the day
/// before, then compute extrema, statistics and day-over-day deltas for
/// the selected district. Never fails past its boundary; missing upstream
/// data degrades to nulls plus a fetch-error string.
pub struct ComponentAnalyzer<'a> {
    source: &'a dyn ReportSource,
    component: Component,
    fields: FieldMap,
}

struct DateSnapshot {
    state_records: Vec<ComponentRecord>,
    district_record: Option<ComponentRecord>,
    blocks: Vec<BlockSnapshot>,
    fetch_error: Option<String>,
}

struct BlockSnapshot {
    name: String,
    count: i64,
    top_panchayats: Vec<PanchayatCount>,
}

impl<'a> ComponentAnalyzer<'a> {
    /// `None` for the old works component, which has its own analyzer.
    pub fn new(source: &'a dyn ReportSource, component: Component) -> Option<Self> {
        let fields = component.field_map()?;
        Some(Self {
            source,
            component,
            fields,
        })
    }

    pub fn analyze(&self, district: &str, report_date: NaiveDate) -> ComponentAnalysis {
        let district = district.trim();
        let district_upper = district.to_uppercase();
        let previous_date = report_date - Duration::days(1);

        info!(
            component = self.component.label(),
            district, %report_date, "running component analysis"
        );

        let current = self.snapshot(district, &district_upper, report_date);
        // An endpoint that ignores the date parameter has no usable history;
        // refetching it would fabricate a zero delta out of identical data.
        let previous = self
            .fields
            .uses_date
            .then(|| self.snapshot(district, &district_upper, previous_date));

        let change = match (&current.district_record, previous.as_ref()) {
            (Some(now), Some(prior)) => prior.district_record.as_ref().and_then(|before| {
                Some(DistrictChange {
                    score_change: value_delta(Some(now.score), Some(before.score))?,
                    count_change: value_delta(Some(now.count as f64), Some(before.count as f64))?,
                })
            }),
            _ => None,
        };

        let state_summary = state_summary(&current.state_records);
        let statistics = state_statistics(&current.state_records);
        let position = district_position(current.district_record.as_ref(), &statistics);
        let blocks = block_comparison(&current, previous.as_ref());

        let mut analysis = ComponentAnalysis {
            component: self.component.label(),
            max_marks: self.component.max_marks(),
            selected_district: district.to_string(),
            report_date,
            previous_report_date: previous_date,
            explanation: String::new(),
            selected_district_comparison: DistrictComparison {
                current_data: current.district_record.clone(),
                previous_data: previous
                    .as_ref()
                    .and_then(|snapshot| snapshot.district_record.clone()),
                change,
            },
            state_level_summary_today: state_summary,
            block_level_comparison: blocks,
            state_statistics_today: statistics,
            selected_district_position_vs_state: position,
            current_analysis_error: current.fetch_error,
            previous_analysis_error: previous.and_then(|snapshot| snapshot.fetch_error),
        };

        analysis.explanation = narrative::compose(&analysis, self.fields.has_blocks);
        analysis
    }

    fn snapshot(&self, district: &str, district_upper: &str, date: NaiveDate) -> DateSnapshot {
        let mut fetch_errors: Vec<String> = Vec::new();
        let date_param = date.format("%Y-%m-%d").to_string();
        let endpoint = self.component.endpoint();

        let mut state_params: Vec<(&str, String)> = Vec::new();
        if self.fields.uses_date {
            state_params.push(("date", date_param.clone()));
        }

        let state_records = match self
            .source
            .fetch(endpoint, &state_params)
            .as_ref()
            .and_then(|payload| safe_get(payload, &[self.fields.results_key]))
            .and_then(|results| results.as_array())
        {
            Some(results) if !results.is_empty() => results
                .iter()
                .filter_map(|raw| normalize_record(raw, &self.fields))
                .collect(),
            _ => {
                let message = format!(
                    "Could not fetch or parse state-level {} data for {} from {}.",
                    self.component.label(),
                    date,
                    endpoint
                );
                warn!("{message}");
                fetch_errors.push(message);
                Vec::new()
            }
        };

        // The district's record comes from the state-wide list only; a
        // separate per-district response would be a second source of truth.
        let district_record = state_records
            .iter()
            .find(|record| record.name == district_upper)
            .cloned();
        if district_record.is_none() && !state_records.is_empty() {
            warn!(
                district = district_upper,
                component = self.component.label(),
                %date,
                "selected district absent from state results"
            );
        }

        let blocks = if self.fields.has_blocks {
            self.block_snapshots(district, &date_param)
        } else {
            Vec::new()
        };

        DateSnapshot {
            state_records,
            district_record,
            blocks,
            fetch_error: (!fetch_errors.is_empty()).then(|| fetch_errors.join("; ")),
        }
    }

    fn block_snapshots(&self, district: &str, date_param: &str) -> Vec<BlockSnapshot> {
        let endpoint = self.component.endpoint();
        let params = [
            ("district", district.to_string()),
            ("date", date_param.to_string()),
        ];

        let block_results = match self
            .source
            .fetch(endpoint, &params)
            .as_ref()
            .and_then(|payload| safe_get(payload, &[self.fields.results_key]))
            .and_then(|results| results.as_array())
            .filter(|results| !results.is_empty())
        {
            Some(results) => results.clone(),
            None => {
                warn!(
                    district,
                    component = self.component.label(),
                    "no block-level data available"
                );
                return Vec::new();
            }
        };

        let mut blocks: Vec<BlockSnapshot> = block_results
            .iter()
            .filter_map(|raw| normalize_record(raw, &self.fields))
            .map(|block| BlockSnapshot {
                top_panchayats: self.top_panchayats(district, &block.name, date_param),
                count: block.count,
                name: block.name,
            })
            .collect();

        blocks.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        blocks
    }

    fn top_panchayats(&self, district: &str, block: &str, date_param: &str) -> Vec<PanchayatCount> {
        let params = [
            ("district", district.to_string()),
            ("block", block.to_string()),
            ("date", date_param.to_string()),
        ];

        let mut panchayats: Vec<PanchayatCount> = match self
            .source
            .fetch(self.component.endpoint(), &params)
            .as_ref()
            .and_then(|payload| safe_get(payload, &[self.fields.results_key]))
            .and_then(|results| results.as_array())
        {
            Some(results) => results
                .iter()
                .filter_map(|raw| normalize_record(raw, &self.fields))
                .map(|record| PanchayatCount {
                    name: record.name,
                    count: record.count,
                })
                .collect(),
            None => {
                warn!(district, block, "no panchayat data for block");
                Vec::new()
            }
        };

        panchayats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        panchayats.truncate(5);
        panchayats
    }
}

fn state_summary(state_records: &[ComponentRecord]) -> StateSummary {
    let by_score = find_extrema(
        state_records,
        |record| record.name.as_str(),
        |record| Some(record.score),
        true,
    );
    let by_count = find_extrema(
        state_records,
        |record| record.name.as_str(),
        |record| Some(record.count as f64),
        true,
    );

    StateSummary {
        by_score: PerformerPair {
            top_performer: by_score.top.cloned(),
            bottom_performer: by_score.bottom.cloned(),
        },
        by_count: PerformerPair {
            top_performer: by_count.top.cloned(),
            bottom_performer: by_count.bottom.cloned(),
        },
    }
}

fn state_statistics(state_records: &[ComponentRecord]) -> StateStatistics {
    let scores: Vec<f64> = state_records.iter().map(|record| record.score).collect();
    let counts: Vec<f64> = state_records
        .iter()
        .map(|record| record.count as f64)
        .collect();

    let score = summarize(&scores);
    let count = summarize(&counts);

    let mut calculation_notes = Vec::new();
    if state_records.is_empty() {
        calculation_notes.push("No reporting districts found.".to_string());
    }
    if score.stdev_is_degenerate() {
        calculation_notes
            .push("Standard deviation requires at least 2 data points for score.".to_string());
    }
    if count.stdev_is_degenerate() {
        calculation_notes
            .push("Standard deviation requires at least 2 data points for count.".to_string());
    }

    StateStatistics {
        districts_reporting: state_records.len(),
        score,
        count,
        calculation_notes,
    }
}

fn district_position(
    district: Option<&ComponentRecord>,
    statistics: &StateStatistics,
) -> PositionVsState {
    let Some(district) = district else {
        return PositionVsState::default();
    };

    PositionVsState {
        score_comparison: position_label(district.score, &statistics.score),
        count_comparison: position_label(district.count as f64, &statistics.count),
    }
}

/// Compound label such as "Above Mean / Below Median"; `None` when the
/// state distribution offered nothing to compare against.
fn position_label(value: f64, summary: &StatsSummary) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(mean) = summary.mean {
        parts.push(relation(value, mean, "Mean"));
    }
    if let Some(median) = summary.median {
        parts.push(relation(value, median, "Median"));
    }
    (!parts.is_empty()).then(|| parts.join(" / "))
}

fn relation(value: f64, reference: f64, statistic: &str) -> String {
    if value > reference {
        format!("Above {statistic}")
    } else if value < reference {
        format!("Below {statistic}")
    } else {
        format!("Equal to {statistic}")
    }
}

fn block_comparison(
    current: &DateSnapshot,
    previous: Option<&DateSnapshot>,
) -> Vec<BlockComparison> {
    let previous_counts: HashMap<&str, i64> = previous
        .map(|snapshot| {
            snapshot
                .blocks
                .iter()
                .map(|block| (block.name.as_str(), block.count))
                .collect()
        })
        .unwrap_or_default();

    current
        .blocks
        .iter()
        .map(|block| BlockComparison {
            name: block.name.clone(),
            count_today: block.count,
            // A block absent yesterday is unknown, not zero.
            count_previous: previous_counts.get(block.name.as_str()).copied(),
            top_panchayats: block.top_panchayats.clone(),
        })
        .collect()
}
