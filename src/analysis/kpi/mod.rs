mod narrative;
pub mod views;

use super::access::{convert_f64, convert_i64, safe_get};
use super::delta::{rank_delta, value_delta};
use super::domain::{Component, WorkCategory};
use super::extrema::find_extrema;
use super::grade::{self, MarksStats};
use super::normalize::normalize_entity_name;
use super::rank::competition_ranks;
use super::round2;
use super::stats::{summarize, StatsSummary};
use crate::source::ReportSource;
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};
use views::{
    ComponentStatsSet, CountKpi, FetchErrors, KpiAnalysis, KpiSet, MarksKpi, PerformerSummary,
    RankKpi, StateContext, TotalMarksStats,
};

/// Cross-component orchestrator: pulls every component's state snapshot for
/// the report date and the day before, computes a weighted total score per
/// district, ranks all districts for each date independently, and derives
/// the selected district's KPI deltas plus the state-wide grading context.
pub struct KpiAnalyzer<'a> {
    source: &'a dyn ReportSource,
}

/// Marks and count for one district in one standard component.
#[derive(Debug, Clone, Default)]
struct ComponentEntry {
    marks: f64,
    count: i64,
}

/// The old works component contributes two marks fields and a derived
/// completed-works count.
#[derive(Debug, Clone, Default)]
struct PerformanceEntry {
    target_marks: f64,
    payment_marks: f64,
    old_work_completed: i64,
}

/// One district's per-component sub-scores and weighted total. A `None`
/// total marks a failed computation, distinct from a valid low score of 0,
/// and keeps the district out of the ranking.
#[derive(Debug, Clone, Default)]
struct DistrictTotal {
    name: String,
    farm_ponds: Option<ComponentEntry>,
    dugwell: Option<ComponentEntry>,
    amrit_sarovar: Option<ComponentEntry>,
    mybharat: Option<ComponentEntry>,
    performance: Option<PerformanceEntry>,
    total_marks: Option<f64>,
}

struct StateSnapshot {
    districts: BTreeMap<String, DistrictTotal>,
    fetch_error: Option<String>,
}

impl<'a> KpiAnalyzer<'a> {
    pub fn new(source: &'a dyn ReportSource) -> Self {
        Self { source }
    }

    pub fn analyze(&self, district: &str, report_date: NaiveDate) -> KpiAnalysis {
        let district_upper = district.trim().to_uppercase();
        let previous_date = report_date - Duration::days(1);

        info!(district = %district_upper, %report_date, "running district kpi analysis");

        let current = self.state_snapshot(report_date);
        let previous = self.state_snapshot(previous_date);

        let current_ranks = ranks_of(&current);
        let previous_ranks = ranks_of(&previous);

        let current_district = current.districts.get(&district_upper);
        let previous_district = previous.districts.get(&district_upper);

        let state_context = state_context(&current, report_date);

        let current_rank = current_ranks.get(&district_upper).copied();
        let previous_rank = previous_ranks.get(&district_upper).copied();
        let current_total = current_district.and_then(|d| d.total_marks);
        let previous_total = previous_district.and_then(|d| d.total_marks);

        let kpis = KpiSet {
            rank: RankKpi {
                current: current_rank,
                previous: previous_rank,
                change: rank_delta(current_rank, previous_rank),
                total_districts_ranked_today: state_context
                    .total_marks_stats
                    .count_valid_districts,
            },
            total_marks: marks_kpi(current_total, previous_total, &state_context),
            farm_ponds_completed: count_kpi(current_district, previous_district, |d| {
                d.farm_ponds.as_ref().map(|entry| entry.count)
            }),
            dugwell_recharge_completed: count_kpi(current_district, previous_district, |d| {
                d.dugwell.as_ref().map(|entry| entry.count)
            }),
            amrit_sarovar_completed: count_kpi(current_district, previous_district, |d| {
                d.amrit_sarovar.as_ref().map(|entry| entry.count)
            }),
            old_work_completed: count_kpi(current_district, previous_district, |d| {
                d.performance.as_ref().map(|entry| entry.old_work_completed)
            }),
            mybharat_completed: count_kpi(current_district, previous_district, |d| {
                d.mybharat.as_ref().map(|entry| entry.count)
            }),
        };

        let mut notes = Vec::new();
        if current_district.is_none() {
            notes.push(format!(
                "Data for {district_upper} missing for current date {report_date}."
            ));
        }
        if previous_district.is_none() {
            notes.push(format!(
                "Data for {district_upper} missing for previous date {previous_date}."
            ));
        }

        let mut analysis = KpiAnalysis {
            district_name: district_upper,
            report_date,
            previous_report_date: previous_date,
            kpis,
            state_context,
            fetch_errors: FetchErrors {
                current: current.fetch_error,
                previous: previous.fetch_error,
            },
            notes,
            explanation: String::new(),
        };

        analysis.explanation = narrative::compose(&analysis);
        analysis
    }

    /// Fetches every component's state list for one date and folds the
    /// entries into per-district totals. Component failures degrade to a
    /// combined fetch-error string; a failing component never aborts the
    /// others.
    fn state_snapshot(&self, date: NaiveDate) -> StateSnapshot {
        let mut districts: BTreeMap<String, DistrictTotal> = BTreeMap::new();
        let mut fetch_errors: Vec<String> = Vec::new();
        let date_param = date.format("%Y-%m-%d").to_string();

        for component in Component::ordered() {
            let uses_date = component
                .field_map()
                .map(|fields| fields.uses_date)
                .unwrap_or(true);
            let mut params: Vec<(&str, String)> = Vec::new();
            if uses_date {
                params.push(("date", date_param.clone()));
            }

            let endpoint = component.endpoint();
            let payload = match self.source.fetch(endpoint, &params) {
                Some(payload) => payload,
                None => {
                    let message = format!(
                        "Failed to fetch data for component '{}' on {} from {}.",
                        component.key(),
                        date,
                        endpoint
                    );
                    warn!("{message}");
                    fetch_errors.push(message);
                    continue;
                }
            };

            let results_key = component
                .field_map()
                .map(|fields| fields.results_key)
                .unwrap_or("results");
            let Some(results) = safe_get(&payload, &[results_key]).and_then(|r| r.as_array())
            else {
                let message = format!(
                    "Results key '{}' missing or not a list for component '{}' on {}.",
                    results_key,
                    component.key(),
                    date
                );
                warn!("{message}");
                fetch_errors.push(message);
                continue;
            };
            if results.is_empty() {
                warn!(component = component.key(), %date, "no results for component");
                continue;
            }

            for item in results {
                self.fold_entry(component, item, &mut districts);
            }
        }

        for district in districts.values_mut() {
            district.total_marks = total_marks(district);
        }

        StateSnapshot {
            districts,
            fetch_error: (!fetch_errors.is_empty()).then(|| fetch_errors.join("; ")),
        }
    }

    fn fold_entry(
        &self,
        component: Component,
        item: &Value,
        districts: &mut BTreeMap<String, DistrictTotal>,
    ) {
        let name_key = component
            .field_map()
            .map(|fields| fields.name_key)
            .unwrap_or("name");
        let Some(name) = safe_get(item, &[name_key])
            .and_then(|value| value.as_str())
            .and_then(normalize_entity_name)
        else {
            warn!(component = component.key(), "skipping entry without a usable name");
            return;
        };

        let district = districts.entry(name.clone()).or_insert_with(|| DistrictTotal {
            name,
            ..DistrictTotal::default()
        });

        match component {
            Component::OldWorks => {
                let completed = WorkCategory::ordered()
                    .into_iter()
                    .map(|category| {
                        convert_i64(
                            safe_get(item, &["categories", category.label(), "completed"]),
                            0,
                        )
                    })
                    .sum();
                district.performance = Some(PerformanceEntry {
                    target_marks: convert_f64(safe_get(item, &["target_marks"]), 0.0),
                    payment_marks: convert_f64(safe_get(item, &["payment_marks"]), 0.0),
                    old_work_completed: completed,
                });
            }
            standard => {
                let Some(fields) = standard.field_map() else {
                    return;
                };
                let entry = ComponentEntry {
                    marks: convert_f64(safe_get(item, &[fields.score_key]), 0.0),
                    count: convert_i64(safe_get(item, &[fields.count_key]), 0),
                };
                let slot = match standard {
                    Component::FarmPonds => &mut district.farm_ponds,
                    Component::DugwellRecharge => &mut district.dugwell,
                    Component::AmritSarovar => &mut district.amrit_sarovar,
                    Component::MyBharat => &mut district.mybharat,
                    Component::OldWorks => return,
                };
                *slot = Some(entry);
            }
        }
    }
}

/// Sum of weighted component scores; the old works sub-score is target
/// achievement plus payment marks. A non-finite sum marks the computation
/// as failed rather than pretending the district scored zero.
fn total_marks(district: &DistrictTotal) -> Option<f64> {
    let mut total = 0.0;
    if let Some(performance) = &district.performance {
        total += performance.target_marks + performance.payment_marks;
    }
    for entry in [
        &district.farm_ponds,
        &district.dugwell,
        &district.amrit_sarovar,
        &district.mybharat,
    ]
    .into_iter()
    .flatten()
    {
        total += entry.marks;
    }

    if total.is_finite() {
        Some(round2(total))
    } else {
        warn!(district = %district.name, "total marks computation produced a non-finite value");
        None
    }
}

/// Ceiling for the weighted total: the sum of every component's maximum.
fn total_max_marks() -> f64 {
    Component::ordered()
        .into_iter()
        .map(Component::max_marks)
        .sum()
}

fn marks_kpi(current: Option<f64>, previous: Option<f64>, context: &StateContext) -> MarksKpi {
    let stats = MarksStats {
        average: context.total_marks_stats.average,
        median: context.total_marks_stats.median,
        count: context.total_marks_stats.count_valid_districts,
    };
    let band = current.and_then(|value| grade::grade(value, total_max_marks(), Some(&stats)));
    MarksKpi {
        current,
        previous,
        change: value_delta(current, previous),
        grade: band,
        grade_class: grade::css_class_or_plain(band),
    }
}

fn ranks_of(snapshot: &StateSnapshot) -> HashMap<String, u32> {
    let scored: Vec<(String, Option<f64>)> = snapshot
        .districts
        .values()
        .map(|district| (district.name.clone(), district.total_marks))
        .collect();
    competition_ranks(&scored)
}

fn state_context(snapshot: &StateSnapshot, report_date: NaiveDate) -> StateContext {
    let valid: Vec<&DistrictTotal> = snapshot
        .districts
        .values()
        .filter(|district| district.total_marks.is_some())
        .collect();

    let extrema = find_extrema(
        &valid,
        |district| district.name.as_str(),
        |district| district.total_marks,
        true,
    );
    let summarize_performer = |district: &&DistrictTotal| PerformerSummary {
        name: district.name.clone(),
        score: district.total_marks.unwrap_or(0.0),
    };

    let totals: Vec<f64> = valid
        .iter()
        .filter_map(|district| district.total_marks)
        .collect();
    let totals_summary = summarize(&totals);

    let component_stats = ComponentStatsSet {
        performance_target: marks_stats(&valid, |d| {
            d.performance.as_ref().map(|entry| entry.target_marks)
        }),
        performance_payment: marks_stats(&valid, |d| {
            d.performance.as_ref().map(|entry| entry.payment_marks)
        }),
        farm_ponds: marks_stats(&valid, |d| d.farm_ponds.as_ref().map(|entry| entry.marks)),
        dugwell: marks_stats(&valid, |d| d.dugwell.as_ref().map(|entry| entry.marks)),
        amrit_sarovar: marks_stats(&valid, |d| {
            d.amrit_sarovar.as_ref().map(|entry| entry.marks)
        }),
        mybharat: marks_stats(&valid, |d| d.mybharat.as_ref().map(|entry| entry.marks)),
    };

    StateContext {
        report_date,
        total_marks_stats: TotalMarksStats {
            top_performer: extrema.top.map(summarize_performer),
            bottom_performer: extrema.bottom.map(summarize_performer),
            average: totals_summary.mean,
            median: totals_summary.median,
            count_valid_districts: totals_summary.count,
        },
        component_stats,
    }
}

fn marks_stats<F>(districts: &[&DistrictTotal], value_of: F) -> MarksStats
where
    F: Fn(&DistrictTotal) -> Option<f64>,
{
    let values: Vec<f64> = districts
        .iter()
        .filter_map(|district| value_of(district))
        .collect();
    let StatsSummary {
        mean,
        median,
        count,
        ..
    } = summarize(&values);
    MarksStats {
        average: mean,
        median,
        count,
    }
}

fn count_kpi<F>(
    current: Option<&DistrictTotal>,
    previous: Option<&DistrictTotal>,
    value_of: F,
) -> CountKpi
where
    F: Fn(&DistrictTotal) -> Option<i64>,
{
    let current_value = current.and_then(&value_of);
    let previous_value = previous.and_then(&value_of);
    CountKpi {
        current: current_value,
        previous: previous_value,
        change: value_delta(
            current_value.map(|v| v as f64),
            previous_value.map(|v| v as f64),
        ),
    }
}
