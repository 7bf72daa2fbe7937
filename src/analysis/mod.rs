//! The aggregation and ranking core: normalization of loosely-shaped
//! upstream records, state-wide statistics, tie-aware rankings,
//! day-over-day deltas and relative grading, orchestrated per component
//! and across components for one district and date.

pub mod access;
pub mod component;
pub mod delta;
pub mod domain;
pub mod extrema;
pub mod grade;
pub mod kpi;
pub mod normalize;
pub mod old_works;
pub mod rank;
pub mod stats;

use crate::source::ReportSource;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

pub use component::ComponentAnalyzer;
pub use domain::Component;
pub use kpi::KpiAnalyzer;
pub use old_works::OldWorksAnalyzer;

/// Failures that abort an analysis call outright. Anything else degrades
/// into the result structure instead of erroring.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("district name is required")]
    MissingDistrict,
    #[error("invalid report date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    #[error("block list for district '{0}' could not be retrieved")]
    BlockListUnavailable(String),
}

/// A finished per-component report, whichever analyzer produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ComponentReport {
    Standard(component::views::ComponentAnalysis),
    OldWorks(old_works::views::OldWorksAnalysis),
}

pub fn parse_report_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalysisError::InvalidDate(raw.trim().to_string()))
}

fn validated_inputs(district: &str, date_raw: &str) -> Result<(String, NaiveDate), AnalysisError> {
    let district = district.trim();
    if district.is_empty() {
        return Err(AnalysisError::MissingDistrict);
    }
    Ok((district.to_string(), parse_report_date(date_raw)?))
}

/// Runs one component's two-date analysis for a district.
pub fn run_component_report(
    source: &dyn ReportSource,
    component: Component,
    district: &str,
    date_raw: &str,
) -> Result<ComponentReport, AnalysisError> {
    let (district, report_date) = validated_inputs(district, date_raw)?;
    match ComponentAnalyzer::new(source, component) {
        Some(analyzer) => Ok(ComponentReport::Standard(
            analyzer.analyze(&district, report_date),
        )),
        None => OldWorksAnalyzer::new(source)
            .analyze(&district, report_date)
            .map(ComponentReport::OldWorks),
    }
}

/// Runs the cross-component KPI analysis for a district.
pub fn run_kpi_report(
    source: &dyn ReportSource,
    district: &str,
    date_raw: &str,
) -> Result<kpi::views::KpiAnalysis, AnalysisError> {
    let (district, report_date) = validated_inputs(district, date_raw)?;
    Ok(KpiAnalyzer::new(source).analyze(&district, report_date))
}

/// Round to 2 decimals, the precision every reported figure uses.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;

    #[test]
    fn blank_district_is_rejected_before_any_fetch() {
        let source = StaticSource::new();
        let error = run_kpi_report(&source, "   ", "2024-05-01").expect_err("must reject");
        assert!(matches!(error, AnalysisError::MissingDistrict));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let source = StaticSource::new();
        let error =
            run_component_report(&source, Component::FarmPonds, "BHOPAL", "01-05-2024")
                .expect_err("must reject");
        assert!(matches!(error, AnalysisError::InvalidDate(_)));
    }

    #[test]
    fn round2_behaves_at_the_boundaries() {
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(-1.255), -1.25);
        assert_eq!(round2(3.0), 3.0);
    }
}
