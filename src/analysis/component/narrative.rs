//! Deterministic narrative text for a component analysis: short sentence
//! fragments in a fixed order, assembled from whatever data survived the
//! fetch phase. The renderer treats this as display copy.

use super::views::ComponentAnalysis;
use crate::analysis::domain::Target;
use num_format::{Locale, ToFormattedString};

pub(crate) fn compose(analysis: &ComponentAnalysis, has_blocks: bool) -> String {
    let mut parts: Vec<String> = Vec::new();

    district_fragment(analysis, &mut parts);
    block_fragment(analysis, has_blocks, &mut parts);
    state_fragment(analysis, &mut parts);

    let narrative = parts.join(" ");

    let nothing_at_all = analysis.selected_district_comparison.current_data.is_none()
        && analysis.block_level_comparison.is_empty()
        && analysis.state_statistics_today.districts_reporting == 0;
    if nothing_at_all {
        return format!(
            "Error: Could not retrieve essential performance data for {} ({}) on {}. Analysis is incomplete. {}",
            analysis.selected_district, analysis.component, analysis.report_date, narrative
        );
    }

    narrative
}

fn district_fragment(analysis: &ComponentAnalysis, parts: &mut Vec<String>) {
    let comparison = &analysis.selected_district_comparison;

    let Some(current) = &comparison.current_data else {
        parts.push(format!(
            "Could not retrieve specific {} performance data for {} on {}.",
            analysis.component, analysis.selected_district, analysis.report_date
        ));
        if let Some(error) = &analysis.current_analysis_error {
            parts.push(format!("(Error fetching current data: {error})"));
        }
        return;
    };

    let target = match current.target {
        Target::Count(count) => count.to_formatted_string(&Locale::en),
        Target::NotAvailable => "N/A".to_string(),
    };
    parts.push(format!(
        "On {}, for {}, {} reported {} units (Target: {}), scoring {:.2}/{:.0}.",
        analysis.report_date,
        analysis.component,
        analysis.selected_district,
        current.count.to_formatted_string(&Locale::en),
        target,
        current.score,
        analysis.max_marks
    ));

    if let Some(change) = &comparison.change {
        let score_desc = if change.score_change.is_zero() {
            "score remained the same".to_string()
        } else {
            format!("score changed by {} points", change.score_change)
        };
        let count_desc = if change.count_change.is_zero() {
            "count remained the same".to_string()
        } else {
            format!("count changed by {}", change.count_change)
        };
        parts.push(format!(
            "Compared to {}, the {} and the {}.",
            analysis.previous_report_date, score_desc, count_desc
        ));
    } else if analysis.previous_analysis_error.is_some() {
        parts.push(format!(
            "Could not retrieve comparison data for {} from {} due to an error.",
            analysis.selected_district, analysis.previous_report_date
        ));
    } else {
        parts.push(format!(
            "Data for the previous day ({}) was not available for comparison for {}.",
            analysis.previous_report_date, analysis.selected_district
        ));
    }
}

fn block_fragment(analysis: &ComponentAnalysis, has_blocks: bool, parts: &mut Vec<String>) {
    if !has_blocks {
        parts.push(format!(
            "Note: block-level breakdown and top panchayats are not available for {} from this data source.",
            analysis.component
        ));
        return;
    }

    let blocks = &analysis.block_level_comparison;
    if blocks.is_empty() {
        if analysis.current_analysis_error.is_none() {
            parts.push(format!(
                "Block-level breakdown for {} in {} could not be retrieved for {}.",
                analysis.component, analysis.selected_district, analysis.report_date
            ));
        }
        return;
    }

    let with_previous = blocks
        .iter()
        .filter(|block| block.count_previous.is_some())
        .count();
    parts.push(format!(
        "Block-level data for {} blocks within {} is included.",
        blocks.len(),
        analysis.selected_district
    ));
    if with_previous > 0 {
        parts.push(format!(
            "Counts for today ({}) and the previous day ({}) are shown ({}/{} blocks had previous day data).",
            analysis.report_date,
            analysis.previous_report_date,
            with_previous,
            blocks.len()
        ));
    } else {
        parts.push(format!(
            "Previous day ({}) block counts were not available for comparison.",
            analysis.previous_report_date
        ));
    }
    parts.push("Top 5 panchayats by count (as of today) are listed for each block.".to_string());
}

fn state_fragment(analysis: &ComponentAnalysis, parts: &mut Vec<String>) {
    let statistics = &analysis.state_statistics_today;
    if statistics.districts_reporting == 0 {
        if analysis.current_analysis_error.is_none() {
            parts.push(format!(
                "State-level comparison data could not be retrieved for {}.",
                analysis.report_date
            ));
        }
        return;
    }

    parts.push(format!(
        "Across the state ({} districts reporting on {}):",
        statistics.districts_reporting, analysis.report_date
    ));

    let by_score = &analysis.state_level_summary_today.by_score;
    match (&by_score.top_performer, &by_score.bottom_performer) {
        (Some(top), Some(bottom)) => parts.push(format!(
            "- Top performer by Score: {} ({:.2}). Bottom: {} ({:.2}).",
            top.name, top.score, bottom.name, bottom.score
        )),
        _ => parts.push("- Top/Bottom performers by SCORE could not be fully determined.".to_string()),
    }

    let by_count = &analysis.state_level_summary_today.by_count;
    match (&by_count.top_performer, &by_count.bottom_performer) {
        (Some(top), Some(bottom)) => parts.push(format!(
            "- Top performer by Count: {} ({}). Bottom: {} ({}).",
            top.name,
            top.count.to_formatted_string(&Locale::en),
            bottom.name,
            bottom.count.to_formatted_string(&Locale::en)
        )),
        _ => parts.push("- Top/Bottom districts by COUNT could not be fully determined.".to_string()),
    }

    let mut stat_parts = Vec::new();
    if let Some(mean) = statistics.score.mean {
        stat_parts.push(format!("Mean Score: {mean:.2}"));
    }
    if let Some(median) = statistics.score.median {
        stat_parts.push(format!("Median Score: {median:.2}"));
    }
    if let Some(mean) = statistics.count.mean {
        stat_parts.push(format!("Mean Count: {mean:.2}"));
    }
    if let Some(median) = statistics.count.median {
        stat_parts.push(format!("Median Count: {median:.0}"));
    }
    if stat_parts.is_empty() {
        parts.push("- State descriptive statistics could not be calculated.".to_string());
    } else {
        parts.push(format!("- State Statistics: {}.", stat_parts.join("; ")));
    }

    if analysis.selected_district_comparison.current_data.is_some() {
        let position = &analysis.selected_district_position_vs_state;
        match (&position.score_comparison, &position.count_comparison) {
            (Some(score), Some(count)) => parts.push(format!(
                "- {}'s position: Score is {}; Count is {}.",
                analysis.selected_district, score, count
            )),
            _ => parts.push(format!(
                "- Could not determine {}'s position relative to state averages.",
                analysis.selected_district
            )),
        }
    }
}
