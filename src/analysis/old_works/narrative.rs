use super::views::OldWorksAnalysis;
use num_format::{Locale, ToFormattedString};

pub(crate) fn compose(analysis: &OldWorksAnalysis) -> String {
    let mut parts: Vec<String> = Vec::new();

    district_fragment(analysis, &mut parts);
    block_fragment(analysis, &mut parts);
    state_fragment(analysis, &mut parts);
    leaders_fragment(analysis, &mut parts);

    let narrative = parts.join(" ");

    let nothing_at_all = analysis.selected_district_comparison.current_data.is_none()
        && analysis
            .state_level_summary_today
            .by_score
            .top_performer
            .is_none();
    if nothing_at_all {
        return format!(
            "Error: Could not retrieve essential performance data for {} or state on {}. Analysis is incomplete. {}",
            analysis.selected_district, analysis.report_date, narrative
        );
    }

    narrative
}

fn district_fragment(analysis: &OldWorksAnalysis, parts: &mut Vec<String>) {
    let comparison = &analysis.selected_district_comparison;

    let Some(current) = &comparison.current_data else {
        parts.push(format!(
            "Could not retrieve specific {} performance data for {} on {}.",
            analysis.component, analysis.selected_district, analysis.report_date
        ));
        if let Some(error) = &analysis.current_analysis_error {
            parts.push(format!("(Error: {error})"));
        }
        return;
    };

    parts.push(format!(
        "On {}, for {}, {}'s overall performance score was {:.2}/{:.0} (Target Marks: {:.2}, Payment Marks: {:.2}).",
        analysis.report_date,
        analysis.component,
        analysis.selected_district,
        current.overall_score,
        analysis.max_marks,
        current.target_achievement_marks,
        current.payment_marks
    ));
    parts.push(format!(
        "This score considers {} NRM works relevant to the performance calculation period. A total of {} NRM works were completed across the tracked categories.",
        current.relevant_work_count.to_formatted_string(&Locale::en),
        current.total_work_completed.to_formatted_string(&Locale::en)
    ));

    if let Some(change) = &comparison.change {
        let mut descriptions = Vec::new();
        if change.score_change.is_zero() {
            descriptions.push("overall score remained the same".to_string());
        } else {
            descriptions.push(format!("overall score changed by {}", change.score_change));
        }
        if change.count_change.is_zero() {
            descriptions.push("relevant NRM work count remained the same".to_string());
        } else {
            descriptions.push(format!(
                "relevant NRM work count changed by {}",
                change.count_change
            ));
        }
        if change.total_work_completed_change.is_zero() {
            descriptions.push("total completed works remained the same".to_string());
        } else {
            descriptions.push(format!(
                "total completed works changed by {}",
                change.total_work_completed_change
            ));
        }
        if !change.payment_marks_change.is_zero() {
            descriptions.push(format!(
                "payment marks changed by {}",
                change.payment_marks_change
            ));
        }
        parts.push(format!(
            "Compared to {}, the {}.",
            analysis.previous_report_date,
            descriptions.join(", the ")
        ));

        let changed_categories = change.individual_work_type_changes.len();
        if changed_categories > 0 {
            parts.push(format!(
                "Changes in completed works/marks were observed in {changed_categories} specific NRM categories (details in 'change' data)."
            ));
        }
    } else if analysis.previous_analysis_error.is_some() {
        parts.push(format!(
            "Could not retrieve comparison data for {} from {} due to an error.",
            analysis.selected_district, analysis.previous_report_date
        ));
    } else {
        parts.push(format!(
            "Data for {} was not available for district comparison.",
            analysis.previous_report_date
        ));
    }

    parts.push(
        "Detailed current district data includes financial progress metrics and NRM work type breakdown."
            .to_string(),
    );
}

fn block_fragment(analysis: &OldWorksAnalysis, parts: &mut Vec<String>) {
    let blocks = &analysis.block_level_comparison;
    if blocks.is_empty() {
        if analysis.selected_district_comparison.current_data.is_some() {
            parts.push("Block-level comparison data could not be generated.".to_string());
        }
        return;
    }

    let any_changed = blocks
        .iter()
        .any(|block| !block.completed_works_change_by_type.is_empty());

    parts.push(format!(
        "Block-level data for {} blocks within {}:",
        blocks.len(),
        analysis.selected_district
    ));
    parts.push(format!(
        "- Shows the total number of completed NRM works by category as of today ({}).",
        analysis.report_date
    ));
    if any_changed {
        parts.push(format!(
            "- Also shows the change in completed works for each category compared to the previous day ({}) (only categories with changes listed).",
            analysis.previous_report_date
        ));
    } else {
        parts.push(
            "- No changes in completed works per category were observed compared to the previous day (or previous data was unavailable)."
                .to_string(),
        );
    }
    parts.push("Note: Panchayat-level data is not available from this performance endpoint.".to_string());
}

fn state_fragment(analysis: &OldWorksAnalysis, parts: &mut Vec<String>) {
    let summary = &analysis.state_level_summary_today;
    let (Some(top_score), Some(bottom_score)) = (
        &summary.by_score.top_performer,
        &summary.by_score.bottom_performer,
    ) else {
        if analysis.current_analysis_error.is_none() {
            parts.push(format!(
                "State-level comparison data could not be generated for {}.",
                analysis.report_date
            ));
        }
        return;
    };

    parts.push(format!("State-wide summary for {}:", analysis.report_date));
    parts.push(format!(
        "- Top performer by Overall Score: {} ({:.2}). Bottom: {} ({:.2}).",
        top_score.name, top_score.overall_score, bottom_score.name, bottom_score.overall_score
    ));

    match (
        &summary.by_count.top_performer,
        &summary.by_count.bottom_performer,
    ) {
        (Some(top), Some(bottom)) => parts.push(format!(
            "- Highest Total Completed NRM Work Count: {} ({}). Lowest: {} ({}).",
            top.name,
            top.total_work_completed.to_formatted_string(&Locale::en),
            bottom.name,
            bottom.total_work_completed.to_formatted_string(&Locale::en)
        )),
        _ => parts.push(
            "- Top/Bottom districts by total completed NRM work count could not be determined."
                .to_string(),
        ),
    }
}

fn leaders_fragment(analysis: &OldWorksAnalysis, parts: &mut Vec<String>) {
    let leader_parts: Vec<String> = analysis
        .state_category_leaders_today
        .iter()
        .filter_map(|(category, leader)| {
            let name = leader.name.as_ref()?;
            let details = leader.category_details.as_ref()?;
            Some(format!(
                "{}: {} (Marks: {:.2})",
                category.label(),
                name,
                details.marks
            ))
        })
        .collect();

    if !leader_parts.is_empty() {
        parts.push(format!(
            "State Leaders by Marks (as of {}) within specific NRM categories:",
            analysis.report_date
        ));
        parts.push(format!("- {}.", leader_parts.join("; ")));
    }
}
