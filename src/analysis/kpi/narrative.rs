use super::views::{CountKpi, KpiAnalysis};
use num_format::{Locale, ToFormattedString};

pub(crate) fn compose(analysis: &KpiAnalysis) -> String {
    let mut parts: Vec<String> = Vec::new();

    rank_fragment(analysis, &mut parts);
    marks_fragment(analysis, &mut parts);
    state_fragment(analysis, &mut parts);
    progress_fragment(analysis, &mut parts);
    notes_fragment(analysis, &mut parts);

    parts.join(" ")
}

fn rank_fragment(analysis: &KpiAnalysis, parts: &mut Vec<String>) {
    let rank = &analysis.kpis.rank;
    let mut sentence = format!(
        "For {} on {}: ",
        analysis.district_name, analysis.report_date
    );

    match rank.current {
        Some(current) if rank.total_districts_ranked_today > 0 => {
            sentence.push_str(&format!(
                "Rank {}/{}.",
                current, rank.total_districts_ranked_today
            ));
            match (rank.change, rank.previous) {
                (Some(change), Some(previous)) => {
                    let description = if change > 0 {
                        format!("Improved by {change}")
                    } else if change < 0 {
                        format!("Declined by {}", change.abs())
                    } else {
                        "No change".to_string()
                    };
                    sentence.push_str(&format!(
                        " ({description} from rank {previous} on {}).",
                        analysis.previous_report_date
                    ));
                }
                _ => sentence.push_str(&format!(
                    " (Previous rank on {} unavailable).",
                    analysis.previous_report_date
                )),
            }
        }
        _ => sentence.push_str("Rank unavailable."),
    }

    parts.push(sentence);
}

fn marks_fragment(analysis: &KpiAnalysis, parts: &mut Vec<String>) {
    let marks = &analysis.kpis.total_marks;
    match marks.current {
        Some(current) => {
            let mut sentence = format!("Total Marks: {current:.2}.");
            match marks.change {
                Some(change) => sentence.push_str(&format!(
                    " Change vs {}: {}.",
                    analysis.previous_report_date, change
                )),
                None => sentence.push_str(&format!(
                    " Comparison vs {} unavailable.",
                    analysis.previous_report_date
                )),
            }
            parts.push(sentence);
        }
        None => parts.push("Total marks unavailable.".to_string()),
    }
}

fn state_fragment(analysis: &KpiAnalysis, parts: &mut Vec<String>) {
    let stats = &analysis.state_context.total_marks_stats;
    if stats.count_valid_districts == 0 {
        parts.push(format!(
            "Could not determine state-wide performance context for {}.",
            analysis.report_date
        ));
        return;
    }

    let mut state_parts = vec![format!("State Context ({} districts):", stats.count_valid_districts)];
    if let Some(top) = &stats.top_performer {
        state_parts.push(format!("Highest: {:.2} ({})", top.score, top.name));
    }
    if let Some(bottom) = &stats.bottom_performer {
        if stats.top_performer.as_ref() != Some(bottom) {
            state_parts.push(format!("Lowest: {:.2} ({})", bottom.score, bottom.name));
        }
    }
    if let Some(average) = stats.average {
        state_parts.push(format!("Average: {average:.2}"));
    }
    if let Some(median) = stats.median {
        state_parts.push(format!("Median: {median:.2}"));
    }

    if state_parts.len() > 1 {
        parts.push(format!("{}.", state_parts.join(" ")));
    } else {
        parts.push(format!(
            "Partial state context available for {}.",
            analysis.report_date
        ));
    }
}

fn progress_fragment(analysis: &KpiAnalysis, parts: &mut Vec<String>) {
    parts.push("Progress vs Previous Day:".to_string());

    let kpis = &analysis.kpis;
    let labelled: [(&str, &CountKpi); 5] = [
        ("Farm Ponds", &kpis.farm_ponds_completed),
        ("Dugwell Recharge", &kpis.dugwell_recharge_completed),
        ("Amrit Sarovar", &kpis.amrit_sarovar_completed),
        ("Old Work (Completed)", &kpis.old_work_completed),
        ("MyBharat (Jaldoot)", &kpis.mybharat_completed),
    ];

    let mut change_notes = Vec::new();
    for (label, kpi) in labelled {
        let Some(current) = kpi.current else {
            continue;
        };
        let mut note = format!("{}: {}", label, current.to_formatted_string(&Locale::en));
        match kpi.change {
            Some(change) if !change.is_zero() => note.push_str(&format!(" ({change})")),
            Some(_) => note.push_str(" (No change)"),
            None => {}
        }
        note.push('.');
        change_notes.push(note);
    }

    if change_notes.is_empty() {
        parts.push("No component change data available.".to_string());
    } else {
        parts.extend(change_notes);
    }
}

fn notes_fragment(analysis: &KpiAnalysis, parts: &mut Vec<String>) {
    let mut error_spans = Vec::new();
    if analysis.fetch_errors.current.is_some() {
        error_spans.push(format!("current date ({})", analysis.report_date));
    }
    if analysis.fetch_errors.previous.is_some() {
        error_spans.push(format!("previous date ({})", analysis.previous_report_date));
    }
    if !error_spans.is_empty() {
        parts.push(format!(
            "Note: Fetch errors occurred for {} which may affect results.",
            error_spans.join(" and ")
        ));
    }
    if !analysis.notes.is_empty() {
        parts.push(format!("Data Notes: {}", analysis.notes.join("; ")));
    }
}
