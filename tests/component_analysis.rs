use jsm_insights::analysis::{run_component_report, Component, ComponentAnalyzer, ComponentReport};
use jsm_insights::source::StaticSource;
use serde_json::json;

const REPORT_DATE: &str = "2024-05-01";
const PREVIOUS_DATE: &str = "2024-04-30";

fn farm_ponds_source() -> StaticSource {
    let mut source = StaticSource::new();

    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("date", REPORT_DATE)],
        json!({
            "results": [
                {"name": "Bhopal", "marks": 18.5, "actual_count": 100, "target": 150, "achievement_percentage": 66.67},
                {"name": "Sehore", "marks": 18.5, "actual_count": 80, "target": 90, "achievement_percentage": 88.89},
                {"name": "Datia", "marks": 12.0, "actual_count": 200, "target": null, "achievement_percentage": "inf"},
                {"name": "   ", "marks": 99.0, "actual_count": 1},
            ]
        }),
    );
    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("date", PREVIOUS_DATE)],
        json!({
            "results": [
                {"name": "Bhopal", "marks": 17.0, "actual_count": 90, "target": 150},
                {"name": "Sehore", "marks": 18.0, "actual_count": 75, "target": 90},
                {"name": "Datia", "marks": 11.0, "actual_count": 180},
            ]
        }),
    );

    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("district", "Bhopal"), ("date", REPORT_DATE)],
        json!({
            "results": [
                {"name": "BERASIA", "marks": 9.0, "actual_count": 40},
                {"name": "PHANDA", "marks": 6.5, "actual_count": 25},
            ]
        }),
    );
    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("district", "Bhopal"), ("date", PREVIOUS_DATE)],
        json!({
            "results": [
                {"name": "BERASIA", "marks": 8.5, "actual_count": 38},
            ]
        }),
    );

    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[
            ("district", "Bhopal"),
            ("block", "BERASIA"),
            ("date", REPORT_DATE),
        ],
        json!({
            "results": [
                {"name": "P1", "actual_count": 12},
                {"name": "P2", "actual_count": 9},
                {"name": "P3", "actual_count": 7},
                {"name": "P4", "actual_count": 5},
                {"name": "P5", "actual_count": 4},
                {"name": "P6", "actual_count": 3},
            ]
        }),
    );
    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[
            ("district", "Bhopal"),
            ("block", "PHANDA"),
            ("date", REPORT_DATE),
        ],
        json!({"results": []}),
    );

    source
}

#[test]
fn farm_ponds_analysis_compares_two_dates() {
    let source = farm_ponds_source();
    let report = run_component_report(&source, Component::FarmPonds, "Bhopal", REPORT_DATE)
        .expect("analysis runs");
    let ComponentReport::Standard(analysis) = report else {
        panic!("expected standard component report");
    };

    assert_eq!(analysis.component, "Farm Ponds");
    assert_eq!(analysis.max_marks, 30.0);
    assert!(analysis.current_analysis_error.is_none());
    assert!(analysis.previous_analysis_error.is_none());

    let comparison = &analysis.selected_district_comparison;
    let current = comparison.current_data.as_ref().expect("district found");
    assert_eq!(current.name, "BHOPAL");
    assert_eq!(current.score, 18.5);
    assert_eq!(current.count, 100);

    let change = comparison.change.as_ref().expect("both days present");
    assert_eq!(change.score_change.as_f64(), 1.5);
    assert_eq!(change.count_change.as_f64(), 10.0);
}

#[test]
fn state_summary_resolves_ties_by_name_and_keeps_full_records() {
    let source = farm_ponds_source();
    let analyzer =
        ComponentAnalyzer::new(&source, Component::FarmPonds).expect("standard component");
    let analysis = analyzer.analyze(
        "Bhopal",
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
    );

    let summary = &analysis.state_level_summary_today;
    let top_score = summary.by_score.top_performer.as_ref().expect("top");
    assert_eq!(top_score.name, "BHOPAL");
    assert_eq!(top_score.count, 100, "full record, not just the score");
    assert_eq!(
        summary.by_score.bottom_performer.as_ref().expect("bottom").name,
        "DATIA"
    );
    assert_eq!(
        summary.by_count.top_performer.as_ref().expect("top").name,
        "DATIA"
    );
    assert_eq!(
        summary.by_count.bottom_performer.as_ref().expect("bottom").name,
        "SEHORE"
    );

    // The unnamed record must have been rejected during normalization.
    assert_eq!(analysis.state_statistics_today.districts_reporting, 3);
    let stats = &analysis.state_statistics_today;
    assert_eq!(stats.score.mean, Some(16.33));
    assert_eq!(stats.score.median, Some(18.5));
    assert_eq!(stats.count.max, Some(200.0));

    assert_eq!(
        analysis
            .selected_district_position_vs_state
            .score_comparison
            .as_deref(),
        Some("Above Mean / Equal to Median")
    );
}

#[test]
fn block_breakdown_keeps_top_five_and_marks_missing_history() {
    let source = farm_ponds_source();
    let analyzer =
        ComponentAnalyzer::new(&source, Component::FarmPonds).expect("standard component");
    let analysis = analyzer.analyze(
        "Bhopal",
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
    );

    let blocks = &analysis.block_level_comparison;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].name, "BERASIA", "sorted by current count");
    assert_eq!(blocks[0].count_today, 40);
    assert_eq!(blocks[0].count_previous, Some(38));
    assert_eq!(blocks[1].name, "PHANDA");
    assert_eq!(
        blocks[1].count_previous, None,
        "a block absent yesterday is unknown, not zero"
    );

    let panchayats = &blocks[0].top_panchayats;
    assert_eq!(panchayats.len(), 5);
    assert_eq!(panchayats[0].name, "P1");
    assert_eq!(panchayats[4].name, "P5");
    assert!(blocks[1].top_panchayats.is_empty());
}

#[test]
fn narrative_mentions_standing_delta_and_state_context() {
    let source = farm_ponds_source();
    let report = run_component_report(&source, Component::FarmPonds, "Bhopal", REPORT_DATE)
        .expect("analysis runs");
    let ComponentReport::Standard(analysis) = report else {
        panic!("expected standard component report");
    };

    let explanation = &analysis.explanation;
    assert!(explanation.contains("Bhopal reported 100 units"));
    assert!(explanation.contains("score changed by +1.50 points"));
    assert!(explanation.contains("count changed by +10"));
    assert!(explanation.contains("Top performer by Score: BHOPAL (18.50)"));
    assert!(explanation.contains("Top performer by Count: DATIA (200)"));
    assert!(explanation.contains("Block-level data for 2 blocks"));
    assert!(explanation.contains("Above Mean / Equal to Median"));
}

#[test]
fn missing_upstream_data_degrades_to_a_complete_structure() {
    let source = StaticSource::new();
    let report = run_component_report(&source, Component::FarmPonds, "Bhopal", REPORT_DATE)
        .expect("analysis still returns a structure");
    let ComponentReport::Standard(analysis) = report else {
        panic!("expected standard component report");
    };

    assert!(analysis.current_analysis_error.is_some());
    assert!(analysis.previous_analysis_error.is_some());
    assert!(analysis.selected_district_comparison.current_data.is_none());
    assert!(analysis.block_level_comparison.is_empty());
    assert_eq!(analysis.state_statistics_today.districts_reporting, 0);
    assert!(analysis
        .explanation
        .starts_with("Error: Could not retrieve essential performance data"));

    // Stable shape: every key serializes even when everything is missing.
    let value = serde_json::to_value(&analysis).expect("serializes");
    let object = value.as_object().expect("object");
    for key in [
        "selected_district_comparison",
        "state_level_summary_today",
        "block_level_comparison",
        "state_statistics_today",
        "selected_district_position_vs_state",
        "explanation",
    ] {
        assert!(object.contains_key(key), "missing key {key}");
    }
    assert!(value["selected_district_comparison"]["current_data"].is_null());
    assert!(value["state_statistics_today"]["score"]["mean"].is_null());
}

#[test]
fn dateless_component_skips_the_previous_day_comparison() {
    let mut source = StaticSource::new();
    source.insert(
        "/report_jsm/amritsarovar-stats",
        &[],
        json!({
            "details": [
                {"name": "Bhopal", "marks": 15.0, "actual_count": 12, "target": 20},
                {"name": "Sehore", "marks": 10.0, "actual_count": 8, "target": 15},
            ]
        }),
    );

    let report = run_component_report(&source, Component::AmritSarovar, "Bhopal", REPORT_DATE)
        .expect("analysis runs");
    let ComponentReport::Standard(analysis) = report else {
        panic!("expected standard component report");
    };

    let comparison = &analysis.selected_district_comparison;
    assert!(comparison.current_data.is_some());
    assert!(comparison.previous_data.is_none());
    assert!(comparison.change.is_none());
    assert!(analysis
        .explanation
        .contains("was not available for comparison"));
    assert!(analysis
        .explanation
        .contains("block-level breakdown and top panchayats are not available"));
}
