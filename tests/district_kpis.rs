use jsm_insights::analysis::grade::Grade;
use jsm_insights::analysis::run_kpi_report;
use jsm_insights::source::StaticSource;
use serde_json::json;

const REPORT_DATE: &str = "2024-05-01";
const PREVIOUS_DATE: &str = "2024-04-30";

fn performance_entry(name: &str, target: f64, payment: f64, talab: i64, khet: i64) -> serde_json::Value {
    json!({
        "name": name,
        "target_marks": target,
        "payment_marks": payment,
        "categories": {
            "Talab Nirman": {"target": 20, "completed": talab, "marks": 2.0},
            "Khet Talab": {"target": 10, "completed": khet, "marks": 1.0},
        },
        "category_counts": {"Talab Nirman": talab, "Khet Talab": khet},
    })
}

fn full_source() -> StaticSource {
    let mut source = StaticSource::new();

    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("date", REPORT_DATE)],
        json!({"results": [
            {"name": "Bhopal", "marks": 20.0, "actual_count": 10},
            {"name": "Sehore", "marks": 25.0, "actual_count": 5},
        ]}),
    );
    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("date", PREVIOUS_DATE)],
        json!({"results": [
            {"name": "Bhopal", "marks": 15.0, "actual_count": 10},
            {"name": "Sehore", "marks": 28.0, "actual_count": 5},
        ]}),
    );

    for date in [REPORT_DATE, PREVIOUS_DATE] {
        source.insert(
            "/report_jsm/dugwell-marks",
            &[("date", date)],
            json!({"results": [
                {"name": "Bhopal", "marks": 10.0, "actual_count": 4},
            ]}),
        );
        source.insert(
            "/report_jsm/mybharat/gender-stats",
            &[("date", date)],
            json!({"districts_data": [
                {"district": "Bhopal", "marks": 5.0, "total_count": 100, "target": 120},
                {"district": "Sehore", "marks": 5.0, "total_count": 50, "target": 80},
                {"district": "Raisen", "marks": 2.0, "total_count": 10, "target": 40},
            ]}),
        );
    }

    // The amrit sarovar endpoint ignores dates; one canned payload serves
    // both snapshot fetches.
    source.insert(
        "/report_jsm/amritsarovar-stats",
        &[],
        json!({"details": [
            {"name": "Bhopal", "marks": 5.0, "actual_count": 2},
            {"name": "Sehore", "marks": 5.0, "actual_count": 3},
        ]}),
    );

    source.insert(
        "/report_jsm/performance-marks",
        &[("date", REPORT_DATE)],
        json!({"results": [
            performance_entry("Bhopal", 8.0, 2.0, 3, 2),
            performance_entry("Sehore", 6.0, 4.0, 1, 0),
        ]}),
    );
    source.insert(
        "/report_jsm/performance-marks",
        &[("date", PREVIOUS_DATE)],
        json!({"results": [
            performance_entry("Bhopal", 8.0, 2.0, 2, 2),
            performance_entry("Sehore", 6.0, 4.0, 1, 0),
        ]}),
    );

    source
}

#[test]
fn totals_rank_and_deltas_for_the_selected_district() {
    let source = full_source();
    let analysis =
        run_kpi_report(&source, "bhopal", REPORT_DATE).expect("kpi analysis runs");

    assert_eq!(analysis.district_name, "BHOPAL");

    // Current totals: Bhopal 10+20+10+5+5=50, Sehore 10+25+5+5=45, Raisen 2.
    let marks = &analysis.kpis.total_marks;
    assert_eq!(marks.current, Some(50.0));
    assert_eq!(marks.previous, Some(45.0));
    assert_eq!(marks.change.expect("change computed").as_f64(), 5.0);

    // 50 is at least 25% above the state average of 32.33.
    assert_eq!(marks.grade, Some(Grade::Excellent));
    assert_eq!(marks.grade_class, "grade-badge excellent");

    // Previous totals: Bhopal 45, Sehore 48. The district moved from rank
    // 2 to rank 1, a positive rank delta.
    let rank = &analysis.kpis.rank;
    assert_eq!(rank.current, Some(1));
    assert_eq!(rank.previous, Some(2));
    assert_eq!(rank.change, Some(1));
    assert_eq!(rank.total_districts_ranked_today, 3);

    assert_eq!(analysis.kpis.old_work_completed.current, Some(5));
    assert_eq!(analysis.kpis.old_work_completed.previous, Some(4));
    assert_eq!(
        analysis
            .kpis
            .old_work_completed
            .change
            .expect("change computed")
            .as_f64(),
        1.0
    );
    assert_eq!(analysis.kpis.farm_ponds_completed.current, Some(10));
    assert!(analysis.kpis.farm_ponds_completed.change.expect("present").is_zero());
}

#[test]
fn union_of_entities_keeps_single_component_districts() {
    let source = full_source();
    let analysis = run_kpi_report(&source, "Raisen", REPORT_DATE).expect("kpi analysis runs");

    // Raisen reports only through mybharat but still gets a total and rank.
    assert_eq!(analysis.kpis.total_marks.current, Some(2.0));
    assert_eq!(analysis.kpis.total_marks.grade, Some(Grade::VeryPoor));
    assert_eq!(analysis.kpis.rank.current, Some(3));
    assert_eq!(analysis.kpis.farm_ponds_completed.current, None);
    assert_eq!(analysis.kpis.mybharat_completed.current, Some(10));
}

#[test]
fn state_context_carries_performers_and_component_distributions() {
    let source = full_source();
    let analysis = run_kpi_report(&source, "Bhopal", REPORT_DATE).expect("kpi analysis runs");

    let stats = &analysis.state_context.total_marks_stats;
    assert_eq!(stats.count_valid_districts, 3);
    assert_eq!(stats.top_performer.as_ref().expect("top").name, "BHOPAL");
    assert_eq!(stats.top_performer.as_ref().expect("top").score, 50.0);
    assert_eq!(stats.bottom_performer.as_ref().expect("bottom").name, "RAISEN");
    assert_eq!(stats.average, Some(32.33));
    assert_eq!(stats.median, Some(45.0));

    let components = &analysis.state_context.component_stats;
    assert_eq!(components.farm_ponds.count, 2);
    assert_eq!(components.farm_ponds.average, Some(22.5));
    assert_eq!(components.performance_target.average, Some(7.0));
    assert_eq!(components.mybharat.count, 3);
    assert_eq!(components.dugwell.count, 1);
}

#[test]
fn narrative_summarizes_rank_marks_and_progress() {
    let source = full_source();
    let analysis = run_kpi_report(&source, "Bhopal", REPORT_DATE).expect("kpi analysis runs");

    let explanation = &analysis.explanation;
    assert!(explanation.contains("Rank 1/3."));
    assert!(explanation.contains("Improved by 1 from rank 2"));
    assert!(explanation.contains("Total Marks: 50.00."));
    assert!(explanation.contains("Change vs 2024-04-30: +5."));
    assert!(explanation.contains("State Context (3 districts):"));
    assert!(explanation.contains("Old Work (Completed): 5 (+1)."));
    assert!(explanation.contains("Farm Ponds: 10 (No change)."));
}

#[test]
fn component_fetch_failures_degrade_with_errors_and_notes() {
    let mut source = StaticSource::new();
    source.insert(
        "/report_jsm/farm-ponds-marks",
        &[("date", REPORT_DATE)],
        json!({"results": [
            {"name": "Bhopal", "marks": 20.0, "actual_count": 10},
        ]}),
    );

    let analysis = run_kpi_report(&source, "Bhopal", REPORT_DATE).expect("structure returned");

    assert_eq!(analysis.kpis.total_marks.current, Some(20.0));
    assert_eq!(analysis.kpis.total_marks.previous, None);
    assert_eq!(analysis.kpis.total_marks.change, None);
    assert_eq!(analysis.kpis.rank.current, Some(1));
    assert_eq!(analysis.kpis.rank.previous, None);
    assert_eq!(analysis.kpis.rank.change, None);

    let current_error = analysis
        .fetch_errors
        .current
        .as_ref()
        .expect("current fetch errors recorded");
    assert!(current_error.contains("dugwell"));
    assert!(current_error.contains("mybharat"));
    assert!(analysis.fetch_errors.previous.is_some());
    assert!(analysis
        .notes
        .iter()
        .any(|note| note.contains("missing for previous date")));
    assert!(analysis.explanation.contains("Note: Fetch errors occurred"));
}
