use super::access::{convert_f64, convert_i64, safe_get};
use super::domain::{
    Achievement, CategoryDetail, ComponentRecord, FieldMap, FinancialProgress, OldWorksRecord,
    Target, WorkCategory,
};
use super::round2;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

const LAKH: f64 = 100_000.0;

/// Entity identity: trimmed, upper-cased. Records without a usable name are
/// rejected outright so nothing anonymous enters a downstream list.
pub fn normalize_entity_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

fn extract_name(raw: &Value, name_key: &str) -> Option<String> {
    let name = safe_get(raw, &[name_key])?.as_str()?;
    normalize_entity_name(name)
}

/// Converts one raw entry from a component endpoint into the canonical
/// record shape. `None` when the name is missing or empty; numeric fields
/// fall back to zero, the target keeps its "N/A" sentinel when absent.
pub fn normalize_record(raw: &Value, fields: &FieldMap) -> Option<ComponentRecord> {
    let name = match extract_name(raw, fields.name_key) {
        Some(name) => name,
        None => {
            warn!(name_key = fields.name_key, "skipping record without a usable name");
            return None;
        }
    };

    Some(ComponentRecord {
        name,
        count: convert_i64(safe_get(raw, &[fields.count_key]), 0),
        score: round2(convert_f64(safe_get(raw, &[fields.score_key]), 0.0)),
        target: Target::from_raw(safe_get(raw, &[fields.target_key])),
        achievement_percentage: Achievement::from_raw(safe_get(raw, &[fields.achievement_key])),
    })
}

/// Converts one raw entry from the performance endpoint into an old works
/// record, accumulating the two distinct counts: works relevant to the
/// scoring period (from `category_counts`) and total completed works
/// (summed from the per-category `completed` fields).
pub fn normalize_old_works(raw: &Value) -> Option<OldWorksRecord> {
    let name = match extract_name(raw, "name") {
        Some(name) => name,
        None => {
            warn!("skipping performance record without a usable name");
            return None;
        }
    };

    let target_marks = round2(convert_f64(safe_get(raw, &["target_marks"]), 0.0));
    let payment_marks = round2(convert_f64(safe_get(raw, &["payment_marks"]), 0.0));

    let financial_progress = FinancialProgress {
        baseline_pending_lakhs: round2(
            convert_f64(safe_get(raw, &["payment_details", "baseline_pending_for_calc"]), 0.0)
                / LAKH,
        ),
        current_pending_lakhs: round2(
            convert_f64(safe_get(raw, &["payment_details", "current_pending"]), 0.0) / LAKH,
        ),
        reduction_percentage: round2(convert_f64(
            safe_get(raw, &["payment_details", "reduction_percentage"]),
            0.0,
        )),
        marks: payment_marks,
    };

    let mut work_types = BTreeMap::new();
    let mut relevant_work_count = 0;
    let mut total_work_completed = 0;

    for category in WorkCategory::ordered() {
        let label = category.label();
        relevant_work_count += convert_i64(safe_get(raw, &["category_counts", label]), 0);

        let detail_raw = safe_get(raw, &["categories", label]);
        let detail = match detail_raw {
            Some(detail_raw) => CategoryDetail {
                target: Target::from_raw(safe_get(detail_raw, &["target"])),
                completed: convert_i64(safe_get(detail_raw, &["completed"]), 0),
                achievement_percentage: Achievement::from_raw(safe_get(
                    detail_raw,
                    &["achievement_percentage"],
                )),
                marks: round2(convert_f64(safe_get(detail_raw, &["marks"]), 0.0)),
            },
            None => CategoryDetail::default(),
        };
        total_work_completed += detail.completed;
        work_types.insert(category, detail);
    }

    Some(OldWorksRecord {
        name,
        overall_score: round2(target_marks + payment_marks),
        relevant_work_count,
        total_work_completed,
        target_achievement_marks: target_marks,
        payment_marks,
        financial_progress,
        work_types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::Component;
    use serde_json::json;

    fn farm_ponds_fields() -> FieldMap {
        Component::FarmPonds
            .field_map()
            .expect("farm ponds has a field map")
    }

    #[test]
    fn normalizes_a_well_formed_record() {
        let raw = json!({
            "name": "  Bhopal ",
            "actual_count": "120",
            "marks": 17.456,
            "target": 150,
            "achievement_percentage": 80.0,
        });
        let record = normalize_record(&raw, &farm_ponds_fields()).expect("record accepted");
        assert_eq!(record.name, "BHOPAL");
        assert_eq!(record.count, 120);
        assert_eq!(record.score, 17.46);
        assert_eq!(record.target, Target::Count(150));
        assert_eq!(record.achievement_percentage, Achievement::Percent(80.0));
    }

    #[test]
    fn rejects_records_without_names() {
        let fields = farm_ponds_fields();
        assert!(normalize_record(&json!({"marks": 3.0}), &fields).is_none());
        assert!(normalize_record(&json!({"name": "   "}), &fields).is_none());
        assert!(normalize_record(&json!({"name": 42}), &fields).is_none());
    }

    #[test]
    fn missing_numerics_default_without_losing_sentinels() {
        let raw = json!({"name": "SEHORE"});
        let record = normalize_record(&raw, &farm_ponds_fields()).expect("record accepted");
        assert_eq!(record.count, 0);
        assert_eq!(record.score, 0.0);
        assert_eq!(record.target, Target::NotAvailable);
        assert_eq!(record.achievement_percentage, Achievement::NotAvailable);
    }

    #[test]
    fn unbounded_achievement_survives_normalization() {
        let raw = json!({"name": "DATIA", "achievement_percentage": "inf"});
        let record = normalize_record(&raw, &farm_ponds_fields()).expect("record accepted");
        assert_eq!(record.achievement_percentage, Achievement::Unbounded);
    }

    #[test]
    fn old_works_keeps_both_counts_distinct() {
        let raw = json!({
            "name": "Vidisha",
            "target_marks": 11.2,
            "payment_marks": 4.3,
            "payment_details": {
                "baseline_pending_for_calc": 2_500_000.0,
                "current_pending": 1_000_000.0,
                "reduction_percentage": 60.0,
            },
            "category_counts": {"Talab Nirman": 10, "Khet Talab": 5},
            "categories": {
                "Talab Nirman": {"target": 20, "completed": 8, "marks": 2.5},
                "Khet Talab": {"target": 10, "completed": 4, "marks": 1.0},
            },
        });

        let record = normalize_old_works(&raw).expect("record accepted");
        assert_eq!(record.name, "VIDISHA");
        assert_eq!(record.overall_score, 15.5);
        assert_eq!(record.relevant_work_count, 15);
        assert_eq!(record.total_work_completed, 12);
        assert_eq!(record.financial_progress.baseline_pending_lakhs, 25.0);
        assert_eq!(record.financial_progress.current_pending_lakhs, 10.0);
        assert_eq!(record.work_types.len(), 7);
        let talab = &record.work_types[&WorkCategory::TalabNirman];
        assert_eq!(talab.completed, 8);
        assert_eq!(talab.target, Target::Count(20));
        let untouched = &record.work_types[&WorkCategory::RechargePit];
        assert_eq!(untouched.completed, 0);
        assert_eq!(untouched.target, Target::NotAvailable);
    }
}
