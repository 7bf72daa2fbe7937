use std::cmp::Ordering;

/// Best and worst entries of a collection, as full records.
#[derive(Debug, Clone, Copy)]
pub struct Extrema<'a, T> {
    pub top: Option<&'a T>,
    pub bottom: Option<&'a T>,
}

/// Finds the top and bottom records by a numeric field. Records whose value
/// is not a finite number or whose name is empty are ignored; if nothing
/// remains, both sides are `None`. Ties resolve lexicographically by name,
/// so the result does not depend on upstream ordering.
pub fn find_extrema<'a, T, N, V>(
    records: &'a [T],
    name_of: N,
    value_of: V,
    higher_is_better: bool,
) -> Extrema<'a, T>
where
    N: Fn(&T) -> &str,
    V: Fn(&T) -> Option<f64>,
{
    let mut valid: Vec<(&T, f64)> = records
        .iter()
        .filter_map(|record| {
            if name_of(record).trim().is_empty() {
                return None;
            }
            let value = value_of(record).filter(|v| v.is_finite())?;
            Some((record, value))
        })
        .collect();

    if valid.is_empty() {
        return Extrema {
            top: None,
            bottom: None,
        };
    }

    valid.sort_by(|(a, a_value), (b, b_value)| {
        let by_value = b_value.partial_cmp(a_value).unwrap_or(Ordering::Equal);
        let by_value = if higher_is_better {
            by_value
        } else {
            by_value.reverse()
        };
        by_value.then_with(|| name_of(a).cmp(name_of(b)))
    });

    Extrema {
        top: valid.first().map(|(record, _)| *record),
        bottom: valid.last().map(|(record, _)| *record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Entry {
        name: &'static str,
        score: Option<f64>,
        count: i64,
    }

    fn entry(name: &'static str, score: Option<f64>, count: i64) -> Entry {
        Entry { name, score, count }
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("A", Some(18.5), 100),
            entry("B", Some(18.5), 80),
            entry("C", Some(12.0), 200),
        ]
    }

    #[test]
    fn extrema_return_full_records() {
        let entries = sample();
        let by_score = find_extrema(&entries, |e| e.name, |e| e.score, true);
        let top = by_score.top.expect("top by score");
        assert_eq!(top.name, "A");
        assert_eq!(top.count, 100);
        assert_eq!(by_score.bottom.expect("bottom by score").name, "C");

        let by_count = find_extrema(&entries, |e| e.name, |e| Some(e.count as f64), true);
        assert_eq!(by_count.top.expect("top by count").name, "C");
        assert_eq!(by_count.bottom.expect("bottom by count").name, "B");
    }

    #[test]
    fn ties_resolve_by_name_not_input_order() {
        let mut entries = sample();
        entries.reverse();
        let by_score = find_extrema(&entries, |e| e.name, |e| e.score, true);
        assert_eq!(by_score.top.expect("top").name, "A");
    }

    #[test]
    fn lower_is_better_flips_the_ordering() {
        let entries = sample();
        let extrema = find_extrema(&entries, |e| e.name, |e| e.score, false);
        assert_eq!(extrema.top.expect("top").name, "C");
        assert_eq!(extrema.bottom.expect("bottom").name, "B");
    }

    #[test]
    fn unusable_records_are_skipped_entirely() {
        let entries = vec![
            entry("", Some(99.0), 1),
            entry("X", None, 1),
            entry("Y", Some(f64::NAN), 1),
        ];
        let extrema = find_extrema(&entries, |e| e.name, |e| e.score, true);
        assert!(extrema.top.is_none());
        assert!(extrema.bottom.is_none());
    }
}
