use std::cmp::Ordering;
use std::collections::HashMap;

/// Competition-style ranking over scored entities, descending by score.
///
/// Entities without a usable score are excluded entirely rather than ranked
/// last. Equal scores share a rank and the next distinct score advances by
/// the size of the tie group, so `[10, 10, 8]` ranks as `[1, 1, 3]`.
pub fn competition_ranks(scored: &[(String, Option<f64>)]) -> HashMap<String, u32> {
    let mut valid: Vec<(&str, f64)> = scored
        .iter()
        .filter_map(|(name, score)| {
            let score = (*score)?;
            score.is_finite().then_some((name.as_str(), score))
        })
        .collect();

    valid.sort_by(|(a_name, a_score), (b_name, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_name.cmp(b_name))
    });

    let mut ranks = HashMap::with_capacity(valid.len());
    let mut current_rank = 0u32;
    let mut tied_at_current = 0u32;
    let mut last_score: Option<f64> = None;

    for (name, score) in valid {
        if last_score == Some(score) {
            tied_at_current += 1;
        } else {
            current_rank += tied_at_current;
            tied_at_current = 1;
            last_score = Some(score);
        }
        ranks.insert(name.to_string(), current_rank + 1);
    }

    ranks
}
