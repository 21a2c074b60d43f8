//! Ordering of scored sites.

/// Sort descending by composite score. The sort is stable, so sites with
/// equal scores keep their input order.
pub fn rank_by<T, F>(items: &mut [T], composite: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| composite(b).total_cmp(&composite(a)));
}
