use crate::chain::types::OptionRecord;

/// Upper bound on the strike window, enforced at the HTTP boundary.
/// The selector itself happily returns fewer rows than asked for.
pub const MAX_WINDOW_SIZE: usize = 30;

/// Select a window of `window_size` rows centered on `threshold`.
///
/// The input is sorted ascending by strike (stable, so duplicate strikes keep
/// their source order) and split at the threshold: rows at or below it on one
/// side, rows strictly above on the other. The low side contributes its last
/// `window_size / 2` rows, the high side its first `window_size / 2` rows --
/// plus one more when `window_size` is odd, so the leftover slot always lands
/// above the threshold.
///
/// When the low side cannot fill its half, the high side absorbs the entire
/// remaining budget (`window_size - low.len()`), not just its own half. Either
/// side running dry simply shortens the result; there is no padding.
///
/// Pure function: deterministic from inputs.
pub fn select_window(
    records: &[OptionRecord],
    threshold: f64,
    window_size: usize,
) -> Vec<OptionRecord> {
    if window_size == 0 || records.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<OptionRecord> = records.to_vec();
    sorted.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    let split = sorted.partition_point(|r| r.strike <= threshold);
    let (low, high) = sorted.split_at(split);

    let half = window_size / 2;

    let (smaller, greater) = if low.len() >= half {
        let k = if window_size % 2 == 0 { half } else { half + 1 };
        (&low[low.len() - half..], &high[..k.min(high.len())])
    } else {
        let budget = window_size - low.len();
        (low, &high[..budget.min(high.len())])
    };

    let mut window = Vec::with_capacity(smaller.len() + greater.len());
    window.extend_from_slice(smaller);
    window.extend_from_slice(greater);
    window
}
