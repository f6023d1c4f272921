//! Bounded edit distance for the re-detection gate.

/// Levenshtein distance between `a` and `b` over chars, or `None` once it
/// is known to exceed `max`.
///
/// Only a diagonal band of width `2 * max + 1` is computed, so the cost is
/// `O(max * len)` rather than `O(len²)` for large blocks.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    const OUT: usize = usize::MAX / 2;
    let mut prev = vec![OUT; b.len() + 1];
    let mut curr = vec![OUT; b.len() + 1];
    for (j, cell) in prev.iter_mut().enumerate().take(max.min(b.len()) + 1) {
        *cell = j;
    }

    for i in 1..=a.len() {
        let lo = i.saturating_sub(max).max(1);
        let hi = (i + max).min(b.len());
        curr.fill(OUT);
        if i <= max {
            curr[0] = i;
        }
        let mut row_min = curr[0];
        for j in lo..=hi {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let value = (prev[j - 1] + cost).min(prev[j] + 1).min(curr[j - 1] + 1);
            curr[j] = value;
            row_min = row_min.min(value);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}
