use crate::models::leaderboard::Entry;
use std::cmp::Ordering;

/// A `timeUsed` of zero counts as not reported.
fn reported_time(entry: &Entry) -> Option<f64> {
    entry.time_used.filter(|t| *t != 0.0)
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Best-first ordering: higher score, then lower time when both entries
/// report one, then the more recent date.
pub fn compare(a: &Entry, b: &Entry) -> Ordering {
    desc(a.score, b.score)
        .then_with(|| match (reported_time(a), reported_time(b)) {
            (Some(ta), Some(tb)) => ta.partial_cmp(&tb).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        })
        .then_with(|| match (a.date, b.date) {
            (Some(da), Some(db)) => db.cmp(&da),
            _ => Ordering::Equal,
        })
}

/// Whether `candidate` should replace `existing` for the same name. A newer
/// date on its own does not count.
pub fn is_better(candidate: &Entry, existing: &Entry) -> bool {
    match desc(candidate.score, existing.score) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => match (reported_time(candidate), reported_time(existing)) {
            (Some(tc), Some(te)) => tc < te,
            _ => false,
        },
    }
}

/// Stable insertion sort by `compare`, following one index through the moves.
///
/// `compare` is not transitive once some entries lack a time (the time level
/// is skipped for those pairs only), and `slice::sort_by` may panic on such
/// orders. Insertion only ever inspects neighbours, so every adjacent pair in
/// the result still satisfies `compare(x, y) != Greater`.
pub fn sort_tracking(entries: &mut [Entry], mut tracked: Option<usize>) -> Option<usize> {
    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && compare(&entries[j], &entries[j - 1]) == Ordering::Less {
            entries.swap(j, j - 1);
            tracked = match tracked {
                Some(t) if t == j => Some(j - 1),
                Some(t) if t == j - 1 => Some(j),
                other => other,
            };
            j -= 1;
        }
    }
    tracked
}

/// Stable merge sort by `compare`, for lists of any length.
///
/// A merge only ever compares the two run heads, and the element it emits is
/// ordered against whichever head is next, so the adjacent-pair guarantee of
/// [`sort_tracking`] holds here too.
pub fn merge_sort(mut entries: Vec<Entry>) -> Vec<Entry> {
    if entries.len() <= 1 {
        return entries;
    }
    let right = entries.split_off(entries.len() / 2);
    merge(merge_sort(entries), merge_sort(right))
}

fn merge(left: Vec<Entry>, right: Vec<Entry>) -> Vec<Entry> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // ties go left to keep the sort stable
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged
}
