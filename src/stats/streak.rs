use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Longest and current runs of consecutive active days.
///
/// The current streak counts back from the most recent active day and is
/// non-zero only when that day is `as_of` or the day before it.
pub fn compute_streaks(days: &BTreeSet<NaiveDate>, as_of: NaiveDate) -> (u64, u64) {
    let Some(&last) = days.iter().next_back() else {
        return (0, 0);
    };

    let mut longest = 1u64;
    let mut run = 1u64;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        if let Some(p) = prev {
            if p.succ_opt() == Some(day) {
                run += 1;
            } else {
                longest = longest.max(run);
                run = 1;
            }
        }
        prev = Some(day);
    }
    longest = longest.max(run);

    let current = if last == as_of || as_of.pred_opt() == Some(last) {
        let mut count = 1u64;
        let mut cursor = last;
        for &day in days.iter().rev().skip(1) {
            if day.succ_opt() == Some(cursor) {
                count += 1;
                cursor = day;
            } else {
                break;
            }
        }
        count
    } else {
        0
    };

    (longest, current)
}
