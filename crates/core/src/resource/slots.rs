use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use super::time::format_clock_time;

/// Computes the selectable start times of a day window.
///
/// The grid starts at `start` and advances by `increment_minutes` while the
/// candidate is `<= end`. A candidate that would wrap past midnight ends the
/// sequence. A zero increment yields only `start`.
pub fn time_slots(start: NaiveTime, end: NaiveTime, increment_minutes: u32) -> Vec<NaiveTime> {
    let anchor = NaiveDate::default();
    let mut slots = vec![start];
    if increment_minutes == 0 {
        return slots;
    }

    let step = TimeDelta::minutes(i64::from(increment_minutes));
    let end = NaiveDateTime::new(anchor, end);
    let mut current = NaiveDateTime::new(anchor, start);

    loop {
        let next = current + step;
        if next.date() != anchor || next > end {
            break;
        }
        slots.push(next.time());
        current = next;
    }

    slots
}

/// Formats a slot grid as `hh:mm AM/PM` strings.
pub fn format_time_slots(slots: &[NaiveTime]) -> Vec<String> {
    slots.iter().copied().map(format_clock_time).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_midnight_window_of_two_slots() {
        let slots = time_slots(hm(0, 0), hm(0, 30), 30);
        assert_eq!(format_time_slots(&slots), vec!["12:00 AM", "12:30 AM"]);
    }

    #[test]
    fn test_end_is_inclusive() {
        let slots = time_slots(hm(9, 0), hm(10, 0), 20);
        assert_eq!(slots, vec![hm(9, 0), hm(9, 20), hm(9, 40), hm(10, 0)]);
    }

    #[test]
    fn test_equal_start_and_end() {
        assert_eq!(time_slots(hm(8, 0), hm(8, 0), 15), vec![hm(8, 0)]);
    }

    #[test]
    fn test_increment_larger_than_window() {
        assert_eq!(time_slots(hm(8, 0), hm(8, 30), 45), vec![hm(8, 0)]);
    }

    #[test]
    fn test_zero_increment() {
        assert_eq!(time_slots(hm(8, 0), hm(18, 0), 0), vec![hm(8, 0)]);
    }

    #[test]
    fn test_stops_before_midnight_wrap() {
        let slots = time_slots(hm(22, 0), hm(23, 59), 60);
        assert_eq!(slots, vec![hm(22, 0), hm(23, 0)]);
    }

    #[test]
    fn test_full_day_is_strictly_increasing() {
        let start = hm(0, 0);
        let end = hm(23, 59);
        let slots = time_slots(start, end, 30);

        assert_eq!(slots.len(), 48);
        assert_eq!(slots.first(), Some(&start));
        assert!(slots.last().is_some_and(|last| *last <= end));
        assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
