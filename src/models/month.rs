// file: src/models/month.rs
use super::event::CalendarEvent;
use chrono::Month;

/// Calendar months in display order.
pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

pub fn month_from_index(index: usize) -> Option<Month> {
    MONTHS.get(index).copied()
}

pub fn month_index(month: Month) -> usize {
    month.number_from_month() as usize - 1
}

/// Accepts only the twelve canonical English long names, ignoring case.
pub fn parse_month_name(name: &str) -> Option<Month> {
    let name = name.trim();
    MONTHS
        .iter()
        .copied()
        .find(|m| m.name().eq_ignore_ascii_case(name))
}

/// Twelve buckets of events, one per calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyEvents {
    buckets: [Vec<CalendarEvent>; 12],
}

impl MonthlyEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_buckets(buckets: [Vec<CalendarEvent>; 12]) -> Self {
        Self { buckets }
    }

    pub fn get(&self, month: Month) -> &[CalendarEvent] {
        &self.buckets[month_index(month)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, &[CalendarEvent])> + '_ {
        MONTHS
            .iter()
            .zip(self.buckets.iter())
            .map(|(m, events)| (*m, events.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn counts(&self) -> [usize; 12] {
        let mut counts = [0; 12];
        for (slot, bucket) in counts.iter_mut().zip(self.buckets.iter()) {
            *slot = bucket.len();
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_name_canonical_only() {
        assert_eq!(parse_month_name("March"), Some(Month::March));
        assert_eq!(parse_month_name("december"), Some(Month::December));
        assert_eq!(parse_month_name(" JULY "), Some(Month::July));
        assert_eq!(parse_month_name("Mar"), None);
        assert_eq!(parse_month_name("Marzo"), None);
        assert_eq!(parse_month_name(""), None);
    }

    #[test]
    fn test_month_index_round_trip() {
        for (i, month) in MONTHS.iter().enumerate() {
            assert_eq!(month_index(*month), i);
            assert_eq!(month_from_index(i), Some(*month));
        }
        assert_eq!(month_from_index(12), None);
    }

    #[test]
    fn test_empty_buckets() {
        let monthly = MonthlyEvents::new();
        assert!(monthly.is_empty());
        assert_eq!(monthly.iter().count(), 12);
        assert_eq!(monthly.iter().next().map(|(m, _)| m.name()), Some("January"));
    }
}
