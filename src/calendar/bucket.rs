// Month bucketing. The month comes straight from the start date's numeric
// month, so the result never depends on the process locale.

use crate::models::{CalendarEvent, MonthlyEvents};

/// Groups events into twelve buckets and sorts each by start (stable).
pub fn bucket_events(events: Vec<CalendarEvent>) -> MonthlyEvents {
    let mut buckets: [Vec<CalendarEvent>; 12] = Default::default();

    for event in events {
        let index = event.month_index();
        buckets[index].push(event);
    }

    for bucket in buckets.iter_mut() {
        // sort_by is stable: equal starts keep input order
        bucket.sort_by(|a, b| a.start.cmp(&b.start));
    }

    MonthlyEvents::from_buckets(buckets)
}
