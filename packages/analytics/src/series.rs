//! Per-day event counts across categories.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use conflict_map_analytics_models::DateSeriesPoint;
use conflict_map_event_models::{EventCategory, EventRecord};

/// Aggregates two categories into a per-day count series.
///
/// Produces one point per day present in **either** input; the category with
/// no events that day reports `0`.
#[must_use]
pub fn aggregate_by_date<'a, A, B>(
    category_a: EventCategory,
    records_a: A,
    category_b: EventCategory,
    records_b: B,
) -> Vec<DateSeriesPoint>
where
    A: IntoIterator<Item = &'a EventRecord>,
    B: IntoIterator<Item = &'a EventRecord>,
{
    aggregate_categories_by_date([
        (
            category_a,
            records_a.into_iter().collect::<Vec<&'a EventRecord>>(),
        ),
        (category_b, records_b.into_iter().collect()),
    ])
}

/// Aggregates any number of categories into a per-day count series.
///
/// Every category passed in appears in every point, even a category with no
/// records at all. Points come out in ascending date order because grouping
/// is keyed by [`NaiveDate`], but chart consumers should still sort
/// explicitly (see [`crate::chart::prepare_chart`]).
///
/// Passing the same category twice merges both record sets under it.
#[must_use]
pub fn aggregate_categories_by_date<'a, C, R>(categories: C) -> Vec<DateSeriesPoint>
where
    C: IntoIterator<Item = (EventCategory, R)>,
    R: IntoIterator<Item = &'a EventRecord>,
{
    let mut by_day: BTreeMap<NaiveDate, BTreeMap<EventCategory, u64>> = BTreeMap::new();
    let mut seen_categories: Vec<EventCategory> = Vec::new();

    for (category, records) in categories {
        if !seen_categories.contains(&category) {
            seen_categories.push(category);
        }
        for record in records {
            *by_day
                .entry(record.event_date)
                .or_default()
                .entry(category)
                .or_insert(0) += 1;
        }
    }

    log::trace!(
        "Aggregated {} categories into {} days",
        seen_categories.len(),
        by_day.len()
    );

    by_day
        .into_iter()
        .map(|(day, mut counts)| {
            for category in &seen_categories {
                counts.entry(*category).or_insert(0);
            }
            DateSeriesPoint {
                date: day.format("%Y-%m-%d").to_string(),
                counts,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn record(id: &str, y: i32, m: u32, d: u32) -> EventRecord {
        EventRecord::new(id, 31.0, 48.0, NaiveDate::from_ymd_opt(y, m, d).unwrap(), 0)
    }

    #[test]
    fn disjoint_days_zero_fill() {
        let battles = vec![record("b1", 2023, 1, 1)];
        let explosions = vec![record("e1", 2023, 1, 2)];

        let series = aggregate_by_date(
            EventCategory::Battles,
            &battles,
            EventCategory::Explosions,
            &explosions,
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2023-01-01");
        assert_eq!(series[0].count(EventCategory::Battles), 1);
        assert_eq!(series[0].counts.get(&EventCategory::Explosions), Some(&0));
        assert_eq!(series[1].date, "2023-01-02");
        assert_eq!(series[1].counts.get(&EventCategory::Battles), Some(&0));
        assert_eq!(series[1].count(EventCategory::Explosions), 1);
    }

    #[test]
    fn one_row_per_union_date() {
        let battles = vec![
            record("b1", 2023, 3, 1),
            record("b2", 2023, 3, 1),
            record("b3", 2023, 3, 5),
        ];
        let explosions = vec![record("e1", 2023, 3, 5), record("e2", 2023, 2, 27)];

        let series = aggregate_by_date(
            EventCategory::Battles,
            &battles,
            EventCategory::Explosions,
            &explosions,
        );

        let dates: BTreeSet<&str> = series.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates.len(), series.len());
        assert_eq!(
            dates,
            BTreeSet::from(["2023-02-27", "2023-03-01", "2023-03-05"])
        );

        let march_first = series.iter().find(|p| p.date == "2023-03-01").unwrap();
        assert_eq!(march_first.count(EventCategory::Battles), 2);
        assert_eq!(march_first.count(EventCategory::Explosions), 0);

        let march_fifth = series.iter().find(|p| p.date == "2023-03-05").unwrap();
        assert_eq!(march_fifth.total(), 2);
    }

    #[test]
    fn both_empty_yields_empty_series() {
        let none: Vec<EventRecord> = Vec::new();
        let series = aggregate_by_date(
            EventCategory::Battles,
            &none,
            EventCategory::Explosions,
            &none,
        );
        assert!(series.is_empty());
    }

    #[test]
    fn empty_category_still_reported() {
        let battles = vec![record("b1", 2024, 1, 10)];
        let none: Vec<EventRecord> = Vec::new();
        let series = aggregate_by_date(
            EventCategory::Battles,
            &battles,
            EventCategory::Explosions,
            &none,
        );
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].counts.len(), 2);
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = vec![
            record("b1", 2023, 1, 3),
            record("b2", 2023, 1, 1),
            record("b3", 2023, 1, 2),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = aggregate_categories_by_date([(EventCategory::Battles, &forward)]);
        let b = aggregate_categories_by_date([(EventCategory::Battles, &reversed)]);
        assert_eq!(a, b);
    }
}
