//! Property-based tests for event ids and roster counts

use proptest::prelude::*;

use eventlog_pro::shared::{next_event_id, EventId, EventRecord};

proptest! {
    #[test]
    fn test_next_id_is_above_every_id_of_the_year(
        year in 2000i32..2100,
        sequences in prop::collection::vec(1u32..999, 0..20),
        other_years in prop::collection::vec(1u32..999, 0..5),
    ) {
        let mut ids: Vec<EventId> = sequences.iter().map(|&s| EventId::new(year, s)).collect();
        ids.extend(other_years.iter().map(|&s| EventId::new(year + 1, s)));
        ids.push(EventId::from_raw("not-an-id"));

        let next = next_event_id(year, &ids);
        prop_assert_eq!(next.year(), Some(year));
        let highest = sequences.iter().copied().max().unwrap_or(0);
        prop_assert_eq!(next.sequence(), Some(highest + 1));
        prop_assert!(!ids.contains(&next));
    }

    #[test]
    fn test_teacher_count_matches_named_segments(
        names in prop::collection::vec("[A-Za-z]{0,8}", 0..8),
        pad in "[ ]{0,2}",
    ) {
        let accompanying = names
            .iter()
            .map(|name| format!("{}{}{}", pad, name, pad))
            .collect::<Vec<_>>()
            .join(",");
        let record = EventRecord {
            accompanying,
            ..EventRecord::default()
        };
        let expected = names.iter().filter(|name| !name.is_empty()).count();
        prop_assert_eq!(record.teacher_count(), expected);
        prop_assert_eq!(record.summary().total_people, expected);
    }
}
