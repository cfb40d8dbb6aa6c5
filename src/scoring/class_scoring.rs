//! Standings within each vehicle class.
//!
//! Computed in one pass over the field in place order, the first time any
//! per-class value is asked for in a tick.

use std::collections::HashMap;

use crate::registry::ClassId;

/// Input row: one vehicle, in place order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClassEntry {
    /// Index into the scoring record's vehicle list
    pub index: usize,
    pub class_id: ClassId,
    pub time_behind_leader: f32,
    pub laps_behind_leader: i32,
}

/// Class-relative values of one vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassStanding {
    /// 1-based place within the class
    pub place: i16,
    pub vehicles_in_class: i32,
    /// Vehicle index of the class leader
    pub leader: usize,
    pub next_in_front: Option<usize>,
    pub next_behind: Option<usize>,
    pub time_behind_next: f32,
    pub laps_behind_next: i32,
    pub time_behind_leader: f32,
    pub laps_behind_leader: i32,
}

/// Standings indexed like the vehicle list. `len` is the number of vehicles.
pub(crate) fn compute(by_place: &[ClassEntry], len: usize) -> Vec<ClassStanding> {
    let mut standings = vec![ClassStanding::default(); len];
    let mut counts: HashMap<ClassId, i32> = HashMap::new();
    let mut leaders: HashMap<ClassId, ClassEntry> = HashMap::new();
    let mut last_seen: HashMap<ClassId, ClassEntry> = HashMap::new();

    for entry in by_place {
        let count = counts.entry(entry.class_id).or_insert(0);
        *count += 1;
        let leader = *leaders.entry(entry.class_id).or_insert(*entry);

        let standing = &mut standings[entry.index];
        standing.place = *count as i16;
        standing.leader = leader.index;
        standing.time_behind_leader = entry.time_behind_leader - leader.time_behind_leader;
        standing.laps_behind_leader = entry.laps_behind_leader - leader.laps_behind_leader;

        if let Some(front) = last_seen.insert(entry.class_id, *entry) {
            standing.next_in_front = Some(front.index);
            standing.time_behind_next = entry.time_behind_leader - front.time_behind_leader;
            standing.laps_behind_next = entry.laps_behind_leader - front.laps_behind_leader;
            standings[front.index].next_behind = Some(entry.index);
        }
    }

    for entry in by_place {
        standings[entry.index].vehicles_in_class = counts.get(&entry.class_id).copied().unwrap_or(0);
    }

    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(index: usize, class: u32, gap: f32, laps: i32) -> ClassEntry {
        ClassEntry { index, class_id: ClassId(class), time_behind_leader: gap, laps_behind_leader: laps }
    }

    #[test]
    fn two_interleaved_classes() {
        // Vehicle indices deliberately differ from place order.
        let field = [
            entry(2, 1, 0.0, 0),
            entry(0, 2, 1.5, 0),
            entry(3, 1, 4.0, 0),
            entry(1, 2, 9.0, 1),
        ];
        let standings = compute(&field, 4);

        assert_eq!(standings[2].place, 1);
        assert_eq!(standings[3].place, 2);
        assert_eq!(standings[0].place, 1);
        assert_eq!(standings[1].place, 2);

        assert_eq!(standings[3].leader, 2);
        assert_eq!(standings[3].next_in_front, Some(2));
        assert_eq!(standings[2].next_behind, Some(3));
        assert_eq!(standings[2].next_in_front, None);
        assert_eq!(standings[3].time_behind_leader, 4.0);

        assert_eq!(standings[1].leader, 0);
        assert_eq!(standings[1].time_behind_leader, 7.5);
        assert_eq!(standings[1].laps_behind_leader, 1);
        assert_eq!(standings[1].time_behind_next, 7.5);
        assert!(standings.iter().all(|s| s.vehicles_in_class == 2));
    }

    mod property_tests {
        use super::*;

        proptest! {
            #[test]
            fn places_are_dense_per_class(classes in prop::collection::vec(1u32..4, 1..30)) {
                let field: Vec<ClassEntry> = classes
                    .iter()
                    .enumerate()
                    .map(|(i, c)| entry(i, *c, i as f32, 0))
                    .collect();
                let standings = compute(&field, field.len());

                for class in 1u32..4 {
                    let mut places: Vec<i16> = field
                        .iter()
                        .filter(|e| e.class_id == ClassId(class))
                        .map(|e| standings[e.index].place)
                        .collect();
                    places.sort_unstable();
                    let expected: Vec<i16> = (1..=places.len() as i16).collect();
                    prop_assert_eq!(places, expected);
                }

                for e in &field {
                    let s = standings[e.index];
                    prop_assert!(s.time_behind_leader >= 0.0);
                    prop_assert_eq!(s.place == 1, s.next_in_front.is_none());
                }
            }
        }
    }
}
