use std::collections::{HashMap, HashSet};
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use super::roster::{Alert, Roster, SlotAssignment, Workload};
use super::slot_utils::{availability_index, options_within, slot_demand};
use super::types::{Person, Slot};

/// Maximum shifts a person can reach through backfilling uncovered slots
pub const DEFAULT_WORKLOAD_CAP: u32 = 2;

/// Chooses among equally good candidates
pub trait TieBreak {
    /// Returns an index in `0..candidates`. Never called with zero candidates.
    fn pick(&mut self, candidates: usize) -> usize;
}

/// Uniform random tie breaking
pub struct RandomTieBreak<R> {
    rng: R,
}

impl RandomTieBreak<ThreadRng> {
    pub fn from_thread_rng() -> Self {
        Self { rng: rand::thread_rng() }
    }
}

impl RandomTieBreak<StdRng> {
    /// Reproducible layouts for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R: Rng> TieBreak for RandomTieBreak<R> {
    fn pick(&mut self, candidates: usize) -> usize {
        self.rng.gen_range(0..candidates)
    }
}

/// Always takes the first candidate
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl TieBreak for FirstCandidate {
    fn pick(&mut self, _candidates: usize) -> usize {
        0
    }
}

/// Two-pass greedy allocator.
///
/// Pass 1 gives every person with availability one shift, least flexible
/// people first, preferring slots nobody holds yet. Pass 2 backfills the
/// slots that are still empty, scarcest slot first, handing each one to the
/// least loaded eligible person below the workload cap. Nothing is ever
/// undone once assigned.
#[derive(Debug, Clone, Copy)]
pub struct Allocator {
    workload_cap: u32,
}

impl Default for Allocator {
    fn default() -> Self {
        Self { workload_cap: DEFAULT_WORKLOAD_CAP }
    }
}

impl Allocator {
    pub fn with_workload_cap(workload_cap: u32) -> Self {
        Self { workload_cap }
    }

    pub fn workload_cap(&self) -> u32 {
        self.workload_cap
    }

    /// Runs one allocation over `people`. Always returns a roster; slots
    /// nobody can take stay empty and people nobody can place are reported.
    pub fn allocate(&self, people: &[Person], universe: &[Slot], tie_break: &mut dyn TieBreak) -> Roster {
        let mut ctx = AllocationContext::new(people, universe);
        ctx.cover_everyone(tie_break);
        ctx.fill_uncovered(self.workload_cap, tie_break);
        ctx.into_roster()
    }
}

/// State of a single run. Built per call and consumed into the roster.
struct AllocationContext<'a> {
    people: &'a [Person],
    universe: Vec<Slot>,
    options: Vec<Vec<Slot>>,
    index: HashMap<Slot, Vec<usize>>,
    counters: Vec<u32>,
    assignments: HashMap<Slot, Vec<usize>>,
    alerts: Vec<Alert>,
}

impl<'a> AllocationContext<'a> {
    fn new(people: &'a [Person], universe: &[Slot]) -> Self {
        let mut seen = HashSet::new();
        let universe: Vec<Slot> = universe.iter().copied().filter(|s| seen.insert(*s)).collect();
        let options = options_within(people, &universe);
        let index = availability_index(&options);
        Self {
            people,
            universe,
            options,
            index,
            counters: vec![0; people.len()],
            assignments: HashMap::new(),
            alerts: Vec::new(),
        }
    }

    fn occupants(&self, slot: &Slot) -> usize {
        self.assignments.get(slot).map_or(0, Vec::len)
    }

    fn assign(&mut self, person: usize, slot: Slot) {
        self.assignments.entry(slot).or_default().push(person);
        self.counters[person] += 1;
        debug!(person = %self.people[person].name, slot = %slot, shifts = self.counters[person], "assigned");
    }

    /// Pass 1: one shift for everyone who has any availability
    fn cover_everyone(&mut self, tie_break: &mut dyn TieBreak) {
        let mut order: Vec<usize> = (0..self.people.len()).collect();
        order.sort_by_key(|&p| self.options[p].len());

        for person in order {
            let options = &self.options[person];
            if options.is_empty() {
                continue;
            }

            let free: Vec<Slot> = options.iter().copied().filter(|s| self.occupants(s) == 0).collect();
            let slot = if free.is_empty() {
                let slot = options[tie_break.pick(options.len())];
                let occupants = self.occupants(&slot);
                warn!(person = %self.people[person].name, slot = %slot, occupants, "no free slot left, doubling up");
                self.alerts.push(Alert::ForcedPlacement {
                    person: self.people[person].name.clone(),
                    slot,
                    occupants,
                });
                slot
            } else {
                free[tie_break.pick(free.len())]
            };
            self.assign(person, slot);
        }
    }

    /// Pass 2: backfill empty slots, scarcest first, least loaded person first
    fn fill_uncovered(&mut self, workload_cap: u32, tie_break: &mut dyn TieBreak) {
        let mut slots = self.universe.clone();
        slots.sort_by_key(|s| slot_demand(&self.index, s));

        for slot in slots {
            if self.occupants(&slot) > 0 {
                continue;
            }

            let candidates: Vec<usize> = self
                .index
                .get(&slot)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&p| self.counters[p] < workload_cap)
                .collect();
            let Some(least) = candidates.iter().map(|&p| self.counters[p]).min() else {
                debug!(slot = %slot, "no eligible candidate, leaving slot uncovered");
                continue;
            };

            let tied: Vec<usize> = candidates.into_iter().filter(|&p| self.counters[p] == least).collect();
            let person = tied[tie_break.pick(tied.len())];
            self.assign(person, slot);
        }
    }

    fn into_roster(mut self) -> Roster {
        let people = self.people;
        let names = |indices: Vec<usize>| -> Vec<String> {
            indices.into_iter().map(|p| people[p].name.clone()).collect()
        };

        let slots: Vec<SlotAssignment> = self
            .universe
            .iter()
            .map(|&slot| SlotAssignment {
                slot,
                people: names(self.assignments.remove(&slot).unwrap_or_default()),
            })
            .collect();

        let unassignable: Vec<usize> = (0..people.len()).filter(|&p| self.options[p].is_empty()).collect();
        let unplaced: Vec<usize> = (0..people.len())
            .filter(|&p| !self.options[p].is_empty() && self.counters[p] == 0)
            .collect();
        if !unplaced.is_empty() {
            self.alerts.push(Alert::Unplaced { people: unplaced.len() });
        }

        let workload: Vec<Workload> = people
            .iter()
            .zip(&self.counters)
            .map(|(p, &shifts)| Workload { name: p.name.clone(), shifts })
            .collect();

        let covered = slots.iter().filter(|a| !a.people.is_empty()).count();
        info!(
            people = people.len(),
            covered,
            slots = slots.len(),
            alerts = self.alerts.len(),
            unassignable = unassignable.len(),
            "allocation finished"
        );

        Roster {
            slots,
            workload,
            alerts: self.alerts,
            unassignable: names(unassignable),
            unplaced: names(unplaced),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{Day, HourBucket};
    use proptest::prelude::*;

    fn slot(s: &str) -> Slot {
        s.parse().unwrap()
    }

    fn run(people: &[Person], tie_break: &mut dyn TieBreak) -> Roster {
        Allocator::default().allocate(people, &Slot::universe(), tie_break)
    }

    /// Checks every run-level invariant the allocator promises
    fn assert_invariants(people: &[Person], roster: &Roster, cap: u32) {
        let by_name: HashMap<&str, &Person> = people.iter().map(|p| (p.name.as_str(), p)).collect();

        for assignment in &roster.slots {
            let unique: HashSet<&String> = assignment.people.iter().collect();
            assert_eq!(unique.len(), assignment.people.len(), "duplicate in {}", assignment.slot);
            for name in &assignment.people {
                assert!(by_name[name.as_str()].available.contains(&assignment.slot));
            }
        }

        for person in people {
            let held = roster.slots.iter().filter(|a| a.people.contains(&person.name)).count() as u32;
            let shifts = roster.shifts_of(&person.name).unwrap();
            assert_eq!(shifts, held);
            assert!(shifts <= cap.max(1));
            if person.available.is_empty() {
                assert_eq!(shifts, 0);
                assert!(roster.unassignable.contains(&person.name));
            } else {
                assert!(shifts >= 1, "{} left without a shift", person.name);
            }
        }

        for alert in &roster.alerts {
            if let Alert::ForcedPlacement { person, slot, occupants } = alert {
                assert!(*occupants >= 1);
                let position = roster.assigned(*slot).iter().position(|n| n == person).unwrap();
                assert!(position >= 1);
            }
        }

        // an uncovered slot means everyone who could take it was already at the cap
        for slot in roster.uncovered() {
            for person in people.iter().filter(|p| p.available.contains(&slot)) {
                assert_eq!(roster.shifts_of(&person.name), Some(cap));
            }
        }
    }

    #[test]
    fn constrained_person_is_served_first() {
        let people = vec![
            Person::new("A", [slot("segunda-feira_12h-13h")]),
            Person::new("B", [slot("segunda-feira_12h-13h"), slot("terça-feira_13h-14h")]),
            Person::new("C", []),
        ];

        for seed in 0..20 {
            let roster = run(&people, &mut RandomTieBreak::seeded(seed));
            assert_eq!(roster.assigned(slot("segunda-feira_12h-13h")), ["A"]);
            assert_eq!(roster.assigned(slot("terça-feira_13h-14h")), ["B"]);
            assert_eq!(roster.unassignable, ["C"]);
            assert!(roster.unplaced.is_empty());
            assert!(roster.alerts.is_empty());
            assert_eq!(roster.shifts_of("A"), Some(1));
            assert_eq!(roster.shifts_of("B"), Some(1));
            assert_eq!(roster.shifts_of("C"), Some(0));
            assert_invariants(&people, &roster, DEFAULT_WORKLOAD_CAP);
        }
    }

    #[test]
    fn no_people_leaves_every_slot_empty() {
        let roster = run(&[], &mut RandomTieBreak::seeded(7));
        assert_eq!(roster.slots.len(), 45);
        assert_eq!(roster.uncovered().count(), 45);
        assert!(roster.alerts.is_empty());
        assert!(roster.workload.is_empty());
    }

    #[test]
    fn shared_only_slot_produces_forced_placement() {
        let noon = slot("segunda-feira_12h-13h");
        let people = vec![Person::new("A", [noon]), Person::new("B", [noon])];
        let roster = run(&people, &mut FirstCandidate);

        assert_eq!(roster.assigned(noon), ["A", "B"]);
        assert_eq!(
            roster.alerts,
            vec![Alert::ForcedPlacement { person: "B".to_string(), slot: noon, occupants: 1 }]
        );
        assert_invariants(&people, &roster, DEFAULT_WORKLOAD_CAP);
    }

    #[test]
    fn backfill_respects_workload_cap() {
        let people = vec![Person::new("Solo", Slot::universe())];
        let roster = run(&people, &mut RandomTieBreak::seeded(3));

        assert_eq!(roster.shifts_of("Solo"), Some(2));
        assert_eq!(roster.uncovered().count(), 43);
        assert_invariants(&people, &roster, DEFAULT_WORKLOAD_CAP);
    }

    #[test]
    fn backfill_takes_scarce_slots_first() {
        let (m12, m13, m14) = (
            slot("segunda-feira_12h-13h"),
            slot("segunda-feira_13h-14h"),
            slot("segunda-feira_14h-15h"),
        );
        let people = vec![Person::new("X", [m12, m13, m14]), Person::new("Y", [m14])];
        let roster = run(&people, &mut FirstCandidate);

        // Y goes first in pass 1 and takes m14; X takes m12; the backfill
        // reaches m13 (one taker) before anything X shares with Y
        assert_eq!(roster.assigned(m14), ["Y"]);
        assert_eq!(roster.assigned(m12), ["X"]);
        assert_eq!(roster.assigned(m13), ["X"]);
        assert_eq!(roster.shifts_of("X"), Some(2));
    }

    #[test]
    fn backfill_prefers_least_loaded_candidate() {
        let s = |hour| Slot::new(Day::Monday, hour);
        let people = vec![
            Person::new("Q", [s(HourBucket::H13), s(HourBucket::H14), s(HourBucket::H15), s(HourBucket::H16)]),
            Person::new("P", [s(HourBucket::H12), s(HourBucket::H13), s(HourBucket::H14)]),
        ];
        let roster = Allocator::with_workload_cap(4).allocate(&people, &Slot::universe(), &mut FirstCandidate);

        // Q has three shifts by the time 14h-15h is backfilled, P has one
        assert_eq!(roster.assigned(s(HourBucket::H14)), ["P"]);
        assert_eq!(roster.shifts_of("Q"), Some(3));
        assert_eq!(roster.shifts_of("P"), Some(2));
    }

    #[test]
    fn availability_outside_universe_counts_as_none() {
        let people = vec![Person::new("Late", [slot("sexta-feira_20h-21h")])];
        let universe = [slot("segunda-feira_12h-13h")];
        let roster = Allocator::default().allocate(&people, &universe, &mut FirstCandidate);

        assert_eq!(roster.slots.len(), 1);
        assert_eq!(roster.unassignable, ["Late"]);
        assert_eq!(roster.shifts_of("Late"), Some(0));
    }

    #[test]
    fn repeated_runs_each_hold_invariants() {
        let universe = Slot::universe();
        let people: Vec<Person> = (0..12)
            .map(|i| Person::new(format!("P{i}"), universe.iter().copied().skip(i).step_by(5).take(3 + i % 4)))
            .collect();

        for _ in 0..10 {
            let roster = run(&people, &mut RandomTieBreak::from_thread_rng());
            assert_invariants(&people, &roster, DEFAULT_WORKLOAD_CAP);
        }
    }

    fn people_strategy() -> impl Strategy<Value = Vec<Person>> {
        prop::collection::vec(prop::collection::btree_set(0usize..45, 0..8), 0..15).prop_map(|rows| {
            let universe = Slot::universe();
            rows.into_iter()
                .enumerate()
                .map(|(i, idx)| Person::new(format!("person-{i}"), idx.into_iter().map(|j| universe[j])))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_availability(people in people_strategy(), seed in any::<u64>()) {
            let roster = run(&people, &mut RandomTieBreak::seeded(seed));
            assert_invariants(&people, &roster, DEFAULT_WORKLOAD_CAP);
            prop_assert_eq!(roster.slots.len(), 45);
            prop_assert!(roster.unplaced.is_empty());
        }
    }
}
