use std::collections::{HashMap, HashSet};
use super::types::{Person, Slot};

/// Restricts each person's declared availability to the slots of `universe`.
/// Returned lists are in slot order, one per person, indexed like `people`.
pub fn options_within(people: &[Person], universe: &[Slot]) -> Vec<Vec<Slot>> {
    let known: HashSet<Slot> = universe.iter().copied().collect();
    people
        .iter()
        .map(|p| p.available.iter().copied().filter(|s| known.contains(s)).collect())
        .collect()
}

/// Builds the availability index: slot -> indices of the people who can work it.
/// Indices appear in input order.
pub fn availability_index(options: &[Vec<Slot>]) -> HashMap<Slot, Vec<usize>> {
    let mut index: HashMap<Slot, Vec<usize>> = HashMap::new();
    for (person, slots) in options.iter().enumerate() {
        for &slot in slots {
            index.entry(slot).or_default().push(person);
        }
    }
    index
}

/// Number of people who declared each slot (higher = more contested)
pub fn slot_demand(index: &HashMap<Slot, Vec<usize>>, slot: &Slot) -> usize {
    index.get(slot).map_or(0, Vec::len)
}
