pub mod types;
pub mod slot_utils;
pub mod roster;
pub mod allocator;

pub use types::{Day, HourBucket, Person, Slot};
pub use roster::{Alert, Roster, SlotAssignment, Workload};
pub use allocator::{Allocator, FirstCandidate, RandomTieBreak, TieBreak, DEFAULT_WORKLOAD_CAP};
