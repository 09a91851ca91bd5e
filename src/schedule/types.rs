use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Serializer};

/// Weekdays covered by the roster, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Tag used in slot identifiers and rendered column headers
    pub fn tag(self) -> &'static str {
        match self {
            Day::Monday => "segunda-feira",
            Day::Tuesday => "terça-feira",
            Day::Wednesday => "quarta-feira",
            Day::Thursday => "quinta-feira",
            Day::Friday => "sexta-feira",
        }
    }

    /// Keyword identifying the day's column in the availability form
    pub fn form_keyword(self) -> &'static str {
        match self {
            Day::Monday => "segunda",
            Day::Tuesday => "terça",
            Day::Wednesday => "quarta",
            Day::Thursday => "quinta",
            Day::Friday => "sexta",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Day> {
        Day::ALL.into_iter().find(|d| d.tag() == tag)
    }
}

/// One-hour buckets from 12:00 to 21:00
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HourBucket {
    H12,
    H13,
    H14,
    H15,
    H16,
    H17,
    H18,
    H19,
    H20,
}

impl HourBucket {
    pub const ALL: [HourBucket; 9] = [
        HourBucket::H12,
        HourBucket::H13,
        HourBucket::H14,
        HourBucket::H15,
        HourBucket::H16,
        HourBucket::H17,
        HourBucket::H18,
        HourBucket::H19,
        HourBucket::H20,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            HourBucket::H12 => "12h-13h",
            HourBucket::H13 => "13h-14h",
            HourBucket::H14 => "14h-15h",
            HourBucket::H15 => "15h-16h",
            HourBucket::H16 => "16h-17h",
            HourBucket::H17 => "17h-18h",
            HourBucket::H18 => "18h-19h",
            HourBucket::H19 => "19h-20h",
            HourBucket::H20 => "20h-21h",
        }
    }

    /// Parses an hour tag as written in the form.
    /// The form spells the last bucket "20h-21", so that spelling is accepted too.
    pub fn from_tag(tag: &str) -> Option<HourBucket> {
        if tag == "20h-21" {
            return Some(HourBucket::H20);
        }
        HourBucket::ALL.into_iter().find(|h| h.tag() == tag)
    }
}

/// A (day, hour bucket) pair: one schedulable shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub day: Day,
    pub hour: HourBucket,
}

impl Slot {
    pub fn new(day: Day, hour: HourBucket) -> Self {
        Self { day, hour }
    }

    /// All 45 slots in canonical order: day by day, each day from 12h to 21h.
    /// This is the only source of enumeration order for rosters and grids.
    pub fn universe() -> Vec<Slot> {
        Day::ALL
            .iter()
            .flat_map(|&day| HourBucket::ALL.iter().map(move |&hour| Slot::new(day, hour)))
            .collect()
    }

    /// Human-readable label, e.g. "segunda-feira 12h-13h"
    pub fn label(&self) -> String {
        format!("{} {}", self.day.tag(), self.hour.tag())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.day.tag(), self.hour.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSlot(pub String);

impl fmt::Display for InvalidSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "horário inválido '{}'", self.0)
    }
}

impl std::error::Error for InvalidSlot {}

impl FromStr for Slot {
    type Err = InvalidSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, hour) = s.split_once('_').ok_or_else(|| InvalidSlot(s.to_string()))?;
        match (Day::from_tag(day), HourBucket::from_tag(hour)) {
            (Some(day), Some(hour)) => Ok(Slot::new(day, hour)),
            _ => Err(InvalidSlot(s.to_string())),
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A person and the slots they declared they can work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub available: BTreeSet<Slot>,
}

impl Person {
    pub fn new(name: impl Into<String>, available: impl IntoIterator<Item = Slot>) -> Self {
        Self {
            name: name.into(),
            available: available.into_iter().collect(),
        }
    }
}
