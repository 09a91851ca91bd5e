use std::fmt;
use serde::Serialize;
use super::types::Slot;

/// People placed in one slot, in the order they joined it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    pub slot: Slot,
    pub people: Vec<String>,
}

/// Final shift count for one person
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workload {
    pub name: String,
    pub shifts: u32,
}

/// Notable allocation decisions, kept in the order they were made
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// Every slot the person can work was already taken, so they were
    /// doubled up in one of them. `occupants` is the count before they joined.
    ForcedPlacement {
        person: String,
        slot: Slot,
        occupants: usize,
    },
    /// At least one person with availability ended the run with no shift
    Unplaced { people: usize },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::ForcedPlacement { person, slot, .. } => write!(
                f,
                "{} foi escalado em {} porque era o único horário disponível",
                person,
                slot.label()
            ),
            Alert::Unplaced { .. } => write!(
                f,
                "Algumas pessoas ficaram sem plantão porque todos os horários possíveis já estavam ocupados"
            ),
        }
    }
}

/// Output of one allocation run
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    /// One entry per universe slot, in universe order
    pub slots: Vec<SlotAssignment>,
    /// One entry per input person, in input order
    pub workload: Vec<Workload>,
    pub alerts: Vec<Alert>,
    /// People who declared no availability at all
    pub unassignable: Vec<String>,
    /// People who declared availability but received no shift
    pub unplaced: Vec<String>,
}

impl Roster {
    /// People assigned to `slot`, empty if the slot is uncovered or not in the universe
    pub fn assigned(&self, slot: Slot) -> &[String] {
        self.slots
            .iter()
            .find(|a| a.slot == slot)
            .map(|a| a.people.as_slice())
            .unwrap_or(&[])
    }

    pub fn shifts_of(&self, name: &str) -> Option<u32> {
        self.workload.iter().find(|w| w.name == name).map(|w| w.shifts)
    }

    pub fn uncovered(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.iter().filter(|a| a.people.is_empty()).map(|a| a.slot)
    }

    /// Workload sorted by shift count, busiest first. Ties keep input order.
    pub fn workload_by_load(&self) -> Vec<&Workload> {
        let mut sorted: Vec<&Workload> = self.workload.iter().collect();
        sorted.sort_by(|a, b| b.shifts.cmp(&a.shifts));
        sorted
    }

    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts.iter().map(|a| a.to_string()).collect()
    }
}
