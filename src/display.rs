use std::fs::File;
use std::io::Write;
use std::path::Path;
use serde::Serialize;

use crate::error::Result;
use crate::schedule::{Day, HourBucket, Roster, Slot};

/// Placeholder shown for a slot nobody covers
pub const EMPTY_CELL: &str = "—";

/// One row of the weekly grid: an hour bucket and the people on duty each day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub hour: &'static str,
    pub cells: Vec<String>,
}

/// Formats the people in one slot for a grid cell
pub fn format_cell(people: &[String]) -> String {
    if people.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        people.join(", ")
    }
}

/// Lays the roster out as hour rows by weekday columns
pub fn grid_rows(roster: &Roster) -> Vec<GridRow> {
    HourBucket::ALL
        .iter()
        .map(|&hour| GridRow {
            hour: hour.tag(),
            cells: Day::ALL
                .iter()
                .map(|&day| format_cell(roster.assigned(Slot::new(day, hour))))
                .collect(),
        })
        .collect()
}

/// Prints the grid, workload statistics and every notice from the run
pub fn print_roster(roster: &Roster) {
    println!("\n=== Escala ===");
    print!("{:<10}", "Horário");
    for day in Day::ALL {
        print!(" | {:<20}", day.tag());
    }
    println!();
    for row in grid_rows(roster) {
        print!("{:<10}", row.hour);
        for cell in &row.cells {
            print!(" | {:<20}", cell);
        }
        println!();
    }

    println!("\n=== Estatísticas ===");
    for w in roster.workload_by_load() {
        println!("  {:<30} {}", w.name, w.shifts);
    }

    if !roster.unassignable.is_empty() {
        println!(
            "\n🚫 Marcaram 'não posso' em todos os horários e não podem receber plantão: {}",
            roster.unassignable.join(", ")
        );
    }

    if !roster.alerts.is_empty() {
        println!("\n⚠️  Ajustes automáticos realizados:");
        for message in roster.alert_messages() {
            println!("  - {}", message);
        }
    }

    if !roster.unplaced.is_empty() {
        println!("\n🚨 Com disponibilidade mas sem plantão: {}", roster.unplaced.join(", "));
    }
}

/// Writes the grid to a plain text file, one line per slot: "<day> <hour> <people>"
pub fn write_roster_to_file<P: AsRef<Path>>(roster: &Roster, path: P) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "** Escala **")?;
    for assignment in &roster.slots {
        writeln!(file, "{} {}", assignment.slot.label(), format_cell(&assignment.people))?;
    }
    Ok(())
}
