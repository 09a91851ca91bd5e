use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::display::grid_rows;
use crate::error::Result;
use crate::schedule::{Day, Roster};

/// File name of the exported workbook
pub const WORKBOOK_FILE: &str = "escala_axis.xlsx";
/// Worksheet holding the hour-by-day grid
pub const SCHEDULE_SHEET: &str = "Escala";
/// Worksheet holding per-person shift counts
pub const STATS_SHEET: &str = "Estatisticas";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Builds the two-sheet workbook: the grid, then shift counts busiest first
pub fn build_workbook(roster: &Roster) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let schedule = workbook.add_worksheet().set_name(SCHEDULE_SHEET)?;
    schedule.set_column_width(0, 12.0)?;
    schedule.write_string_with_format(0, 0, "Horário", &header)?;
    for (col, day) in Day::ALL.iter().enumerate() {
        let col = col as u16 + 1;
        schedule.set_column_width(col, 24.0)?;
        schedule.write_string_with_format(0, col, day.tag(), &header)?;
    }
    for (i, row) in grid_rows(roster).into_iter().enumerate() {
        let r = i as u32 + 1;
        schedule.write_string(r, 0, row.hour)?;
        for (c, cell) in row.cells.iter().enumerate() {
            schedule.write_string(r, c as u16 + 1, cell.as_str())?;
        }
    }

    let stats = workbook.add_worksheet().set_name(STATS_SHEET)?;
    stats.set_column_width(0, 30.0)?;
    stats.write_string_with_format(0, 0, "Diretor", &header)?;
    stats.write_string_with_format(0, 1, "Plantões", &header)?;
    for (i, w) in roster.workload_by_load().into_iter().enumerate() {
        let r = i as u32 + 1;
        stats.write_string(r, 0, w.name.as_str())?;
        stats.write_number(r, 1, f64::from(w.shifts))?;
    }

    Ok(workbook)
}

/// Workbook serialized in memory, for downloads
pub fn workbook_bytes(roster: &Roster) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(roster)?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes the workbook into `dir`, creating it if needed. Returns the written path.
pub fn export_roster(roster: &Roster, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = dir.join(WORKBOOK_FILE);
    let mut workbook = build_workbook(roster)?;
    workbook.save(&path)?;

    info!(path = %path.display(), "exported roster workbook");
    Ok(path)
}
