use csv::{ReaderBuilder, Trim};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, RosterError};
use crate::schedule::{Day, HourBucket, Person, Slot};

/// Column holding the person's name (column 0 is the form timestamp)
const NAME_COLUMN: usize = 1;

/// Values the form uses to say "not available this day"
const UNAVAILABLE_MARKERS: [&str; 2] = ["não posso", "nan"];

/// One day's answer on the availability form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayAvailability {
    Available(Vec<HourBucket>),
    Unavailable,
}

/// Parses one day cell: a comma-separated list of hour tags, or a marker
/// meaning the person cannot work that day. Unknown hour tags are skipped.
pub fn parse_day_cell(cell: &str) -> DayAvailability {
    let value = cell.trim().to_lowercase();
    if value.is_empty() || UNAVAILABLE_MARKERS.contains(&value.as_str()) {
        return DayAvailability::Unavailable;
    }

    let mut hours = Vec::new();
    for part in value.split(',') {
        let tag = part.trim().replace('"', "");
        if tag.is_empty() {
            continue;
        }
        match HourBucket::from_tag(&tag) {
            Some(hour) if !hours.contains(&hour) => hours.push(hour),
            Some(_) => {}
            None => warn!(tag = %tag, "unknown hour tag, skipping"),
        }
    }

    if hours.is_empty() {
        DayAvailability::Unavailable
    } else {
        DayAvailability::Available(hours)
    }
}

/// Loads the availability form export from a CSV file
pub fn load_availability<P: AsRef<Path>>(csv_path: P) -> Result<Vec<Person>> {
    let file = File::open(csv_path)?;
    read_availability(file)
}

/// Reads availability form responses, one person per row.
///
/// Header names are trimmed and each weekday column is found by keyword.
/// A name that appears twice keeps its position but takes the later row's
/// answers, like a re-submission.
pub fn read_availability<R: Read>(source: R) -> Result<Vec<Person>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    if headers.len() <= NAME_COLUMN {
        return Err(RosterError::MissingNameColumn);
    }

    let day_columns: Vec<(Day, usize)> = Day::ALL
        .iter()
        .map(|&day| {
            headers
                .iter()
                .position(|h| h.to_lowercase().contains(day.form_keyword()))
                .map(|col| (day, col))
                .ok_or(RosterError::MissingColumn(day.tag()))
        })
        .collect::<Result<_>>()?;

    let mut people: Vec<Person> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;

        let name = record.get(NAME_COLUMN).unwrap_or("").trim().to_string();
        if name.is_empty() {
            // +2: header line and 1-based numbering
            warn!(line = row + 2, "skipping response without a name");
            continue;
        }

        let mut available = BTreeSet::new();
        for &(day, col) in &day_columns {
            if let DayAvailability::Available(hours) = parse_day_cell(record.get(col).unwrap_or("")) {
                available.extend(hours.into_iter().map(|hour| Slot::new(day, hour)));
            }
        }

        let person = Person { name: name.clone(), available };
        match positions.get(&name) {
            Some(&existing) => {
                warn!(name = %name, "duplicate response, keeping the latest one");
                people[existing] = person;
            }
            None => {
                positions.insert(name, people.len());
                people.push(person);
            }
        }
    }

    info!(people = people.len(), "loaded availability responses");
    Ok(people)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = "\
Carimbo de data/hora , Nome ,Segunda feira:,Terça feira:,Quarta feira:,Quinta feira:,Sexta feira:
2024/03/01,Ana,\"12h-13h, 13h-14h\",não posso,Não posso,,20h-21
2024/03/01,Bruno,não posso,não posso,não posso,não posso,não posso
2024/03/02,Carla,nan,14h-15h,,,
";

    fn slot(s: &str) -> Slot {
        s.parse().unwrap()
    }

    #[test]
    fn day_cell_markers_mean_unavailable() {
        assert_eq!(parse_day_cell("não posso"), DayAvailability::Unavailable);
        assert_eq!(parse_day_cell(" Não Posso "), DayAvailability::Unavailable);
        assert_eq!(parse_day_cell("nan"), DayAvailability::Unavailable);
        assert_eq!(parse_day_cell(""), DayAvailability::Unavailable);
    }

    #[test]
    fn day_cell_lists_hours() {
        assert_eq!(
            parse_day_cell("12h-13h, \"13h-14h\",12h-13h"),
            DayAvailability::Available(vec![HourBucket::H12, HourBucket::H13])
        );
        assert_eq!(
            parse_day_cell("20h-21, 09h-10h"),
            DayAvailability::Available(vec![HourBucket::H20])
        );
        assert_eq!(parse_day_cell("09h-10h"), DayAvailability::Unavailable);
    }

    #[test]
    fn reads_form_rows_in_order() {
        let people = read_availability(FORM.as_bytes()).unwrap();
        let names: Vec<&str> = people.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Bruno", "Carla"]);

        let ana: Vec<Slot> = people[0].available.iter().copied().collect();
        assert_eq!(
            ana,
            [
                slot("segunda-feira_12h-13h"),
                slot("segunda-feira_13h-14h"),
                slot("sexta-feira_20h-21h"),
            ]
        );
        assert!(people[1].available.is_empty());
        assert_eq!(people[2].available, BTreeSet::from([slot("terça-feira_14h-15h")]));
    }

    #[test]
    fn later_duplicate_replaces_earlier_in_place() {
        let form = "\
ts,Nome,Segunda feira:,Terça feira:,Quarta feira:,Quinta feira:,Sexta feira:
1,Ana,12h-13h,,,,
2,Bruno,,13h-14h,,,
3,Ana,,,15h-16h,,
";
        let people = read_availability(form.as_bytes()).unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].name, "Ana");
        assert_eq!(people[0].available, BTreeSet::from([slot("quarta-feira_15h-16h")]));
    }

    #[test]
    fn rows_without_name_are_skipped() {
        let form = "\
ts,Nome,Segunda feira:,Terça feira:,Quarta feira:,Quinta feira:,Sexta feira:
1,  ,12h-13h,,,,
2,Bruno,,13h-14h,,,
";
        let people = read_availability(form.as_bytes()).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Bruno");
    }

    #[test]
    fn missing_day_column_is_an_error() {
        let form = "ts,Nome,Segunda feira:,Terça feira:,Quarta feira:,Quinta feira:\n1,Ana,,,,\n";
        let err = read_availability(form.as_bytes()).unwrap_err();
        assert!(matches!(err, RosterError::MissingColumn("sexta-feira")));
    }

    #[test]
    fn single_column_form_has_no_names() {
        let err = read_availability("only\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RosterError::MissingNameColumn));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("respostas.csv");
        std::fs::write(&path, FORM).unwrap();
        assert_eq!(load_availability(&path).unwrap().len(), 3);
        assert!(matches!(load_availability(dir.path().join("missing.csv")), Err(RosterError::Io(_))));
    }
}
