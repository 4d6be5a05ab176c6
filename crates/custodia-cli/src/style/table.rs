//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use custodia::Incident;

use super::colors;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(label: &str) -> Cell {
    if super::no_color() {
        Cell::new(label)
    } else {
        Cell::new(label)
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan)
    }
}

/// Creates a table with one row per incident.
pub fn incident_table(incidents: &[Incident]) -> Table {
    let mut table = base_table();
    table.set_header(
        ["ID", "Source IP", "Attempts", "Severity", "Risk", "Status"]
            .into_iter()
            .map(header_cell)
            .collect::<Vec<_>>(),
    );

    for incident in incidents {
        table.add_row(vec![
            Cell::new(incident.id()),
            Cell::new(incident.source_ip()),
            Cell::new(incident.failed_attempts()).set_alignment(CellAlignment::Right),
            Cell::new(colors::severity(incident.severity())),
            Cell::new(incident.risk_score()).set_alignment(CellAlignment::Right),
            Cell::new(colors::status(incident.status())),
        ]);
    }

    table
}

/// Prints incidents as a formatted table.
pub fn print_incident_table(incidents: &[Incident]) {
    println!("{}", incident_table(incidents));
}

/// Creates a key-value info table (two columns: key and value).
pub fn info_table(entries: &[(&str, &str)]) -> Table {
    let mut table = base_table();

    for (key, value) in entries {
        let key_cell = if super::no_color() {
            Cell::new(key)
        } else {
            Cell::new(key).fg(Color::DarkGrey)
        };
        table.add_row(vec![key_cell, Cell::new(value)]);
    }

    table
}

/// Prints a key-value info table.
pub fn print_info_table(entries: &[(&str, &str)]) {
    println!("{}", info_table(entries));
}
