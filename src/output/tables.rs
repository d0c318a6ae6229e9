use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::BuildStatus;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn status_color(status: Option<BuildStatus>) -> TableColor {
    match status {
        Some(BuildStatus::Succeeded) => TableColor::Green,
        Some(BuildStatus::Failed) => TableColor::Red,
        Some(BuildStatus::Errored) => TableColor::Magenta,
        Some(BuildStatus::Started) => TableColor::Yellow,
        Some(BuildStatus::Unknown) | None => TableColor::DarkGrey,
    }
}

pub fn color_coded_status_cell(status: Option<BuildStatus>, text: &str) -> Cell {
    Cell::new(text).fg(status_color(status))
}
