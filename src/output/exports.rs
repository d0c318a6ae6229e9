use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::dashboard::Dashboard;

/// Serializes the dashboard as JSON into `output`.
pub fn export_json(dashboard: &Dashboard, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(dashboard)?
    } else {
        serde_json::to_string(dashboard)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

/// Writes the JSON dashboard to `path`, or to stdout when no path is given.
pub fn write_json(dashboard: &Dashboard, pretty: bool, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            export_json(dashboard, pretty, &mut writer)?;
            writer.flush()?;
            info!("Dashboard written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            export_json(dashboard, pretty, &mut stdout.lock())?;
        }
    }
    Ok(())
}
