use console::{style, Color, StyledObject};

use crate::model::BuildStatus;

/// Terminal colour for a build status; grey when nothing ran or the status is unknown.
pub fn status_color(status: Option<BuildStatus>) -> Color {
    match status {
        Some(BuildStatus::Succeeded) => Color::Green,
        Some(BuildStatus::Failed) => Color::Red,
        Some(BuildStatus::Errored) => Color::Magenta,
        Some(BuildStatus::Started) => Color::Yellow,
        Some(BuildStatus::Unknown) | None => Color::Black,
    }
}

pub fn status_styled(
    status: Option<BuildStatus>,
    text: impl std::fmt::Display,
) -> StyledObject<String> {
    style(text.to_string()).fg(status_color(status)).bright()
}

/// Green above 80%, yellow from 50%, red below. No figure stays dim.
fn health_color(rate: Option<u32>) -> Option<Color> {
    match rate {
        Some(rate) if rate > 80 => Some(Color::Green),
        Some(rate) if rate >= 50 => Some(Color::Yellow),
        Some(_) => Some(Color::Red),
        None => None,
    }
}

/// Weekly health-check percentage, `?` when nothing finished this week.
pub fn health_figure(rate: Option<u32>) -> StyledObject<String> {
    match (rate, health_color(rate)) {
        (Some(rate), Some(color)) => style(format!("{rate}%")).fg(color).bright(),
        _ => style("?".to_string()).dim(),
    }
}

pub fn pipeline_name(name: &str) -> StyledObject<String> {
    style(name.to_string()).cyan().bold()
}

/// Spinner message of a phase still in progress.
pub fn phase_pending(text: impl std::fmt::Display) -> StyledObject<String> {
    status_styled(Some(BuildStatus::Started), text)
}

/// Spinner message of a finished phase.
pub fn phase_done(text: impl std::fmt::Display) -> StyledObject<String> {
    status_styled(Some(BuildStatus::Succeeded), text)
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_and_running_builds_stand_out() {
        assert_eq!(status_color(Some(BuildStatus::Failed)), Color::Red);
        assert_eq!(status_color(Some(BuildStatus::Errored)), Color::Magenta);
        assert_eq!(status_color(Some(BuildStatus::Started)), Color::Yellow);
        assert_eq!(status_color(None), Color::Black);
    }

    #[test]
    fn health_thresholds() {
        assert_eq!(health_color(Some(100)), Some(Color::Green));
        assert_eq!(health_color(Some(80)), Some(Color::Yellow));
        assert_eq!(health_color(Some(50)), Some(Color::Yellow));
        assert_eq!(health_color(Some(49)), Some(Color::Red));
        assert_eq!(health_color(None), None);
    }

    #[test]
    fn health_figure_text() {
        assert!(health_figure(Some(75)).to_string().contains("75%"));
        assert!(health_figure(None).to_string().contains('?'));
    }
}
