use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, phase_done, phase_pending};

/// Spinners for the three phases of a refresh cycle, drawn on stderr.
pub struct PhaseProgress {
    pb: ProgressBar,
    visible: bool,
}

impl PhaseProgress {
    pub fn start_phase_1(backend: &str, visible: bool) -> Self {
        if visible {
            eprintln!("{}  {}", bright("⚙️"), bright("Refresh").underlined());
        }
        let pb = create_spinner(
            phase_pending(format!("Phase 1/3: Fetching {backend} pipelines")).to_string(),
            visible,
        );
        Self { pb, visible }
    }

    pub fn finish_phase_1_start_phase_2(self, pipeline_count: usize) -> Self {
        self.pb.finish_with_message(
            phase_done(format!("Phase 1/3: Fetched {pipeline_count} pipelines ✓")).to_string(),
        );
        let pb = create_spinner(
            phase_pending("Phase 2/3: Ordering jobs and ranking pipelines").to_string(),
            self.visible,
        );
        Self { pb, ..self }
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb
            .finish_with_message(phase_done("Phase 2/3: Pipelines ranked ✓").to_string());
        let pb = create_spinner(
            phase_pending("Phase 3/3: Collecting build history").to_string(),
            self.visible,
        );
        Self { pb, ..self }
    }

    pub fn finish_phase_3(self, record_count: usize) {
        self.pb.finish_with_message(
            phase_done(format!("Phase 3/3: {record_count} history records ready ✓")).to_string(),
        );
        if self.visible {
            eprintln!();
        }
    }
}

fn create_spinner(message: String, visible: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if visible {
        pb.set_draw_target(ProgressDrawTarget::stderr());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    if visible {
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
    }
    pb
}
