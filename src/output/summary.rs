use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::dashboard::{deploy_count, health_check_percentage, Dashboard, SummaryJobs};
use crate::model::{Build, BuildStatus, Job, Pipeline, Timestamp};
use crate::notify::Notifier;

use super::styling::{bright, dim, health_figure, pipeline_name, status_styled};
use super::tables::{color_coded_status_cell, create_table};

/// Prints the dashboard to stdout.
///
/// Pipelines are shown in three bands, each keeping the ranked order:
/// - Failing: pipelines with a failed or errored job
/// - Running: pipelines with a job in progress
/// - Succeeding: everything else
///
/// Each pipeline gets a table of its jobs in dependency order with the
/// status and how long ago it happened. Pipelines whose jobs have not run for
/// weeks are marked stale.
pub fn print_summary(dashboard: &Dashboard, summary_jobs: &SummaryJobs, now: Timestamp) {
    println!("{}", render_summary(dashboard, summary_jobs, now));
}

/// Passes every failing job to the notifier.
pub fn announce_failures(dashboard: &Dashboard, notifier: &mut Notifier, now: Timestamp) {
    for (pipeline, job, build) in dashboard.failures() {
        let words = format!("{} {} {}", pipeline.name, job.name, build_text(build, now));
        notifier.announce(&pipeline.name, &job.name, &words, now);
    }
}

/// Describes how long ago `then` was, e.g. `3 hours ago`.
///
/// Units are floored. Weeks are only used from two weeks on.
pub fn relative_time(then: Timestamp, now: Timestamp) -> String {
    let secs = (now - then).max(0);
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;
    let weeks = days / 7;

    if weeks > 1 {
        format!("{} ago", pluralize(weeks, "week", "a"))
    } else if days > 0 {
        format!("{} ago", pluralize(days, "day", "a"))
    } else if hours > 0 {
        format!("{} ago", pluralize(hours, "hour", "an"))
    } else if mins > 0 {
        format!("{} ago", pluralize(mins, "minute", "a"))
    } else {
        "less than a minute ago".to_string()
    }
}

fn pluralize(value: i64, unit: &str, article: &str) -> String {
    if value == 1 {
        format!("{article} {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

fn is_weeks_old(then: Timestamp, now: Timestamp) -> bool {
    (now - then) / (7 * 24 * 3600) > 1
}

// Helper functions

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

/// The build a job row describes: a running build wins over the finished one.
fn displayed_build(job: &Job) -> Option<&Build> {
    job.running_build.as_ref().or(job.finished_build.as_ref())
}

/// End time once the build finished, whatever its status; start time while it runs.
fn build_time(build: &Build) -> Option<Timestamp> {
    build.end_time.or(build.start_time)
}

fn build_text(build: &Build, now: Timestamp) -> String {
    match build_time(build) {
        Some(then) => format!("{} {}", build.status, relative_time(then, now)),
        None => build.status.to_string(),
    }
}

fn job_text(job: &Job, now: Timestamp) -> String {
    displayed_build(job).map_or_else(|| "Never Ran".to_string(), |b| build_text(b, now))
}

fn is_stale(pipeline: &Pipeline, now: Timestamp) -> bool {
    pipeline
        .jobs
        .iter()
        .filter_map(displayed_build)
        .filter_map(build_time)
        .any(|then| is_weeks_old(then, now))
}

fn pipeline_heading(
    dashboard: &Dashboard,
    pipeline: &Pipeline,
    summary_jobs: &SummaryJobs,
    now: Timestamp,
) -> String {
    let mut heading = pipeline_name(&pipeline.name).to_string();

    if pipeline.job(&summary_jobs.health_check_job).is_some() {
        let rate = dashboard
            .history_for(&pipeline.name, &summary_jobs.health_check_job)
            .and_then(health_check_percentage);
        let _ = write!(heading, "  {} {}", dim("health"), health_figure(rate));
    }

    if pipeline.job(&summary_jobs.deploy_job).is_some() {
        let figure = dashboard
            .history_for(&pipeline.name, &summary_jobs.deploy_job)
            .map_or_else(|| "?".to_string(), |record| deploy_count(record).to_string());
        let _ = write!(heading, "  {} {}", dim("deploys →"), bright(figure));
    }

    if is_stale(pipeline, now) {
        let _ = write!(heading, "  {}", dim("(stale)"));
    }

    heading
}

fn render_pipeline(
    output: &mut String,
    dashboard: &Dashboard,
    pipeline: &Pipeline,
    summary_jobs: &SummaryJobs,
    now: Timestamp,
) {
    let heading = pipeline_heading(dashboard, pipeline, summary_jobs, now);
    let _ = writeln!(output, "  {heading}");

    let mut table = create_table();
    table.set_header(create_cyan_header(&["Job", "Status"]));

    for job in &pipeline.jobs {
        let status = displayed_build(job).map(|b| b.status);
        table.add_row(vec![
            Cell::new(&job.name),
            color_coded_status_cell(status, &job_text(job, now)),
        ]);
    }

    let _ = writeln!(output, "{table}\n");
}

fn render_band(
    output: &mut String,
    dashboard: &Dashboard,
    band: &[Pipeline],
    (emoji, title): (&str, &str),
    summary_jobs: &SummaryJobs,
    now: Timestamp,
) {
    if band.is_empty() {
        return;
    }

    add_section_header(output, emoji, title);
    for pipeline in band {
        render_pipeline(output, dashboard, pipeline, summary_jobs, now);
    }
}

fn render_summary(dashboard: &Dashboard, summary_jobs: &SummaryJobs, now: Timestamp) -> String {
    let mut output = String::new();
    let bands = dashboard.bands();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Backend:"),
        bright(&dashboard.backend),
        dim("Failing pipelines:"),
        status_styled(Some(BuildStatus::Failed), bands.failing.len()),
        dim("Running pipelines:"),
        status_styled(Some(BuildStatus::Started), bands.running.len()),
        dim("Succeeding pipelines:"),
        status_styled(Some(BuildStatus::Succeeded), bands.succeeding.len()),
        dim("Refreshed:"),
        dim(dashboard.collected_at.format("%Y-%m-%d %H:%M UTC"))
    );

    if dashboard.pipelines.is_empty() {
        let _ = writeln!(output, "{}", dim("No active pipelines."));
        return output;
    }

    render_band(&mut output, dashboard, bands.failing, ("❌", "Failing"), summary_jobs, now);
    render_band(&mut output, dashboard, bands.running, ("⏳", "Running"), summary_jobs, now);
    render_band(&mut output, dashboard, bands.succeeding, ("✅", "Succeeding"), summary_jobs, now);

    output
}
