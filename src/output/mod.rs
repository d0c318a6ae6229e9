mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::write_json;
pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{announce_failures, print_summary};

/// Prints the `ciradiator` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📡 ciradiator"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI pipeline radiator")
    );
}
