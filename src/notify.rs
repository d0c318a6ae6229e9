use std::collections::HashMap;
use std::io::Write;

use log::{debug, warn};

use crate::model::Timestamp;

/// Announces failing jobs, at most once per interval for each (pipeline, job).
///
/// The last-announced times start empty with the process and are never written to disk.
pub struct Notifier {
    min_interval_secs: i64,
    last_notified: HashMap<(String, String), Timestamp>,
    bell: bool,
}

impl Notifier {
    pub fn new(min_interval_secs: i64) -> Self {
        Self {
            min_interval_secs,
            last_notified: HashMap::new(),
            bell: true,
        }
    }

    /// Notifier that only logs, used when output is not a terminal.
    pub fn silent(min_interval_secs: i64) -> Self {
        Self {
            bell: false,
            ..Self::new(min_interval_secs)
        }
    }

    /// Records and emits an announcement unless one went out for the same key within the interval.
    ///
    /// Returns whether the announcement was emitted.
    pub fn announce(&mut self, pipeline: &str, job: &str, words: &str, now: Timestamp) -> bool {
        let key = (pipeline.to_owned(), job.to_owned());

        if let Some(&last) = self.last_notified.get(&key) {
            if now - last <= self.min_interval_secs {
                debug!("Skipping announcement for {pipeline}:{job}, last sent at {last}");
                return false;
            }
        }

        warn!("{words}");
        if self.bell {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }

        self.last_notified.insert(key, now);
        true
    }
}
