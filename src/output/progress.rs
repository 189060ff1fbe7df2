//! Periodic progress lines for the worker pools

use std::time::{Duration, Instant};

/// Counts completions and logs a progress line every `interval` of them
///
/// Owned by a pool's dispatcher; the total may grow while the run is in
/// flight (fetch follow-ups extend the queue).
#[derive(Debug)]
pub struct ProgressReporter {
    label: &'static str,
    interval: u64,
    total: u64,
    done: u64,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(label: &'static str, total: u64, interval: u64) -> Self {
        Self {
            label,
            interval: interval.max(1),
            total,
            done: 0,
            started: Instant::now(),
        }
    }

    /// Adds newly discovered work to the total
    pub fn grow(&mut self, additional: u64) {
        self.total += additional;
    }

    /// Counts one finished page, logging on every interval boundary
    pub fn tick(&mut self) {
        self.done += 1;
        if self.done % self.interval == 0 {
            tracing::info!("{}", self.line());
        }
    }

    /// Logs the final line unless the last tick already did
    pub fn finish(&self) {
        if self.done % self.interval != 0 || self.done == 0 {
            tracing::info!("{}", self.line());
        }
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Pages per second since the reporter was created
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.done as f64 / secs
        } else {
            0.0
        }
    }

    /// Formats the current progress line
    pub fn line(&self) -> String {
        let pct = if self.total > 0 {
            self.done as f64 / self.total as f64 * 100.0
        } else {
            100.0
        };
        let rate = self.rate();
        let remaining = self.total.saturating_sub(self.done);
        let eta = if rate > 0.0 {
            format_eta(Duration::from_secs_f64(remaining as f64 / rate))
        } else {
            "unknown".to_string()
        };

        format!(
            "{}: {}/{} ({:.2}%), {:.1} pages/sec, ETA {}",
            self.label, self.done, self.total, pct, rate, eta
        )
    }
}

/// Formats a duration as `1h02m03s`, `2m05s` or `7s`
pub fn format_eta(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
