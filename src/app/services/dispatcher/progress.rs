//! Progress indication for batch checks

use crate::constants::PROGRESS_TEMPLATE;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar shared by the dispatcher and its caller
///
/// Cloning yields a handle on the same bar. A cancelled reporter ignores
/// further updates and leaves the bar abandoned on screen.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Reporter that never draws, for quiet runs and tests
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn add_total(&self, count: u64) {
        self.bar.inc_length(count);
    }

    pub fn tick(&self, label: &str) {
        if self.bar.is_finished() {
            return;
        }
        self.bar.set_message(label.to_string());
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, message: &str) {
        if !self.bar.is_finished() {
            self.bar.finish_with_message(message.to_string());
        }
    }

    /// Hide the bar while `print` writes to the terminal
    pub fn suspend<F: FnOnce() -> R, R>(&self, print: F) -> R {
        self.bar.suspend(print)
    }

    /// Stop drawing; jobs already running still complete
    pub fn cancel(&self) {
        self.bar.abandon_with_message("cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.bar.is_finished()
    }
}
