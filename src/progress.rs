//! Progress reporting hooks
//!
//! The diff engine reports progress through a caller-supplied sink: a
//! textual label when scanning starts, fractional progress while it
//! runs, and free-form debug notes when measurement options are turned
//! on. All notifications are advisory; a sink that drops them does not
//! affect the emitted stream.

/// Receiver for advisory progress notifications
///
/// All methods default to no-ops so implementations can pick what they
/// care about.
pub trait ProgressSink {
    /// A human-readable label for the phase that is starting
    fn label(&mut self, _text: &str) {}

    /// Fractional progress in `[0.0, 1.0]`
    fn progress(&mut self, _fraction: f64) {}

    /// A diagnostic note (memory checkpoints, parallel overhead)
    fn debug(&mut self, _text: &str) {}
}

/// Sink that discards every notification
pub struct NoopSink;

impl ProgressSink for NoopSink {}

/// Terminal progress bar backed by `indicatif`
#[cfg(feature = "progress")]
pub mod bar {
    use super::ProgressSink;
    use indicatif::{ProgressBar, ProgressStyle};

    const TICKS: u64 = 1000;

    pub struct BarSink {
        bar: ProgressBar,
    }

    impl BarSink {
        pub fn new() -> Self {
            let bar = ProgressBar::new(TICKS);
            let style = ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            bar.set_style(style);
            Self { bar }
        }

        pub fn finish(&self) {
            self.bar.finish_and_clear();
        }
    }

    impl Default for BarSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProgressSink for BarSink {
        fn label(&mut self, text: &str) {
            self.bar.set_message(text.to_string());
        }

        fn progress(&mut self, fraction: f64) {
            self.bar
                .set_position((fraction.clamp(0.0, 1.0) * TICKS as f64) as u64);
        }

        fn debug(&mut self, text: &str) {
            self.bar.println(text.to_string());
        }
    }
}
