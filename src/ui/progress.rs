use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a blocking request is in flight
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        if !console::Term::stderr().is_term() {
            return Self { pb: ProgressBar::hidden() };
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

/// Run `f` behind a spinner and clear it afterwards
pub fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = Spinner::new(message);
    let out = f();
    spinner.finish();
    out
}
