use std::{sync::Arc, time::Duration};

use colored::Colorize as _;
use cph_core::report::Notifier;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

/// Prints notifications to stderr in red.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn show_error(&self, message: &str) {
        eprintln!("{}", message.red().bold());
    }
}

pub fn spinner(msg: impl Into<String>) -> Arc<Mutex<ProgressBar>> {
    let bar = ProgressBar::new_spinner().with_message(msg.into());
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        bar.set_style(style);
    }
    let bar = Arc::new(Mutex::new(bar));

    let ticking = bar.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let bar = ticking.lock().await;
            if bar.is_finished() {
                break;
            }
            bar.tick();
        }
    });
    bar
}
