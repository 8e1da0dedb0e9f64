use std::io::{self, BufRead, IsTerminal, Write};

use chrono::Local;
use threadgrab_engine::RunSummary;

pub const TITLE: &str = "### 2CH THREAD PARSER ###";

pub fn print_banner() {
    println!("{TITLE}");
    println!("Started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
}

pub fn print_summary(summary: &RunSummary) {
    println!("{} workers: {:?}", summary.pool.workers, summary.elapsed);
    println!(
        "{} links from {} threads: {} saved, {} already present, {} failed",
        summary.dispatch.enqueued,
        summary.dispatch.seeds,
        summary.pool.saved,
        summary.pool.already_present,
        summary.pool.failed
    );
}

/// Waits for Enter so a double-clicked console window stays open.
/// Skipped when asked to, or when stdin is not a terminal.
pub fn pause_before_exit(skip: bool) {
    let stdin = io::stdin();
    if skip || !stdin.is_terminal() {
        return;
    }
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = stdin.lock().read_line(&mut line);
}
