//! Console presentation for a batch run: per-account progress lines, the
//! countdown between sequential accounts, and the closing summary block.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use roster_engine::{BatchObserver, Outcome, Summary};
use std::time::Duration;

pub struct ConsoleObserver {
    bar: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                .expect("static progress template"),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchObserver for ConsoleObserver {
    fn on_account_started(&self, index: usize, total: usize, identifier: &str) {
        self.bar
            .set_message(format!("[{}/{}] {}", index + 1, total, identifier));
    }

    fn on_account_finished(&self, _index: usize, _total: usize, outcome: &Outcome) {
        let line = if outcome.succeeded() {
            format!(
                "{} {}: {}",
                "✓".green(),
                outcome.identifier().bold(),
                outcome.describe()
            )
        } else if outcome.is_unconfirmed() {
            format!(
                "{} {}: {}",
                "?".yellow(),
                outcome.identifier().bold(),
                outcome.describe()
            )
        } else {
            format!(
                "{} {}: {}",
                "✗".red(),
                outcome.identifier().bold(),
                outcome.describe()
            )
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_countdown_tick(&self, remaining: Duration) {
        self.bar
            .set_message(format!("next account in {}s", remaining.as_secs()));
    }

    fn on_cancelled(&self) {
        self.bar.println(
            "Cancellation requested; finishing in-flight accounts..."
                .yellow()
                .to_string(),
        );
    }
}

/// The closing statistics block, always printed, partial runs included.
pub fn print_summary(summary: &Summary) {
    println!();
    println!("{}", "==============================".cyan());
    println!("{}", " Batch summary".cyan().bold());
    println!("  Accounts:     {}", summary.total);
    println!("  Succeeded:    {}", summary.succeeded.to_string().green());
    if summary.unconfirmed > 0 {
        println!(
            "  Unconfirmed:  {}",
            summary.unconfirmed.to_string().yellow()
        );
    }
    println!("  Failed:       {}", summary.failed.to_string().red());
    println!("  Success rate: {:.1}%", summary.success_rate);
    if summary.points_spent > 0 {
        println!("  Points spent: {}", summary.points_spent);
    }
    println!("{}", "==============================".cyan());
}
