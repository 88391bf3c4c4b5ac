//! Terminal sink for engine progress.

use colored::Colorize;

use tidemark_core::UpgradeLog;

/// Writes engine progress to the terminal with severity colors.
///
/// Normal progress goes to stdout; warnings and above go to stderr so piped
/// output stays clean. Per-step detail is gated behind `--verbose`.
pub struct ConsoleLog {
    verbose: bool,
}

impl ConsoleLog {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl UpgradeLog for ConsoleLog {
    fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{}", message.cyan());
        }
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warning(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message.red());
    }

    fn critical(&self, message: &str) {
        eprintln!("{}", message.red().bold());
    }
}
